// Cyclometer - Activity History
//
// Fixed-length counter array, one bucket per `HISTORY_STEP`. Bucket 0 is the
// current interval, the last bucket the oldest. 128 buckets cover 24 hours.
//
// Bucket counters saturate at `u32::MAX` instead of wrapping; a clamped bar
// is less wrong than one that drops back to zero.

use crate::config::HISTORY_LEN;

/// Result of a full scan over the buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistorySummary {
    /// Largest single bucket, used to normalise the bar chart.
    pub max: u32,
    /// Sum of all buckets (saturating).
    pub total: u32,
}

pub struct HistoryBuffer<const N: usize = HISTORY_LEN> {
    buckets: [u32; N],
}

impl<const N: usize> HistoryBuffer<N> {
    pub fn new() -> Self {
        Self { buckets: [0; N] }
    }

    /// Count one step into the current bucket.
    pub fn record_current(&mut self) {
        if let Some(current) = self.buckets.first_mut() {
            *current = current.saturating_add(1);
        }
    }

    /// Age every bucket by one slot, dropping the oldest, and open a fresh
    /// current bucket.
    pub fn shift_tick(&mut self) {
        if N == 0 {
            return;
        }
        self.buckets.copy_within(0..N - 1, 1);
        self.buckets[0] = 0;
    }

    pub fn summary(&self) -> HistorySummary {
        self.buckets
            .iter()
            .fold(HistorySummary::default(), |acc, &value| HistorySummary {
                max: acc.max.max(value),
                total: acc.total.saturating_add(value),
            })
    }

    pub fn buckets(&self) -> &[u32; N] {
        &self.buckets
    }

    /// Draw the buckets as a bar chart, newest bucket in the right-most
    /// column. Buckets that do not fit into `width` columns are left out.
    ///
    /// Returns `None` when every bucket is empty (nothing to normalise by).
    pub fn render_bars(&self, width: u32, height: u32) -> Option<Bitmap> {
        let HistorySummary { max, .. } = self.summary();
        if max == 0 || width == 0 || height == 0 {
            return None;
        }

        let mut bitmap = Bitmap::new(width, height);
        for (index, &value) in self.buckets.iter().enumerate().take(width as usize) {
            if value == 0 {
                continue;
            }
            let x = width - 1 - index as u32;
            for y in bar_top(value, max, height)..height {
                bitmap.set(x, y);
            }
        }
        Some(bitmap)
    }
}

impl<const N: usize> Default for HistoryBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// First lit row of a bar: `height - value * (height - 1) / max`.
/// `value == max` lights `height - 1` rows. A zero-height chart or an empty
/// history lights nothing.
pub fn bar_top(value: u32, max: u32, height: u32) -> u32 {
    if height == 0 || max == 0 {
        return height;
    }
    let scaled = (value as u64 * (height as u64 - 1) / max as u64) as u32;
    height - scaled.min(height - 1)
}

// ---------------------------------------------------------------------------
// Monochrome bitmap
// ---------------------------------------------------------------------------

/// `width × height` monochrome image. Rows are stored top to bottom, each
/// row padded to whole bytes, and within a byte the most significant bit is
/// the left-most pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32) -> Self {
        let stride = Self::stride_for(width);
        Self {
            width,
            height,
            data: vec![0; stride * height as usize],
        }
    }

    fn stride_for(width: u32) -> usize {
        (width as usize).div_ceil(8)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        Self::stride_for(self.width)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn set(&mut self, x: u32, y: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.stride() + x as usize / 8;
        self.data[index] |= 0x80 >> (x % 8);
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y as usize * self.stride() + x as usize / 8;
        self.data[index] & (0x80 >> (x % 8)) != 0
    }

    pub fn column_count(&self, x: u32) -> u32 {
        (0..self.height).filter(|&y| self.is_set(x, y)).count() as u32
    }
}
