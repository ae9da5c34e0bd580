// Cyclometer - SSD1306 OLED Driver
//
// Register-level driver over I2C with a local page framebuffer. Text is laid
// out with embedded-graphics mono fonts; every write flushes only the pages
// it touched.

use std::convert::Infallible;
use std::thread;
use std::time::Duration;

use embedded_graphics::mono_font::{ascii::FONT_5X8, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use esp_idf_hal::i2c::I2cDriver;

use cyclometer::config::*;
use cyclometer::{Bitmap, Display};

// SSD1306 commands
const CMD_DISPLAY_OFF: u8 = 0xAE;
const CMD_DISPLAY_ON: u8 = 0xAF;
const CMD_SET_CONTRAST: u8 = 0x81;
const CMD_COLUMN_ADDR: u8 = 0x21;
const CMD_PAGE_ADDR: u8 = 0x22;

const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;
const DATA_CHUNK: usize = 16;

const PAGES: u32 = SCREEN_HEIGHT / 8;

const INIT_SEQUENCE: &[u8] = &[
    CMD_DISPLAY_OFF,
    0xD5, 0x80, // clock divide
    0xA8, 0x3F, // multiplex 64
    0xD3, 0x00, // display offset
    0x40,       // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1,       // segment remap
    0xC8,       // COM scan descending
    0xDA, 0x12, // COM pins
    CMD_SET_CONTRAST, ACTIVE_CONTRAST,
    0xD9, 0xF1, // pre-charge
    0xDB, 0x40, // VCOMH deselect
    0xA4,       // resume from RAM
    0xA6,       // normal (not inverted)
];

/// Page-organised 1 bpp framebuffer: byte `x + page * width`, bit `y % 8`.
pub struct Framebuffer {
    buf: [u8; DISPLAY_BUFFER_SIZE],
}

impl Framebuffer {
    fn new() -> Self {
        Self {
            buf: [0; DISPLAY_BUFFER_SIZE],
        }
    }

    fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return;
        }
        let index = (x + (y / 8) * SCREEN_WIDTH) as usize;
        let mask = 1u8 << (y % 8);
        if on {
            self.buf[index] |= mask;
        } else {
            self.buf[index] &= !mask;
        }
    }

    fn fill_rows(&mut self, top: u32, height: u32, on: bool) {
        for y in top..(top + height).min(SCREEN_HEIGHT) {
            for x in 0..SCREEN_WIDTH {
                self.set_pixel(x, y, on);
            }
        }
    }

    fn page(&self, page: u32) -> &[u8] {
        let start = (page * SCREEN_WIDTH) as usize;
        &self.buf[start..start + SCREEN_WIDTH as usize]
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

pub struct Ssd1306 {
    i2c: I2cDriver<'static>,
    fb: Framebuffer,
}

impl Ssd1306 {
    pub fn new(i2c: I2cDriver<'static>) -> Self {
        Self {
            i2c,
            fb: Framebuffer::new(),
        }
    }

    pub fn init(&mut self) -> anyhow::Result<()> {
        self.command(INIT_SEQUENCE)?;
        self.flush_pages(0, PAGES - 1)?;
        self.command(&[CMD_DISPLAY_ON])?;
        log::info!("SSD1306 initialised ({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(())
    }

    fn command(&mut self, cmds: &[u8]) -> anyhow::Result<()> {
        let mut frame = Vec::with_capacity(cmds.len() + 1);
        frame.push(CONTROL_COMMAND);
        frame.extend_from_slice(cmds);
        self.i2c.write(I2C_ADDR_OLED, &frame, I2C_TIMEOUT_TICKS)?;
        Ok(())
    }

    fn flush_pages(&mut self, first: u32, last: u32) -> anyhow::Result<()> {
        let last = last.min(PAGES - 1);
        self.command(&[CMD_COLUMN_ADDR, 0, (SCREEN_WIDTH - 1) as u8])?;
        self.command(&[CMD_PAGE_ADDR, first as u8, last as u8])?;

        let mut frame = [0u8; DATA_CHUNK + 1];
        frame[0] = CONTROL_DATA;
        for page in first..=last {
            for chunk in self.fb.page(page).chunks(DATA_CHUNK) {
                frame[1..=chunk.len()].copy_from_slice(chunk);
                self.i2c
                    .write(I2C_ADDR_OLED, &frame[..=chunk.len()], I2C_TIMEOUT_TICKS)?;
            }
        }
        Ok(())
    }
}

impl Display for Ssd1306 {
    fn display_text(&mut self, line: u32, text: &str, invert: bool) -> anyhow::Result<()> {
        let top = line * LINE_HEIGHT;
        self.fb.fill_rows(top, LINE_HEIGHT, invert);

        let color = if invert { BinaryColor::Off } else { BinaryColor::On };
        let style = MonoTextStyle::new(&FONT_5X8, color);
        let _ = Text::with_baseline(text, Point::new(0, top as i32), style, Baseline::Top).draw(&mut self.fb);

        self.flush_pages(top / 8, (top + LINE_HEIGHT - 1) / 8)
    }

    fn display_bitmap(&mut self, x: u32, y: u32, bitmap: &Bitmap, invert: bool) -> anyhow::Result<()> {
        if bitmap.height() == 0 {
            return Ok(());
        }
        for row in 0..bitmap.height() {
            for col in 0..bitmap.width() {
                self.fb.set_pixel(x + col, y + row, bitmap.is_set(col, row) != invert);
            }
        }
        self.flush_pages(y / 8, (y + bitmap.height() - 1) / 8)
    }

    fn clear_screen(&mut self, invert: bool) -> anyhow::Result<()> {
        self.fb.buf.fill(if invert { 0xFF } else { 0x00 });
        self.flush_pages(0, PAGES - 1)?;
        self.command(&[CMD_DISPLAY_ON])
    }

    fn set_contrast(&mut self, value: u8) -> anyhow::Result<()> {
        self.command(&[CMD_SET_CONTRAST, value])
    }

    /// Ramp the contrast down, then switch the panel off.
    fn fade_out(&mut self) -> anyhow::Result<()> {
        for step in (0..FADE_STEPS).rev() {
            let level = (ACTIVE_CONTRAST as u32 * step as u32 / FADE_STEPS as u32) as u8;
            self.command(&[CMD_SET_CONTRAST, level])?;
            thread::sleep(Duration::from_millis(FADE_STEP_MS));
        }
        self.command(&[CMD_DISPLAY_OFF])
    }
}
