// Cyclometer - Battery Monitor
//
// Samples the battery divider on demand for the service view. The ADC unit is
// acquired for a single read and released again when the unit handle drops,
// so every exit path (including a failed channel config) gives it back.

use crate::config::*;

/// Oneshot ADC peripheral that can hand out a unit for a single measurement.
pub trait AdcDriver {
    type Unit: AdcUnit;

    /// Acquire the ADC unit. Dropping the returned unit deletes it.
    fn new_unit(&mut self) -> anyhow::Result<Self::Unit>;
}

pub trait AdcUnit {
    fn configure_channel(&mut self, channel: u32, atten_db: u32, bitwidth: u32) -> anyhow::Result<()>;
    fn read(&mut self, channel: u32) -> anyhow::Result<i32>;
}

/// Straight line through two measured (raw, volts) points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub low: (i32, f32),
    pub high: (i32, f32),
}

impl Calibration {
    pub fn voltage(&self, raw: i32) -> f32 {
        let (raw_lo, v_lo) = self.low;
        let (raw_hi, v_hi) = self.high;
        if raw_hi == raw_lo {
            return v_lo;
        }
        v_lo + (raw - raw_lo) as f32 * (v_hi - v_lo) / (raw_hi - raw_lo) as f32
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            low: BATTERY_CAL_LOW,
            high: BATTERY_CAL_HIGH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    pub voltage: f32,
    /// LiPo state of charge estimate, 0.0–100.0 %.
    pub percent: f32,
}

impl BatteryReading {
    pub fn from_voltage(voltage: f32) -> Self {
        let percent = ((voltage - LIPO_EMPTY_V) / (LIPO_FULL_V - LIPO_EMPTY_V) * 100.0).clamp(0.0, 100.0);
        Self { voltage, percent }
    }
}

pub struct PowerMonitor<A: AdcDriver> {
    adc: A,
    calibration: Calibration,
}

impl<A: AdcDriver> PowerMonitor<A> {
    pub fn new(adc: A, calibration: Calibration) -> Self {
        Self { adc, calibration }
    }

    /// Take one battery sample. Failures are logged and yield `None`; the
    /// caller leaves whatever is on screen untouched.
    pub fn read_battery_voltage(&mut self) -> Option<BatteryReading> {
        match self.sample_raw() {
            Ok(raw) => {
                let voltage = self.calibration.voltage(raw);
                log::info!("Battery: raw {} -> {:.3} V", raw, voltage);
                Some(BatteryReading::from_voltage(voltage))
            }
            Err(e) => {
                log::warn!("Battery read skipped: {:#}", e);
                None
            }
        }
    }

    fn sample_raw(&mut self) -> anyhow::Result<i32> {
        let mut unit = self.adc.new_unit()?;
        unit.configure_channel(BATTERY_ADC_CHANNEL, BATTERY_ADC_ATTEN_DB, BATTERY_ADC_BITWIDTH)?;
        unit.read(BATTERY_ADC_CHANNEL)
        // `unit` dropped here -> ADC unit deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Counters {
        acquired: Rc<Cell<u32>>,
        released: Rc<Cell<u32>>,
    }

    struct FakeAdc {
        counters: Counters,
        fail_config: bool,
        raw: i32,
    }

    struct FakeUnit {
        counters: Counters,
        fail_config: bool,
        raw: i32,
    }

    impl AdcDriver for FakeAdc {
        type Unit = FakeUnit;

        fn new_unit(&mut self) -> anyhow::Result<FakeUnit> {
            self.counters.acquired.set(self.counters.acquired.get() + 1);
            Ok(FakeUnit {
                counters: self.counters.clone(),
                fail_config: self.fail_config,
                raw: self.raw,
            })
        }
    }

    impl AdcUnit for FakeUnit {
        fn configure_channel(&mut self, _channel: u32, _atten_db: u32, _bitwidth: u32) -> anyhow::Result<()> {
            if self.fail_config {
                anyhow::bail!("channel config rejected");
            }
            Ok(())
        }

        fn read(&mut self, _channel: u32) -> anyhow::Result<i32> {
            Ok(self.raw)
        }
    }

    impl Drop for FakeUnit {
        fn drop(&mut self) {
            self.counters.released.set(self.counters.released.get() + 1);
        }
    }

    #[test]
    fn interpolates_between_calibration_points() {
        let cal = Calibration {
            low: (1000, 3.0),
            high: (2000, 4.0),
        };
        assert!((cal.voltage(1000) - 3.0).abs() < 1e-6);
        assert!((cal.voltage(1500) - 3.5).abs() < 1e-6);
        assert!((cal.voltage(2200) - 4.2).abs() < 1e-5);
    }

    #[test]
    fn successful_read_releases_unit() {
        let counters = Counters::default();
        let adc = FakeAdc {
            counters: counters.clone(),
            fail_config: false,
            raw: BATTERY_CAL_HIGH.0,
        };
        let mut monitor = PowerMonitor::new(adc, Calibration::default());

        let reading = monitor.read_battery_voltage().unwrap();
        assert!((reading.voltage - BATTERY_CAL_HIGH.1).abs() < 1e-4);
        assert!(reading.percent > 99.9);
        assert_eq!(counters.acquired.get(), 1);
        assert_eq!(counters.released.get(), 1);
    }

    #[test]
    fn config_failure_still_releases_unit() {
        let counters = Counters::default();
        let adc = FakeAdc {
            counters: counters.clone(),
            fail_config: true,
            raw: 0,
        };
        let mut monitor = PowerMonitor::new(adc, Calibration::default());

        assert!(monitor.read_battery_voltage().is_none());
        assert_eq!(counters.acquired.get(), 1);
        assert_eq!(counters.released.get(), 1);
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(BatteryReading::from_voltage(2.9).percent, 0.0);
        assert_eq!(BatteryReading::from_voltage(4.4).percent, 100.0);
        let half = BatteryReading::from_voltage((LIPO_EMPTY_V + LIPO_FULL_V) / 2.0);
        assert!((half.percent - 50.0).abs() < 0.01);
    }
}
