// Cyclometer - Oneshot ADC
//
// Raw ESP-IDF oneshot calls. A unit exists only for the duration of one
// battery read; `Drop` deletes it on every path.

use esp_idf_sys::{self as sys, esp};

use cyclometer::{AdcDriver, AdcUnit};

pub struct EspAdc;

pub struct EspAdcUnit {
    handle: sys::adc_oneshot_unit_handle_t,
}

impl AdcDriver for EspAdc {
    type Unit = EspAdcUnit;

    fn new_unit(&mut self) -> anyhow::Result<EspAdcUnit> {
        let mut handle: sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: zeroed is a valid bit pattern for this plain C config struct.
        let unit_cfg = sys::adc_oneshot_unit_init_cfg_t {
            unit_id: sys::adc_unit_t_ADC_UNIT_1,
            ulp_mode: sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..unsafe { core::mem::zeroed() }
        };
        esp!(unsafe { sys::adc_oneshot_new_unit(&unit_cfg, &mut handle) })?;
        Ok(EspAdcUnit { handle })
    }
}

impl AdcUnit for EspAdcUnit {
    fn configure_channel(&mut self, channel: u32, atten_db: u32, bitwidth: u32) -> anyhow::Result<()> {
        let atten = match atten_db {
            0 => sys::adc_atten_t_ADC_ATTEN_DB_0,
            2 => sys::adc_atten_t_ADC_ATTEN_DB_2_5,
            6 => sys::adc_atten_t_ADC_ATTEN_DB_6,
            11 => sys::adc_atten_t_ADC_ATTEN_DB_11,
            other => anyhow::bail!("unsupported attenuation {} dB", other),
        };
        let bitwidth = match bitwidth {
            12 => sys::adc_bitwidth_t_ADC_BITWIDTH_12,
            _ => sys::adc_bitwidth_t_ADC_BITWIDTH_DEFAULT,
        };
        let chan_cfg = sys::adc_oneshot_chan_cfg_t { atten, bitwidth };
        esp!(unsafe { sys::adc_oneshot_config_channel(self.handle, channel as sys::adc_channel_t, &chan_cfg) })?;
        Ok(())
    }

    fn read(&mut self, channel: u32) -> anyhow::Result<i32> {
        let mut raw: i32 = 0;
        esp!(unsafe { sys::adc_oneshot_read(self.handle, channel as sys::adc_channel_t, &mut raw) })?;
        Ok(raw)
    }
}

impl Drop for EspAdcUnit {
    fn drop(&mut self) {
        if let Err(e) = esp!(unsafe { sys::adc_oneshot_del_unit(self.handle) }) {
            log::error!("ADC unit delete failed ({})", e);
        }
    }
}
