pub mod adc;
pub mod oled;
