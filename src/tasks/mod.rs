pub mod buttons;
pub mod timers;
