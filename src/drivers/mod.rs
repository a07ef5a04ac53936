//! Board-level drivers: flow-sensor GPIO/ISR setup and the task watchdog.

pub mod hw_init;
pub mod watchdog;
