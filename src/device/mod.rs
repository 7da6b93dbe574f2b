//! Traffic light controller model, used as a hardware stand-in.

pub mod firmware;
pub mod runner;

pub use firmware::{Button, Step, TrafficLight};
pub use runner::{DeviceInput, DeviceRunner};
