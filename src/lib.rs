#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

#[cfg(test)]
#[macro_use]
extern crate indoc;
#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod algorithm;
pub mod config;
pub mod esc;
pub mod fcs;
pub mod hal;
pub mod imu;
pub mod input;
pub mod sync;
pub mod telemetry;
pub mod types;
