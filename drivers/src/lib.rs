#[macro_use]
extern crate log;

pub mod mpu6050;
#[cfg(target_os = "linux")]
pub mod rpi;
