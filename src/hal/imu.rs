use nalgebra::Vector3;

use crate::imu::SensorFault;

/// One accelerometer and gyroscope sample, already scaled
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Readout {
    /// in g
    pub acceleration: Vector3<f32>,
    /// in degrees per second, x for roll, y for pitch, z for yaw
    pub gyro: Vector3<f32>,
    /// any raw channel sat at the end of its range
    pub saturated: bool,
}

impl Readout {
    pub fn new(acceleration: Vector3<f32>, gyro: Vector3<f32>) -> Self {
        Self { acceleration, gyro, saturated: false }
    }

    pub fn is_finite(&self) -> bool {
        self.acceleration.iter().chain(self.gyro.iter()).all(|v| v.is_finite())
    }
}

pub trait AccelGyro {
    /// Blocking bus read, expected to return within a few milliseconds
    fn read(&mut self) -> Result<Readout, SensorFault>;
}

impl<T: AccelGyro + ?Sized> AccelGyro for Box<T> {
    fn read(&mut self) -> Result<Readout, SensorFault> {
        (**self).read()
    }
}
