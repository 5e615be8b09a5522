pub mod calibration;
pub mod out;

use std::fmt;
use std::time::{Duration, Instant};

use crate::{
    algorithm::ComplementaryFilter,
    config,
    hal::imu::AccelGyro,
    types::measurement::Tilt,
};

pub use calibration::CalibrationData;
pub use out::AttitudeEstimate;

#[derive(Debug, Clone, PartialEq)]
pub enum SensorFault {
    Bus(String),
    Timeout(Duration),
    NotFinite,
    /// Consecutive saturated readouts
    Saturated(usize),
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "IMU bus error: {}", e),
            Self::Timeout(elapsed) => write!(f, "IMU read took {:?}", elapsed),
            Self::NotFinite => write!(f, "IMU returned non-finite value"),
            Self::Saturated(n) => write!(f, "IMU saturated for {} consecutive samples", n),
        }
    }
}

impl std::error::Error for SensorFault {}

pub type Sensor = Box<dyn AccelGyro + Send>;

/// Sensor fusion unit, turns calibrated readouts into an attitude estimate.
pub struct IMU {
    sensor: Sensor,
    calibration: CalibrationData,
    filter: ComplementaryFilter,
    read_timeout: Duration,
    saturation_limit: usize,
    saturated: usize,
    epoch: Instant,
    last_sample: Option<Instant>,
    last_timestamp: Option<Duration>,
}

impl IMU {
    pub fn new(sensor: Sensor, calibration: CalibrationData, config: &config::IMU) -> Self {
        Self {
            sensor,
            calibration,
            filter: ComplementaryFilter::new(config.filter_alpha),
            read_timeout: config.read_timeout(),
            saturation_limit: config.saturation_limit,
            saturated: 0,
            epoch: Instant::now(),
            last_sample: None,
            last_timestamp: None,
        }
    }

    fn next_timestamp(&mut self, now: Instant) -> Duration {
        let mut timestamp = now.saturating_duration_since(self.epoch);
        if let Some(last) = self.last_timestamp {
            timestamp = timestamp.max(last + Duration::from_micros(1));
        }
        self.last_timestamp = Some(timestamp);
        timestamp
    }

    /// One bus read per call, never retried.
    pub fn sample(&mut self, now: Instant) -> Result<AttitudeEstimate, SensorFault> {
        let started = Instant::now();
        let readout = self.sensor.read()?;
        let elapsed = started.elapsed();
        if elapsed > self.read_timeout {
            return Err(SensorFault::Timeout(elapsed));
        }
        if !readout.is_finite() {
            return Err(SensorFault::NotFinite);
        }
        self.saturated = if readout.saturated { self.saturated + 1 } else { 0 };
        if self.saturated > self.saturation_limit {
            return Err(SensorFault::Saturated(self.saturated));
        }

        let readout = self.calibration.apply(readout);
        let dt = match self.last_sample {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_sample = Some(now);

        let rates = (readout.gyro.x, readout.gyro.y);
        let tilt = self.filter.filter(Tilt::from(readout.acceleration), rates, dt);
        let timestamp = self.next_timestamp(now);
        Ok(AttitudeEstimate { roll: tilt.roll, pitch: tilt.pitch, yaw_rate: readout.gyro.z, timestamp })
    }
}
