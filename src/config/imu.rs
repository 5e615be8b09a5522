use std::path::PathBuf;
use std::time::Duration;

use super::{ensure, Error};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    /// ±2g, ±250°/s
    Mpu6050,
    /// ±16g, ±2000°/s
    Mpu6500,
}

fn default_i2c_bus() -> u8 {
    1
}

fn default_address() -> u8 {
    0x68
}

fn default_filter_alpha() -> f32 {
    0.98
}

fn default_saturation_limit() -> usize {
    10
}

fn default_read_timeout_ms() -> u64 {
    5
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct IMU {
    pub model: Model,
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: u8,
    #[serde(default = "default_address")]
    pub address: u8,
    pub calibration_file: PathBuf,
    #[serde(default = "default_filter_alpha")]
    pub filter_alpha: f32,
    /// Consecutive saturated readouts tolerated before faulting
    #[serde(default = "default_saturation_limit")]
    pub saturation_limit: usize,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl IMU {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub(super) fn validate(&self) -> Result<(), Error> {
        ensure(
            self.filter_alpha > 0.0 && self.filter_alpha < 1.0,
            "imu.filter-alpha must be in (0, 1)",
        )?;
        ensure(self.saturation_limit > 0, "imu.saturation-limit must be > 0")?;
        ensure(self.read_timeout_ms > 0, "imu.read-timeout-ms must be > 0")
    }
}
