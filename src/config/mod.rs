pub mod controller;
pub mod fcs;
pub mod imu;
pub mod logging;
pub mod motors;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub use controller::{Controller, ControllerType};
pub use fcs::{Envelop, PIDs, PID};
pub use imu::{Model, IMU};
pub use logging::Logging;
pub use motors::Motors;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Unable to read config: {}", e),
            Self::Parse(e) => write!(f, "Malformed config: {}", e),
            Self::Invalid(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for Error {}

pub(crate) fn ensure(condition: bool, message: impl Into<String>) -> Result<(), Error> {
    if condition {
        return Ok(());
    }
    Err(Error::Invalid(message.into()))
}

fn default_rate() -> u16 {
    100
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Loop {
    /// Hz
    #[serde(default = "default_rate")]
    pub rate: u16,
}

impl Default for Loop {
    fn default() -> Self {
        Self { rate: default_rate() }
    }
}

impl Loop {
    pub fn period(&self) -> Duration {
        Duration::from_secs(1) / self.rate.max(1) as u32
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub motors: Motors,
    pub pids: PIDs,
    pub controller: Controller,
    pub envelope: Envelop,
    pub imu: IMU,
    #[serde(default, rename = "loop")]
    pub control_loop: Loop,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        self.motors.validate()?;
        self.pids.validate()?;
        self.controller.validate()?;
        self.envelope.validate()?;
        self.imu.validate()?;
        ensure((1..=1000).contains(&self.control_loop.rate), "loop.rate must be in [1, 1000]")?;
        self.logging.validate()
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))?;
    let config: Config = text.parse()?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
pub(crate) const SAMPLE: &str = indoc! {"
    motors:
      pins: [17, 18, 27, 22]
      min-pulse-width: 1000
      max-pulse-width: 2000
      arm-pulse-width: 1000
    pids:
      roll: {kp: 1.0, ki: 0.01, kd: 0.1, limit: 400}
      pitch: {kp: 1.0, ki: 0.01, kd: 0.1, limit: 400}
      yaw: {kp: 2.0, ki: 0.0, kd: 0.0, limit: 400}
    controller:
      type: xbox
    envelope:
      max-roll-angle: 30
      max-pitch-angle: 30
      max-yaw-rate: 180
      max-altitude: 10
      takeoff-throttle: 10
      hover-throttle: 50
    imu:
      model: mpu6050
      calibration-file: calibration.json
"};

#[cfg(test)]
mod test {
    use super::{Config, ControllerType, Error, Model, SAMPLE};

    #[test]
    fn test_parse_with_defaults() {
        let config: Config = SAMPLE.parse().unwrap();
        assert_eq!(config.motors.pins, [17, 18, 27, 22]);
        assert_eq!(config.motors.arm_settle_ms, 2000);
        assert_eq!(config.motors.pwm_frequency, 50);
        assert_eq!(config.controller.kind, ControllerType::Xbox);
        assert_eq!(config.controller.deadzone, 0.1);
        assert_eq!(config.controller.listen.port(), 8080);
        assert_eq!(config.controller.stale_timeout_ms, 500);
        assert_eq!(config.envelope.max_throttle, 100.0);
        assert_eq!(config.envelope.max_tilt_angle, 75.0);
        assert_eq!(config.imu.model, Model::Mpu6050);
        assert_eq!(config.imu.address, 0x68);
        assert_eq!(config.imu.filter_alpha, 0.98);
        assert_eq!(config.control_loop.rate, 100);
        assert_eq!(config.control_loop.period().as_millis(), 10);
        assert_eq!(config.logging.level, log::LevelFilter::Info);
        assert_eq!(config.pids.yaw.kp, 2.0);
    }

    #[test]
    fn test_missing_section() {
        let text = SAMPLE.replace("controller:\n  type: xbox\n", "");
        assert!(matches!(text.parse::<Config>(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_unknown_key() {
        let text = SAMPLE.replace("type: xbox", "type: xbox\n  rumble: true");
        assert!(matches!(text.parse::<Config>(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_invalid_values() {
        let text = SAMPLE.replace("min-pulse-width: 1000", "min-pulse-width: 2500");
        assert!(matches!(text.parse::<Config>(), Err(Error::Invalid(_))));

        let text = SAMPLE.replace("[17, 18, 27, 22]", "[17, 18, 17, 22]");
        assert!(matches!(text.parse::<Config>(), Err(Error::Invalid(_))));

        let text = SAMPLE.replace("model: mpu6050", "model: mpu6050\n  filter-alpha: 1.5");
        assert!(matches!(text.parse::<Config>(), Err(Error::Invalid(_))));

        let text = SAMPLE.replace("max-roll-angle: 30", "max-roll-angle: 80");
        assert!(matches!(text.parse::<Config>(), Err(Error::Invalid(_))));

        let text = SAMPLE.replace("kp: 2.0", "kp: -2.0");
        assert!(matches!(text.parse::<Config>(), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_arm_pulse_range() {
        let text = SAMPLE.replace("arm-pulse-width: 1000", "arm-pulse-width: 499");
        assert!(matches!(text.parse::<Config>(), Err(Error::Invalid(_))));

        let text = SAMPLE.replace("arm-pulse-width: 1000", "arm-pulse-width: 0");
        assert!(matches!(text.parse::<Config>(), Err(Error::Invalid(_))));

        let text = SAMPLE.replace("arm-pulse-width: 1000", "arm-pulse-width: 500");
        assert!(text.parse::<Config>().is_ok());

        let text = SAMPLE.replace("arm-pulse-width: 1000", "arm-pulse-width: 2001");
        assert!(matches!(text.parse::<Config>(), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = super::load(file.path()).unwrap();
        assert_eq!(config.envelope.hover_throttle, 50.0);

        let missing = file.path().with_extension("missing");
        assert!(matches!(super::load(missing), Err(Error::Io(_))));
    }
}
