use log::{Level, LevelFilter};

use super::{ensure, Error};

fn default_level() -> LevelFilter {
    LevelFilter::Info
}

fn default_telemetry_level() -> Level {
    Level::Debug
}

fn default_telemetry_interval() -> usize {
    10
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Logging {
    #[serde(default = "default_level")]
    pub level: LevelFilter,
    #[serde(default = "default_telemetry_level")]
    pub telemetry_level: Level,
    /// Emit one telemetry line every N control ticks
    #[serde(default = "default_telemetry_interval")]
    pub telemetry_interval: usize,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_level(),
            telemetry_level: default_telemetry_level(),
            telemetry_interval: default_telemetry_interval(),
        }
    }
}

impl Logging {
    pub(super) fn validate(&self) -> Result<(), Error> {
        ensure(self.telemetry_interval > 0, "logging.telemetry-interval must be > 0")
    }
}
