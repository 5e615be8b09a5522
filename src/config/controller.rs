use std::net::SocketAddr;
use std::time::Duration;

use super::{ensure, Error};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerType {
    /// Gamepad-style source, stick Y axes are inverted
    Xbox,
    /// Phone app posting to the HTTP endpoint
    Mobile,
}

fn default_deadzone() -> f32 {
    0.1
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_stale_timeout_ms() -> u64 {
    500
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Controller {
    #[serde(rename = "type")]
    pub kind: ControllerType,
    #[serde(default = "default_deadzone")]
    pub deadzone: f32,
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_stale_timeout_ms")]
    pub stale_timeout_ms: u64,
}

impl Controller {
    pub fn stale_timeout(&self) -> Duration {
        Duration::from_millis(self.stale_timeout_ms)
    }

    pub(super) fn validate(&self) -> Result<(), Error> {
        ensure((0.0..1.0).contains(&self.deadzone), "controller.deadzone must be in [0, 1)")?;
        ensure(self.stale_timeout_ms > 0, "controller.stale-timeout-ms must be > 0")
    }
}
