use super::{ensure, Error};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PID {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Bound on both the integral term and the total output
    pub limit: f32,
}

impl PID {
    fn validate(&self, axis: &str) -> Result<(), Error> {
        for (name, gain) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            ensure(gain.is_finite() && gain >= 0.0, format!("pids.{}.{} must be >= 0", axis, name))?;
        }
        ensure(self.limit.is_finite() && self.limit > 0.0, format!("pids.{}.limit must be > 0", axis))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PIDs {
    pub roll: PID,
    pub pitch: PID,
    pub yaw: PID,
}

impl PIDs {
    pub(super) fn validate(&self) -> Result<(), Error> {
        self.roll.validate("roll")?;
        self.pitch.validate("pitch")?;
        self.yaw.validate("yaw")
    }
}

fn default_max_throttle() -> f32 {
    100.0
}

fn default_max_tilt_angle() -> f32 {
    75.0
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Envelop {
    /// Degrees
    pub max_roll_angle: f32,
    /// Degrees
    pub max_pitch_angle: f32,
    /// Degrees per second
    pub max_yaw_rate: f32,
    /// Meters, only enforced when an altimeter is attached
    pub max_altitude: f32,
    /// Percent
    pub takeoff_throttle: f32,
    /// Percent
    pub hover_throttle: f32,
    #[serde(default = "default_max_throttle")]
    pub max_throttle: f32,
    /// Attitude beyond this is treated as loss of control
    #[serde(default = "default_max_tilt_angle")]
    pub max_tilt_angle: f32,
}

impl Envelop {
    pub(super) fn validate(&self) -> Result<(), Error> {
        let angles = [
            ("max-roll-angle", self.max_roll_angle),
            ("max-pitch-angle", self.max_pitch_angle),
            ("max-tilt-angle", self.max_tilt_angle),
        ];
        for (name, angle) in angles {
            ensure(angle > 0.0 && angle <= 90.0, format!("envelope.{} must be in (0, 90]", name))?;
        }
        ensure(self.max_yaw_rate > 0.0, "envelope.max-yaw-rate must be > 0")?;
        ensure(self.max_altitude > 0.0, "envelope.max-altitude must be > 0")?;
        let throttles = [
            ("takeoff-throttle", self.takeoff_throttle),
            ("hover-throttle", self.hover_throttle),
            ("max-throttle", self.max_throttle),
        ];
        for (name, throttle) in throttles {
            ensure((0.0..=100.0).contains(&throttle), format!("envelope.{} must be in [0, 100]", name))?;
        }
        ensure(
            self.takeoff_throttle <= self.max_throttle,
            "envelope.takeoff-throttle exceeds max-throttle",
        )?;
        ensure(
            self.max_tilt_angle >= self.max_roll_angle.max(self.max_pitch_angle),
            "envelope.max-tilt-angle must not be below the commanded angle limits",
        )
    }
}
