use std::time::Duration;

use super::{ensure, Error};

fn default_arm_settle_ms() -> u64 {
    2000
}

fn default_pwm_frequency() -> u16 {
    50
}

/// BCM numbering, highest GPIO on the 40-pin header
const MAX_GPIO: u8 = 27;

/// How far below the throttle range the arm pulse may sit
const ARM_PULSE_MARGIN: u32 = 500;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Motors {
    /// Front-left, front-right, rear-left, rear-right
    pub pins: [u8; 4],
    pub min_pulse_width: u16,
    pub max_pulse_width: u16,
    pub arm_pulse_width: u16,
    #[serde(default = "default_arm_settle_ms")]
    pub arm_settle_ms: u64,
    #[serde(default = "default_pwm_frequency")]
    pub pwm_frequency: u16,
}

impl Motors {
    pub fn arm_settle(&self) -> Duration {
        Duration::from_millis(self.arm_settle_ms)
    }

    pub(super) fn validate(&self) -> Result<(), Error> {
        for (i, pin) in self.pins.iter().enumerate() {
            ensure(*pin <= MAX_GPIO, format!("motors.pins: GPIO {} out of range", pin))?;
            ensure(!self.pins[..i].contains(pin), format!("motors.pins: GPIO {} used twice", pin))?;
        }
        ensure(
            self.min_pulse_width < self.max_pulse_width,
            "motors.min-pulse-width must be below max-pulse-width",
        )?;
        ensure(
            self.arm_pulse_width <= self.max_pulse_width,
            "motors.arm-pulse-width exceeds max-pulse-width",
        )?;
        ensure(
            self.arm_pulse_width as u32 + ARM_PULSE_MARGIN >= self.min_pulse_width as u32,
            format!("motors.arm-pulse-width more than {}us below min-pulse-width", ARM_PULSE_MARGIN),
        )?;
        ensure(self.pwm_frequency > 0, "motors.pwm-frequency must be > 0")?;
        let period = 1_000_000 / self.pwm_frequency as u32;
        ensure(
            (self.max_pulse_width as u32) < period,
            format!("motors.max-pulse-width does not fit a {}Hz period", self.pwm_frequency),
        )
    }
}
