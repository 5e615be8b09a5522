use crate::config::{Controller, ControllerType};
use crate::types::control::RawControl;

/// Snaps `value` to zero inside the deadzone and rescales the remainder so
/// the output still spans [-1, 1].
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if !value.is_finite() || value.abs() <= deadzone {
        return 0.0;
    }
    let rescaled = (value - deadzone.copysign(value)) / (1.0 - deadzone);
    rescaled.clamp(-1.0, 1.0)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Buttons {
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub lb: bool,
    pub rb: bool,
}

/// Normalized pilot intent, axes in [-1, 1] and triggers in [0, 1].
///
/// Default is neutral sticks with nothing pressed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct PilotCommand {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
    pub lt: f32,
    pub rt: f32,
    pub arm: bool,
    pub disarm: bool,
    pub buttons: Buttons,
}

impl PilotCommand {
    /// Percent, only the upper half of the left stick produces thrust
    pub fn throttle(&self) -> f32 {
        self.left_y.clamp(0.0, 1.0) * 100.0
    }

    pub fn roll(&self) -> f32 {
        self.right_x
    }

    pub fn pitch(&self) -> f32 {
        self.right_y
    }

    pub fn yaw(&self) -> f32 {
        self.left_x
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Normalizer {
    deadzone: f32,
    invert_y: bool,
}

impl Normalizer {
    pub fn new(config: &Controller) -> Self {
        let invert_y = config.kind == ControllerType::Xbox;
        Self { deadzone: config.deadzone, invert_y }
    }

    fn axis(&self, value: f32) -> f32 {
        apply_deadzone(value, self.deadzone)
    }

    pub fn normalize(&self, raw: &RawControl) -> PilotCommand {
        // gamepads report stick-up as negative
        let sign = if self.invert_y { -1.0 } else { 1.0 };
        let trigger = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        PilotCommand {
            left_x: self.axis(raw.left_x),
            left_y: self.axis(raw.left_y) * sign,
            right_x: self.axis(raw.right_x),
            right_y: self.axis(raw.right_y) * sign,
            lt: trigger(raw.lt_value),
            rt: trigger(raw.rt_value),
            arm: raw.start_pressed,
            disarm: raw.back_pressed,
            buttons: Buttons {
                a: raw.a_pressed,
                b: raw.b_pressed,
                x: raw.x_pressed,
                y: raw.y_pressed,
                lb: raw.lb_pressed,
                rb: raw.rb_pressed,
            },
        }
    }
}
