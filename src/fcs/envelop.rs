use nalgebra::Vector3;

use crate::{config, imu::AttitudeEstimate, input::PilotCommand};

type Control = Vector3<f32>;

pub struct Envelop {
    max: Control,
    max_altitude: f32,
    max_tilt_angle: f32,
    takeoff_throttle: f32,
    hover_throttle: f32,
    max_throttle: f32,
}

impl Envelop {
    pub fn new(config: &config::Envelop) -> Self {
        Self {
            max: Vector3::new(config.max_roll_angle, config.max_pitch_angle, config.max_yaw_rate),
            max_altitude: config.max_altitude,
            max_tilt_angle: config.max_tilt_angle,
            takeoff_throttle: config.takeoff_throttle,
            hover_throttle: config.hover_throttle,
            max_throttle: config.max_throttle,
        }
    }

    /// Clamps roll and pitch angles and yaw rate, keeping the sign
    pub fn restrict(&self, input: Control) -> Control {
        input.zip_map(&self.max, |value, max| value.clamp(-max, max))
    }

    /// Roll and pitch angle, yaw rate requested by the sticks
    pub fn setpoint(&self, command: &PilotCommand) -> Control {
        let sticks = Vector3::new(command.roll(), command.pitch(), command.yaw());
        self.restrict(sticks.component_mul(&self.max))
    }

    /// Caps the throttle, and holds it at hover once above the altitude ceiling
    pub fn restrict_throttle(&self, throttle: f32, altitude: Option<f32>) -> f32 {
        let throttle = throttle.clamp(0.0, self.max_throttle);
        match altitude {
            Some(altitude) if altitude > self.max_altitude => throttle.min(self.hover_throttle),
            _ => throttle,
        }
    }

    pub fn is_airborne(&self, throttle: f32) -> bool {
        throttle > self.takeoff_throttle
    }

    /// Attitude beyond recovery
    pub fn is_breached(&self, attitude: &AttitudeEstimate) -> bool {
        attitude.roll.abs() > self.max_tilt_angle || attitude.pitch.abs() > self.max_tilt_angle
    }
}

#[cfg(test)]
mod test {
    use nalgebra::Vector3;

    use super::Envelop;
    use crate::config;

    fn envelop() -> Envelop {
        Envelop::new(&config::Envelop {
            max_roll_angle: 30.0,
            max_pitch_angle: 20.0,
            max_yaw_rate: 180.0,
            max_altitude: 10.0,
            takeoff_throttle: 10.0,
            hover_throttle: 50.0,
            max_throttle: 90.0,
            max_tilt_angle: 75.0,
        })
    }

    #[test]
    fn test_restrict() {
        let envelop = envelop();
        let input = Vector3::new(45.0, -25.0, 360.0);
        assert_eq!(envelop.restrict(input), Vector3::new(30.0, -20.0, 180.0));
        let input = Vector3::new(-45.0, 5.0, -10.0);
        assert_eq!(envelop.restrict(input), Vector3::new(-30.0, 5.0, -10.0));
    }

    #[test]
    fn test_setpoint() {
        use crate::input::PilotCommand;

        let envelop = envelop();
        let command = PilotCommand { right_x: -1.0, right_y: 0.5, left_x: 0.25, ..Default::default() };
        assert_eq!(envelop.setpoint(&command), Vector3::new(-30.0, 10.0, 45.0));
    }

    #[test]
    fn test_throttle() {
        let envelop = envelop();
        assert_eq!(envelop.restrict_throttle(100.0, None), 90.0);
        assert_eq!(envelop.restrict_throttle(80.0, Some(5.0)), 80.0);
        assert_eq!(envelop.restrict_throttle(80.0, Some(12.0)), 50.0);
        assert_eq!(envelop.restrict_throttle(30.0, Some(12.0)), 30.0);
        assert!(!envelop.is_airborne(10.0));
        assert!(envelop.is_airborne(10.5));
    }

    #[test]
    fn test_breach() {
        use crate::imu::AttitudeEstimate;

        let envelop = envelop();
        let attitude = AttitudeEstimate { roll: 60.0, pitch: -70.0, ..Default::default() };
        assert!(!envelop.is_breached(&attitude));
        let attitude = AttitudeEstimate { roll: -80.0, ..Default::default() };
        assert!(envelop.is_breached(&attitude));
    }
}
