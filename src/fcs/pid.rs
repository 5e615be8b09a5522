use nalgebra::Vector3;

use crate::config;

/// Terms of the last update, for telemetry
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct Output {
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub value: f32,
}

/// Single axis PID.
///
/// The derivative acts on the measurement rather than the error, so a step
/// in setpoint produces no derivative kick. `integral` holds ki·Σ(error·dt)
/// and is itself bounded by `limit`.
#[derive(Copy, Clone, Debug)]
pub struct PID {
    kp: f32,
    ki: f32,
    kd: f32,
    limit: f32,
    integral: f32,
    previous: Option<f32>,
}

impl PID {
    pub fn new(config: &config::PID) -> Self {
        let config::PID { kp, ki, kd, limit } = *config;
        Self { kp, ki, kd, limit, integral: 0.0, previous: None }
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous = None;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// `dt` in seconds, a non-positive `dt` skips integration and derivative
    pub fn update(&mut self, setpoint: f32, measured: f32, dt: f32) -> Output {
        let error = setpoint - measured;
        let p = self.kp * error;
        let mut d = 0.0;
        if dt > 0.0 {
            self.integral = (self.integral + self.ki * error * dt).clamp(-self.limit, self.limit);
            if let Some(previous) = self.previous {
                d = -self.kd * (measured - previous) / dt;
            }
        }
        self.previous = Some(measured);
        let i = self.integral;
        let value = (p + i + d).clamp(-self.limit, self.limit);
        Output { p, i, d, value }
    }
}

pub struct PIDs {
    roll: PID,
    pitch: PID,
    yaw: PID,
}

impl PIDs {
    pub fn new(config: &config::PIDs) -> Self {
        Self { roll: PID::new(&config.roll), pitch: PID::new(&config.pitch), yaw: PID::new(&config.yaw) }
    }

    pub fn reset(&mut self) {
        self.roll.reset();
        self.pitch.reset();
        self.yaw.reset();
    }

    /// x for roll angle, y for pitch angle, z for yaw rate
    pub fn next_control(&mut self, setpoint: Vector3<f32>, measured: Vector3<f32>, dt: f32) -> Vector3<f32> {
        let roll = self.roll.update(setpoint.x, measured.x, dt).value;
        let pitch = self.pitch.update(setpoint.y, measured.y, dt).value;
        let yaw = self.yaw.update(setpoint.z, measured.z, dt).value;
        Vector3::new(roll, pitch, yaw)
    }
}

mod test {
    #[test]
    fn test_single_tick() {
        use super::PID;
        use crate::config;

        let mut pid = PID::new(&config::PID { kp: 4.0, ki: 0.05, kd: 0.0, limit: 400.0 });
        let output = pid.update(0.0, 5.0, 0.02);
        assert_eq!(output.p, -20.0);
        assert!((output.i + 0.005).abs() < 1e-7);
        assert!((pid.integral() + 0.005).abs() < 1e-7);
        assert_eq!(output.d, 0.0);
        assert!((output.value + 20.005).abs() < 1e-5);
    }

    #[test]
    fn test_anti_windup() {
        use super::PID;
        use crate::config;

        let mut pid = PID::new(&config::PID { kp: 10.0, ki: 5.0, kd: 0.0, limit: 100.0 });
        for _ in 0..10_000 {
            let output = pid.update(90.0, 0.0, 0.01);
            assert!(output.value <= 100.0);
            assert!(pid.integral() <= 100.0);
        }
        assert_eq!(pid.integral(), 100.0);

        // unwinds as soon as the error flips
        let output = pid.update(0.0, 10.0, 0.01);
        assert!(output.value < 0.0);
    }

    #[test]
    fn test_derivative_on_measurement() {
        use super::PID;
        use crate::config;

        let mut pid = PID::new(&config::PID { kp: 0.0, ki: 0.0, kd: 1.0, limit: 400.0 });
        assert_eq!(pid.update(0.0, 0.0, 0.01).d, 0.0);
        // setpoint step, no kick
        assert_eq!(pid.update(30.0, 0.0, 0.01).d, 0.0);
        let output = pid.update(30.0, 1.0, 0.01);
        assert!((output.d + 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_reset() {
        use super::PID;
        use crate::config;

        let mut pid = PID::new(&config::PID { kp: 0.0, ki: 1.0, kd: 1.0, limit: 400.0 });
        pid.update(10.0, 0.0, 0.1);
        pid.update(10.0, 1.0, 0.1);
        assert!(pid.integral() > 0.0);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        let output = pid.update(0.0, 5.0, 0.1);
        assert_eq!(output.d, 0.0);
    }

    #[test]
    fn test_non_positive_dt() {
        use super::PID;
        use crate::config;

        let mut pid = PID::new(&config::PID { kp: 1.0, ki: 1.0, kd: 1.0, limit: 400.0 });
        pid.update(0.0, 1.0, 0.01);
        let output = pid.update(0.0, 3.0, 0.0);
        assert_eq!((output.p, output.i, output.d), (-3.0, -0.01, 0.0));
        assert!((output.value + 3.01).abs() < 1e-6);
    }
}
