use core::f32::consts::PI;

use nalgebra::Vector3;

pub const DEGREE_PER_DAG: f32 = 180.0 / PI;

/// Wraps an angle in degrees into [-180, 180]
pub fn wrap(angle: f32) -> f32 {
    let angle = angle % 360.0;
    match angle {
        _ if angle > 180.0 => angle - 360.0,
        _ if angle < -180.0 => angle + 360.0,
        _ => angle,
    }
}

#[derive(Default, Copy, Clone, Serialize, Debug, PartialEq)]
pub struct Tilt {
    pub roll: f32,
    pub pitch: f32,
}

impl Tilt {
    pub fn new(roll: f32, pitch: f32) -> Self {
        Self { roll, pitch }
    }
}

/// Gravity direction seen by a resting accelerometer, in g
impl From<Vector3<f32>> for Tilt {
    fn from(a: Vector3<f32>) -> Self {
        let roll = a.y.atan2(a.z);
        let pitch = (-a.x).atan2((a.y * a.y + a.z * a.z).sqrt());
        Self { roll: roll * DEGREE_PER_DAG, pitch: pitch * DEGREE_PER_DAG }
    }
}

impl Into<(isize, isize)> for Tilt {
    fn into(self) -> (isize, isize) {
        (self.roll.round() as isize, self.pitch.round() as isize)
    }
}

mod test {
    #[test]
    fn test_wrap() {
        use super::wrap;

        assert_eq!(wrap(0.0), 0.0);
        assert_eq!(wrap(180.0), 180.0);
        assert_eq!(wrap(190.0), -170.0);
        assert_eq!(wrap(-190.0), 170.0);
        assert_eq!(wrap(720.0 + 45.0), 45.0);
    }

    #[test]
    fn test_tilt_from_acceleration() {
        use nalgebra::Vector3;

        use super::Tilt;

        // level
        assert_eq!((0, 0), Tilt::from(Vector3::new(0.0, 0.0, 1.0)).into());

        // right side down
        let half = core::f32::consts::FRAC_1_SQRT_2;
        assert_eq!((45, 0), Tilt::from(Vector3::new(0.0, half, half)).into());

        // nose down
        assert_eq!((0, 45), Tilt::from(Vector3::new(-half, 0.0, half)).into());

        // upside down
        assert_eq!((180, 0), Tilt::from(Vector3::new(0.0, 0.0, -1.0)).into());
    }
}
