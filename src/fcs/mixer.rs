use crate::types::output::{Motors, Position};

/// Roll, pitch and yaw sign per motor. Positive roll is right side down and
/// positive pitch is nose down, so a positive roll correction lifts the left
/// pair and a positive pitch correction lifts the rear pair. Diagonal pairs
/// share a spin direction, so yaw flips between them.
const MATRIX: [(Position, [f32; 3]); 4] = [
    (Position::FrontLeft, [1.0, -1.0, -1.0]),
    (Position::FrontRight, [-1.0, -1.0, 1.0]),
    (Position::RearLeft, [1.0, 1.0, 1.0]),
    (Position::RearRight, [-1.0, 1.0, -1.0]),
];

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Mixed {
    pub motors: Motors,
    /// At least one motor was clamped, relative thrust is no longer exact
    pub saturated: bool,
}

/// Quad X mix, each motor clamped into [0, 100] without renormalizing the others
pub fn mix(throttle: f32, roll: f32, pitch: f32, yaw: f32) -> Mixed {
    let mut mixed = Mixed::default();
    for (position, [r, p, y]) in MATRIX {
        let value = throttle + r * roll + p * pitch + y * yaw;
        let clamped = value.clamp(0.0, 100.0);
        mixed.saturated |= clamped != value;
        mixed.motors.0[position as usize] = clamped;
    }
    mixed
}

mod test {
    #[test]
    fn test_mix() {
        use super::mix;
        use crate::types::output::{Motors, Position};

        let mixed = mix(50.0, 0.0, 0.0, 0.0);
        assert_eq!(mixed.motors, Motors([50.0; 4]));
        assert!(!mixed.saturated);

        // right side down corrects with negative roll, right pair pushes
        let mixed = mix(50.0, -10.0, 0.0, 0.0);
        assert_eq!(mixed.motors, Motors([40.0, 60.0, 40.0, 60.0]));

        // nose down corrects with negative pitch, front pair pushes
        let mixed = mix(50.0, 0.0, -10.0, 0.0);
        assert_eq!(mixed.motors, Motors([60.0, 60.0, 40.0, 40.0]));
        assert_eq!(mixed.motors[Position::FrontLeft], 60.0);
        assert_eq!(mixed.motors[Position::RearRight], 40.0);

        // diagonal pairs
        let mixed = mix(50.0, 0.0, 0.0, 10.0);
        assert_eq!(mixed.motors, Motors([40.0, 60.0, 60.0, 40.0]));
    }

    #[test]
    fn test_mix_clamp() {
        use super::mix;

        for correction in [0.1, 1.0, 25.0, 400.0] {
            let mixed = mix(100.0, correction, correction, correction);
            assert!(mixed.motors.0.iter().all(|&m| (0.0..=100.0).contains(&m)));
            assert!(mixed.saturated);
        }

        let mixed = mix(0.0, -400.0, 400.0, 0.0);
        assert!(mixed.motors.0.iter().all(|&m| (0.0..=100.0).contains(&m)));
        assert_eq!(mixed.motors.0, [0.0, 0.0, 0.0, 100.0]);
    }
}
