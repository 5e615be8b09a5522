use crate::types::measurement::{wrap, Tilt};

// prediction = previous + gyro rate · dt
// Output = prediction + (1-α)·(accel - prediction), with the difference
// wrapped so that ±180° crossings do not swing through zero.
//
// Gyro weight α acts as a first order high-pass on the gyro and low-pass on
// the accelerometer with time constant τ = α·dt / (1-α), 0.49s for α = 0.98
// at 100Hz.
#[derive(Copy, Clone, Debug)]
pub struct ComplementaryFilter {
    alpha: f32,
    output: Option<Tilt>,
}

fn blend(previous: f32, rate: f32, measured: f32, alpha: f32, dt: f32) -> f32 {
    let prediction = wrap(previous + rate * dt);
    wrap(prediction + (1.0 - alpha) * wrap(measured - prediction))
}

impl ComplementaryFilter {
    pub fn new(alpha: f32) -> Self {
        Self { alpha, output: None }
    }

    /// `rates` are roll and pitch rate in degrees per second, `dt` in seconds.
    /// The first sample seeds the output from the accelerometer alone.
    pub fn filter(&mut self, measured: Tilt, rates: (f32, f32), dt: f32) -> Tilt {
        let output = match self.output {
            None => measured,
            Some(previous) => Tilt {
                roll: blend(previous.roll, rates.0, measured.roll, self.alpha, dt),
                pitch: blend(previous.pitch, rates.1, measured.pitch, self.alpha, dt),
            },
        };
        self.output = Some(output);
        output
    }

    pub fn output(&self) -> Option<Tilt> {
        self.output
    }
}

mod test {
    #[test]
    fn test_seed_from_accelerometer() {
        use super::ComplementaryFilter;
        use crate::types::measurement::Tilt;

        let mut filter = ComplementaryFilter::new(0.98);
        assert_eq!(filter.output(), None);
        let tilt = filter.filter(Tilt::new(10.0, -5.0), (100.0, 100.0), 0.01);
        assert_eq!(tilt, Tilt::new(10.0, -5.0));
    }

    #[test]
    fn test_gyro_integration() {
        use super::ComplementaryFilter;
        use crate::types::measurement::Tilt;

        // accelerometer agrees with the integrated gyro, so the blend is a no-op
        let mut filter = ComplementaryFilter::new(0.98);
        filter.filter(Tilt::new(0.0, 0.0), (0.0, 0.0), 0.01);
        let tilt = filter.filter(Tilt::new(1.0, -1.0), (100.0, -100.0), 0.01);
        assert!((tilt.roll - 1.0).abs() < 1e-4);
        assert!((tilt.pitch + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_converge_to_accelerometer() {
        use super::ComplementaryFilter;
        use crate::types::measurement::Tilt;

        let mut filter = ComplementaryFilter::new(0.98);
        filter.filter(Tilt::new(0.0, 0.0), (0.0, 0.0), 0.01);
        let first = filter.filter(Tilt::new(10.0, 0.0), (0.0, 0.0), 0.01);
        assert!((first.roll - 0.2).abs() < 1e-4);

        // 5 time constants
        for _ in 0..250 {
            filter.filter(Tilt::new(10.0, 0.0), (0.0, 0.0), 0.01);
        }
        let tilt = filter.output().unwrap();
        assert!((tilt.roll - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_wrap_around() {
        use super::ComplementaryFilter;
        use crate::types::measurement::Tilt;

        let mut filter = ComplementaryFilter::new(0.5);
        filter.filter(Tilt::new(179.0, 0.0), (0.0, 0.0), 0.01);
        let tilt = filter.filter(Tilt::new(-179.0, 0.0), (0.0, 0.0), 0.01);
        assert!((tilt.roll.abs() - 180.0).abs() < 1e-3);
    }
}
