use std::time::{Duration, Instant};

use super::{ActuationError, ESCs};
use crate::types::output::{Motors, Position};

/// Throttle range in percent for spinning one motor on the bench
pub const SINGLE_THROTTLE: (f32, f32) = (5.0, 30.0);
/// Throttle range in percent for spinning all motors at once
pub const ALL_THROTTLE: (f32, f32) = (5.0, 20.0);
pub const MIN_DURATION: Duration = Duration::from_secs(1);
pub const MAX_DURATION: Duration = Duration::from_secs(5);
/// Rest between motors when testing them one by one
pub const PAUSE: Duration = Duration::from_secs(1);

/// Spins props-off motors for a bounded time at a bounded throttle
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpinTest {
    /// `None` for all motors together
    pub motor: Option<Position>,
    pub throttle: f32,
    pub duration: Duration,
}

impl SpinTest {
    pub fn new(motor: Option<Position>, throttle: f32, duration: Duration) -> Self {
        let (min, max) = if motor.is_some() { SINGLE_THROTTLE } else { ALL_THROTTLE };
        let throttle = if throttle.is_finite() { throttle.clamp(min, max) } else { min };
        Self { motor, throttle, duration: duration.clamp(MIN_DURATION, MAX_DURATION) }
    }
}

/// Every motor in turn at the single motor limits
pub fn each_motor(throttle: f32, duration: Duration) -> Vec<SpinTest> {
    Position::ALL.iter().map(|&p| SpinTest::new(Some(p), throttle, duration)).collect()
}

/// Arms, runs the tests in order and disarms. `sleep` returns false to abort,
/// in which case the motors are stopped and the remaining tests skipped.
pub fn run(
    escs: &mut ESCs,
    tests: &[SpinTest],
    mut sleep: impl FnMut(Duration) -> bool,
) -> Result<(), ActuationError> {
    let result = spin(escs, tests, &mut sleep);
    let disarm = escs.disarm();
    result.and(disarm)
}

fn spin(
    escs: &mut ESCs,
    tests: &[SpinTest],
    sleep: &mut impl FnMut(Duration) -> bool,
) -> Result<(), ActuationError> {
    let start = Instant::now();
    escs.arm(start)?;
    if !sleep(escs.settle()) {
        return Ok(());
    }
    if !escs.poll_arming(start + escs.settle())? {
        return Err(ActuationError::NotArmed);
    }

    for (i, test) in tests.iter().enumerate() {
        if i > 0 && !sleep(PAUSE) {
            return Ok(());
        }
        let mut motors = Motors::default();
        match test.motor {
            Some(position) => motors.0[position as usize] = test.throttle,
            None => motors = Motors([test.throttle; 4]),
        }
        info!("Spinning {:?} at {}% for {:?}", test.motor, test.throttle, test.duration);
        escs.write_all(&motors)?;
        let completed = sleep(test.duration);
        escs.write_all(&Motors::default())?;
        if !completed {
            return Ok(());
        }
    }
    Ok(())
}

mod test {
    #[test]
    fn test_limits() {
        use std::time::Duration;

        use super::SpinTest;
        use crate::types::output::Position;

        let test = SpinTest::new(Some(Position::RearLeft), 80.0, Duration::from_secs(60));
        assert_eq!(test.throttle, 30.0);
        assert_eq!(test.duration, Duration::from_secs(5));

        let test = SpinTest::new(None, 25.0, Duration::from_millis(10));
        assert_eq!(test.throttle, 20.0);
        assert_eq!(test.duration, Duration::from_secs(1));

        assert_eq!(SpinTest::new(None, -3.0, Duration::from_secs(2)).throttle, 5.0);
        assert_eq!(SpinTest::new(None, f32::NAN, Duration::from_secs(2)).throttle, 5.0);
    }

    #[test]
    fn test_single_motor() {
        use std::time::Duration;

        use super::{run, SpinTest};
        use crate::esc::test::{motors_config, recorders};
        use crate::esc::ESCs;
        use crate::types::output::Position;

        let (recorders, outputs) = recorders();
        let mut escs = ESCs::new(outputs, &motors_config());
        let test = SpinTest::new(Some(Position::FrontRight), 20.0, Duration::from_secs(2));
        let mut sleeps = Vec::new();
        run(&mut escs, &[test], |duration| {
            sleeps.push(duration);
            true
        })
        .unwrap();

        assert_eq!(sleeps, vec![Duration::from_secs(2), Duration::from_secs(2)]);
        let history = recorders[1].pulses.lock().unwrap().clone();
        // arm pulse, settle, spin, stop, disarm
        assert_eq!(history, vec![1000, 1000, 1200, 1000, 1000]);
        let others = recorders[0].pulses.lock().unwrap().clone();
        assert!(others.iter().all(|&p| p == 1000));
        assert!(!escs.is_ready());
    }

    #[test]
    fn test_each_motor_in_turn() {
        use std::time::Duration;

        use super::{each_motor, run, PAUSE};
        use crate::esc::test::{motors_config, recorders};
        use crate::esc::ESCs;

        let (recorders, outputs) = recorders();
        let mut escs = ESCs::new(outputs, &motors_config());
        let mut pauses = 0;
        let tests = each_motor(15.0, Duration::from_secs(2));
        run(&mut escs, &tests, |duration| {
            if duration == PAUSE {
                pauses += 1;
            }
            true
        })
        .unwrap();
        assert_eq!(pauses, 3);
        for recorder in recorders.iter() {
            let history = recorder.pulses.lock().unwrap().clone();
            assert_eq!(history.iter().filter(|&&p| p == 1150).count(), 1);
            assert_eq!(history.last(), Some(&1000));
        }
    }

    #[test]
    fn test_abort_stops_motors() {
        use std::time::Duration;

        use super::{run, SpinTest};
        use crate::esc::test::{motors_config, recorders};
        use crate::esc::ESCs;

        let (recorders, outputs) = recorders();
        let mut escs = ESCs::new(outputs, &motors_config());
        let test = SpinTest::new(None, 10.0, Duration::from_secs(3));
        let mut calls = 0;
        run(&mut escs, &[test, test], |_| {
            calls += 1;
            // interrupted while spinning
            calls < 2
        })
        .unwrap();
        assert_eq!(calls, 2);
        for recorder in recorders.iter() {
            let history = recorder.pulses.lock().unwrap().clone();
            assert_eq!(history.iter().filter(|&&p| p == 1100).count(), 1);
            assert_eq!(history.last(), Some(&1000));
        }
    }
}
