pub mod bench;

use std::fmt;
use std::time::{Duration, Instant};

use crate::{
    config,
    hal::pwm::{self, PWM},
    types::output::Motors,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ActuationError {
    Channel(usize, pwm::Error),
    /// Non-zero command before the arming sequence completed
    NotArmed,
    InvalidMotor(usize),
}

impl fmt::Display for ActuationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Channel(index, e) => write!(f, "ESC {} write failed: {}", index, e),
            Self::NotArmed => write!(f, "ESC not armed"),
            Self::InvalidMotor(index) => write!(f, "No such motor {}", index),
        }
    }
}

impl std::error::Error for ActuationError {}

/// Linear map of [0, 100] percent onto [min, max] microseconds
pub fn to_pulse_width(min: u16, max: u16, percentage: f32) -> u16 {
    let percentage = if percentage.is_finite() { percentage.clamp(0.0, 100.0) } else { 0.0 };
    let range = (max - min) as f32;
    min + (range * percentage / 100.0).round() as u16
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum State {
    Disarmed,
    Arming(Instant),
    Ready,
}

pub struct ESCs {
    outputs: [PWM; 4],
    min_pulse_width: u16,
    max_pulse_width: u16,
    arm_pulse_width: u16,
    settle: Duration,
    state: State,
}

impl ESCs {
    pub fn new(outputs: [PWM; 4], config: &config::Motors) -> Self {
        Self {
            outputs,
            min_pulse_width: config.min_pulse_width,
            max_pulse_width: config.max_pulse_width,
            arm_pulse_width: config.arm_pulse_width,
            settle: config.arm_settle(),
            state: State::Disarmed,
        }
    }

    /// Writes `micros` to every channel, continuing past failures and
    /// returning the first one
    fn write_raw(&mut self, micros: u16) -> Result<(), ActuationError> {
        let mut result = Ok(());
        for (index, output) in self.outputs.iter_mut().enumerate() {
            if let Err(e) = output.set_pulse_width(micros) {
                result = result.and(Err(ActuationError::Channel(index, e)));
            }
        }
        result
    }

    pub fn is_ready(&self) -> bool {
        self.state == State::Ready
    }

    /// How long the arm pulse is held before variable commands are accepted
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// End point calibration. Holds the max pulse until `wait` returns, which
    /// is when the ESCs are powered and have beeped, then holds the min pulse
    /// until `wait` returns again and disarms.
    pub fn calibrate(&mut self, mut wait: impl FnMut(u16)) -> Result<(), ActuationError> {
        self.state = State::Disarmed;
        info!("ESC calibration, max pulse {}us", self.max_pulse_width);
        self.write_raw(self.max_pulse_width)?;
        wait(self.max_pulse_width);
        info!("ESC calibration, min pulse {}us", self.min_pulse_width);
        self.write_raw(self.min_pulse_width)?;
        wait(self.min_pulse_width);
        self.disarm()
    }

    /// Starts the arming sequence with the arm pulse on every channel
    pub fn arm(&mut self, now: Instant) -> Result<(), ActuationError> {
        debug!("Arming ESCs with {}us pulse", self.arm_pulse_width);
        self.state = State::Arming(now);
        self.write_raw(self.arm_pulse_width)
    }

    /// Holds the arm pulse until it has been applied for the settle duration,
    /// returns whether variable commands are accepted
    pub fn poll_arming(&mut self, now: Instant) -> Result<bool, ActuationError> {
        match self.state {
            State::Ready => Ok(true),
            State::Disarmed => Ok(false),
            State::Arming(since) => {
                self.write_raw(self.arm_pulse_width)?;
                if now.saturating_duration_since(since) < self.settle {
                    return Ok(false);
                }
                info!("ESCs armed");
                self.state = State::Ready;
                Ok(true)
            }
        }
    }

    pub fn write(&mut self, index: usize, percentage: f32) -> Result<(), ActuationError> {
        if index >= self.outputs.len() {
            return Err(ActuationError::InvalidMotor(index));
        }
        let micros = match self.state {
            State::Ready => to_pulse_width(self.min_pulse_width, self.max_pulse_width, percentage),
            _ if percentage > 0.0 => return Err(ActuationError::NotArmed),
            State::Arming(_) => self.arm_pulse_width,
            State::Disarmed => self.min_pulse_width,
        };
        let output = &mut self.outputs[index];
        output.set_pulse_width(micros).map_err(|e| ActuationError::Channel(index, e))
    }

    pub fn write_all(&mut self, motors: &Motors) -> Result<(), ActuationError> {
        let mut result = Ok(());
        for (index, &percentage) in motors.0.iter().enumerate() {
            result = result.and(self.write(index, percentage));
        }
        result
    }

    /// Minimum pulse on every channel, overriding whatever was commanded
    pub fn disarm(&mut self) -> Result<(), ActuationError> {
        if self.state != State::Disarmed {
            info!("ESCs disarmed");
        }
        self.state = State::Disarmed;
        self.write_raw(self.min_pulse_width)
    }
}

impl Drop for ESCs {
    fn drop(&mut self) {
        if let Err(e) = self.disarm() {
            error!("Unable to disarm ESCs on drop: {}", e);
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use super::{to_pulse_width, ActuationError, ESCs};
    use crate::config;
    use crate::hal::pwm::{self, PulseOutput, PWM};
    use crate::types::output::Motors;

    /// Records every pulse width written, optionally failing
    #[derive(Clone, Default)]
    pub struct Recorder {
        pub pulses: Arc<Mutex<Vec<u16>>>,
        pub fail: Arc<Mutex<bool>>,
    }

    impl Recorder {
        pub fn last(&self) -> Option<u16> {
            self.pulses.lock().unwrap().last().copied()
        }
    }

    impl PulseOutput for Recorder {
        fn set_pulse_width(&mut self, micros: u16) -> Result<(), pwm::Error> {
            if *self.fail.lock().unwrap() {
                return Err(pwm::Error("gpio".to_owned()));
            }
            self.pulses.lock().unwrap().push(micros);
            Ok(())
        }
    }

    pub fn motors_config() -> config::Motors {
        config::Motors {
            pins: [17, 18, 27, 22],
            min_pulse_width: 1000,
            max_pulse_width: 2000,
            arm_pulse_width: 1000,
            arm_settle_ms: 2000,
            pwm_frequency: 50,
        }
    }

    pub fn recorders() -> ([Recorder; 4], [PWM; 4]) {
        let recorders: [Recorder; 4] = Default::default();
        let outputs = recorders.clone().map(|r| Box::new(r) as PWM);
        (recorders, outputs)
    }

    #[test]
    fn test_to_pulse_width() {
        assert_eq!(to_pulse_width(1000, 2000, 0.0), 1000);
        assert_eq!(to_pulse_width(1000, 2000, 50.0), 1500);
        assert_eq!(to_pulse_width(1000, 2000, 100.0), 2000);
        assert_eq!(to_pulse_width(1000, 2000, 150.0), 2000);
        assert_eq!(to_pulse_width(1000, 2000, -5.0), 1000);
        assert_eq!(to_pulse_width(1100, 1900, 25.0), 1300);
        assert_eq!(to_pulse_width(1000, 2000, f32::NAN), 1000);
    }

    #[test]
    fn test_arming_sequence() {
        let (recorders, outputs) = recorders();
        let mut escs = ESCs::new(outputs, &motors_config());
        let now = Instant::now();

        assert_eq!(escs.write(0, 10.0), Err(ActuationError::NotArmed));
        escs.arm(now).unwrap();
        assert!(recorders.iter().all(|r| r.last() == Some(1000)));
        assert_eq!(escs.write(0, 10.0), Err(ActuationError::NotArmed));
        assert_eq!(escs.poll_arming(now + Duration::from_millis(1999)), Ok(false));
        assert_eq!(escs.poll_arming(now + Duration::from_millis(2000)), Ok(true));
        assert!(escs.is_ready());

        escs.write_all(&Motors([0.0, 50.0, 100.0, 25.0])).unwrap();
        let last: Vec<_> = recorders.iter().map(|r| r.last().unwrap()).collect();
        assert_eq!(last, vec![1000, 1500, 2000, 1250]);
        assert_eq!(escs.write(4, 10.0), Err(ActuationError::InvalidMotor(4)));
    }

    #[test]
    fn test_disarm() {
        let (recorders, outputs) = recorders();
        let mut escs = ESCs::new(outputs, &motors_config());
        let now = Instant::now();
        escs.arm(now).unwrap();
        escs.poll_arming(now + Duration::from_secs(3)).unwrap();
        escs.write_all(&Motors([80.0; 4])).unwrap();
        escs.disarm().unwrap();
        assert!(!escs.is_ready());
        assert!(recorders.iter().all(|r| r.last() == Some(1000)));
        assert_eq!(escs.write(1, 80.0), Err(ActuationError::NotArmed));
    }

    #[test]
    fn test_channel_failure() {
        let (recorders, outputs) = recorders();
        let mut escs = ESCs::new(outputs, &motors_config());
        *recorders[2].fail.lock().unwrap() = true;
        let expected = ActuationError::Channel(2, pwm::Error("gpio".to_owned()));
        assert_eq!(escs.disarm(), Err(expected));
        // remaining channels still written
        assert_eq!(recorders[3].last(), Some(1000));
    }

    #[test]
    fn test_calibrate() {
        let (recorders, outputs) = recorders();
        let mut escs = ESCs::new(outputs, &motors_config());
        let mut held = Vec::new();
        escs.calibrate(|micros| {
            assert!(recorders.iter().all(|r| r.last() == Some(micros)));
            held.push(micros);
        })
        .unwrap();
        assert_eq!(held, vec![2000, 1000]);
        assert!(recorders.iter().all(|r| r.last() == Some(1000)));
        assert!(!escs.is_ready());
    }

    #[test]
    fn test_drop_disarms() {
        let (recorders, outputs) = recorders();
        let mut escs = ESCs::new(outputs, &motors_config());
        let now = Instant::now();
        escs.arm(now).unwrap();
        escs.poll_arming(now + Duration::from_secs(3)).unwrap();
        escs.write_all(&Motors([60.0; 4])).unwrap();
        drop(escs);
        assert!(recorders.iter().all(|r| r.last() == Some(1000)));
    }
}
