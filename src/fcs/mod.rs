pub mod envelop;
pub mod mixer;
pub mod out;
pub mod pid;
pub mod runner;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use nalgebra::Vector3;

use crate::{
    config::Config,
    esc::{ActuationError, ESCs},
    hal::{pwm::PWM, sensors::Altimeter},
    imu::{self, AttitudeEstimate, CalibrationData, SensorFault},
    input::{Normalizer, PilotCommand},
    sync::{ControlSlot, StaleInputError},
    types::output::Motors,
};

pub use out::{FlightMode, Telemetry};
pub use runner::Runner;

/// Everything that sends the vehicle into failsafe
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    Sensor(SensorFault),
    Actuation(ActuationError),
    StaleInput(StaleInputError),
    EnvelopeBreach { roll: f32, pitch: f32 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "{}", e),
            Self::Actuation(e) => write!(f, "{}", e),
            Self::StaleInput(e) => write!(f, "{}", e),
            Self::EnvelopeBreach { roll, pitch } => {
                write!(f, "Attitude out of envelope, roll {:.1} pitch {:.1}", roll, pitch)
            }
        }
    }
}

impl std::error::Error for Fault {}

impl From<SensorFault> for Fault {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

impl From<ActuationError> for Fault {
    fn from(e: ActuationError) -> Self {
        Self::Actuation(e)
    }
}

impl From<StaleInputError> for Fault {
    fn from(e: StaleInputError) -> Self {
        Self::StaleInput(e)
    }
}

pub struct FlightController {
    imu: imu::IMU,
    escs: ESCs,
    control: Arc<ControlSlot>,
    altimeter: Option<Box<dyn Altimeter + Send>>,
    normalizer: Normalizer,
    envelop: envelop::Envelop,
    pids: pid::PIDs,
    stale_timeout: Duration,
    mode: FlightMode,
    arm_held: bool,
    last_tick: Option<Instant>,
}

impl FlightController {
    pub fn new(
        config: &Config,
        calibration: CalibrationData,
        sensor: imu::Sensor,
        outputs: [PWM; 4],
        control: Arc<ControlSlot>,
    ) -> Self {
        Self {
            imu: imu::IMU::new(sensor, calibration, &config.imu),
            escs: ESCs::new(outputs, &config.motors),
            control,
            altimeter: None,
            normalizer: Normalizer::new(&config.controller),
            envelop: envelop::Envelop::new(&config.envelope),
            pids: pid::PIDs::new(&config.pids),
            stale_timeout: config.controller.stale_timeout(),
            mode: FlightMode::Disarmed,
            arm_held: false,
            last_tick: None,
        }
    }

    pub fn with_altimeter(mut self, altimeter: Box<dyn Altimeter + Send>) -> Self {
        self.altimeter = Some(altimeter);
        self
    }

    pub fn mode(&self) -> FlightMode {
        self.mode
    }

    fn set_mode(&mut self, mode: FlightMode) {
        if self.mode == mode {
            return;
        }
        info!("Flight mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.pids.reset();
    }

    fn idle(&self, attitude: Option<AttitudeEstimate>, dt: f32) -> Telemetry {
        Telemetry { mode: self.mode, attitude, dt, ..Default::default() }
    }

    /// Rising edge of the arm button, refused unless on the ground and healthy
    fn try_arm(
        &mut self,
        now: Instant,
        command: Option<PilotCommand>,
        attitude: Option<&AttitudeEstimate>,
    ) -> Result<(), Fault> {
        let arm = command.map(|c| c.arm).unwrap_or(false);
        let edge = arm && !self.arm_held;
        self.arm_held = arm;
        if !edge {
            return Ok(());
        }
        let refused = match (command, attitude) {
            (_, None) => Some("sensor unhealthy"),
            (Some(c), _) if c.throttle() > 0.0 => Some("throttle not at minimum"),
            (_, Some(a)) if self.envelop.is_breached(a) => Some("vehicle not level"),
            _ => None,
        };
        if let Some(reason) = refused {
            warn!("Arming refused: {}", reason);
            return Ok(());
        }
        self.escs.arm(now)?;
        self.set_mode(FlightMode::Arming);
        Ok(())
    }

    fn tick(&mut self, now: Instant, dt: f32) -> Result<Telemetry, Fault> {
        let sample = self.imu.sample(now);
        let input = self.control.read_within(now, self.stale_timeout);

        match self.mode {
            FlightMode::Failsafe => {
                self.escs.disarm()?;
                self.set_mode(FlightMode::Disarmed);
                return Ok(self.idle(sample.ok(), dt));
            }
            FlightMode::Disarmed => {
                self.escs.write_all(&Motors::default())?;
                if let Err(e) = &sample {
                    trace!("Disarmed with unhealthy sensor: {}", e);
                }
                let command = input.ok().map(|raw| self.normalizer.normalize(&raw));
                let attitude = sample.ok();
                self.try_arm(now, command, attitude.as_ref())?;
                return Ok(self.idle(attitude, dt));
            }
            FlightMode::Arming | FlightMode::Armed => (),
        }

        let attitude = sample?;
        let command = self.normalizer.normalize(&input?);
        self.arm_held = command.arm;
        if command.disarm {
            self.escs.disarm()?;
            self.set_mode(FlightMode::Disarmed);
            return Ok(self.idle(Some(attitude), dt));
        }
        if self.envelop.is_breached(&attitude) {
            return Err(Fault::EnvelopeBreach { roll: attitude.roll, pitch: attitude.pitch });
        }

        if self.mode == FlightMode::Arming {
            if self.escs.poll_arming(now)? {
                self.set_mode(FlightMode::Armed);
            }
            return Ok(self.idle(Some(attitude), dt));
        }

        let altitude = self.altimeter.as_mut().and_then(|a| a.altitude());
        let throttle = self.envelop.restrict_throttle(command.throttle(), altitude);
        let setpoint = self.envelop.setpoint(&command);
        let correction = if self.envelop.is_airborne(throttle) {
            let measured = Vector3::new(attitude.roll, attitude.pitch, attitude.yaw_rate);
            self.pids.next_control(setpoint, measured, dt)
        } else {
            // on the ground, nothing to stabilize and nothing to wind up
            self.pids.reset();
            Vector3::zeros()
        };
        let mixed = mixer::mix(throttle, correction.x, correction.y, correction.z);
        self.escs.write_all(&mixed.motors)?;
        Ok(Telemetry {
            mode: self.mode,
            attitude: Some(attitude),
            setpoint: setpoint.into(),
            throttle,
            motors: mixed.motors,
            saturated: mixed.saturated,
            dt,
        })
    }

    fn failsafe(&mut self, fault: Fault, dt: f32) -> Telemetry {
        error!("Failsafe: {}", fault);
        if let Err(e) = self.escs.disarm() {
            error!("{}", e);
        }
        self.set_mode(FlightMode::Failsafe);
        self.idle(None, dt)
    }

    /// One control tick, never fails. Faults zero the motors before anything
    /// else and leave the controller in failsafe.
    pub fn update(&mut self, now: Instant) -> Telemetry {
        let dt = match self.last_tick {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_tick = Some(now);
        match self.tick(now, dt) {
            Ok(telemetry) => telemetry,
            Err(fault) => self.failsafe(fault, dt),
        }
    }

    /// Final zero-motor write
    pub fn shutdown(&mut self) {
        info!("Shutting down flight controller");
        if let Err(e) = self.escs.disarm() {
            error!("{}", e);
        }
        self.set_mode(FlightMode::Disarmed);
    }
}
