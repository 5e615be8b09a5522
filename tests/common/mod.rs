#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use nalgebra::Vector3;
use pi_flight::config::Config;
use pi_flight::fcs::FlightController;
use pi_flight::hal::imu::{AccelGyro, Readout};
use pi_flight::hal::pwm::{self, PulseOutput, PWM};
use pi_flight::hal::sensors::Altimeter;
use pi_flight::imu::SensorFault;
use pi_flight::sync::ControlSlot;
use pi_flight::types::control::RawControl;

pub const CONFIG: &str = "
motors:
  pins: [17, 18, 27, 22]
  min-pulse-width: 1000
  max-pulse-width: 2000
  arm-pulse-width: 1000
pids:
  roll: {kp: 4.0, ki: 0.05, kd: 0.0, limit: 400}
  pitch: {kp: 4.0, ki: 0.05, kd: 0.0, limit: 400}
  yaw: {kp: 1.0, ki: 0.0, kd: 0.0, limit: 400}
controller:
  type: mobile
  deadzone: 0.0
envelope:
  max-roll-angle: 30
  max-pitch-angle: 30
  max-yaw-rate: 180
  max-altitude: 10
  takeoff-throttle: 10
  hover-throttle: 50
imu:
  model: mpu6050
  calibration-file: calibration.json
";

/// Level and still unless told otherwise
#[derive(Clone)]
pub struct FakeImu(pub Arc<Mutex<Result<Readout, SensorFault>>>);

impl Default for FakeImu {
    fn default() -> Self {
        let level = Readout::new(Vector3::new(0.0, 0.0, 1.0), Vector3::zeros());
        Self(Arc::new(Mutex::new(Ok(level))))
    }
}

impl FakeImu {
    pub fn set(&self, result: Result<Readout, SensorFault>) {
        *self.0.lock().unwrap() = result;
    }
}

impl AccelGyro for FakeImu {
    fn read(&mut self) -> Result<Readout, SensorFault> {
        self.0.lock().unwrap().clone()
    }
}

/// Height reported to the controller, `None` for no estimate
#[derive(Clone, Default)]
pub struct FakeAltimeter(pub Arc<Mutex<Option<f32>>>);

impl FakeAltimeter {
    pub fn set(&self, altitude: Option<f32>) {
        *self.0.lock().unwrap() = altitude;
    }
}

impl Altimeter for FakeAltimeter {
    fn altitude(&mut self) -> Option<f32> {
        *self.0.lock().unwrap()
    }
}

/// Pulse widths written to one ESC channel, in order
#[derive(Clone, Default)]
pub struct FakeEsc(pub Arc<Mutex<Vec<u16>>>);

impl FakeEsc {
    pub fn history(&self) -> Vec<u16> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> u16 {
        self.history().last().copied().unwrap_or(0)
    }
}

impl PulseOutput for FakeEsc {
    fn set_pulse_width(&mut self, micros: u16) -> Result<(), pwm::Error> {
        self.0.lock().unwrap().push(micros);
        Ok(())
    }
}

pub struct Vehicle {
    pub controller: FlightController,
    pub imu: FakeImu,
    pub escs: [FakeEsc; 4],
    pub control: Arc<ControlSlot>,
    pub now: Instant,
}

impl Vehicle {
    pub fn new() -> Self {
        let config: Config = CONFIG.parse().unwrap();
        let imu = FakeImu::default();
        let escs: [FakeEsc; 4] = Default::default();
        let outputs = escs.clone().map(|esc| Box::new(esc) as PWM);
        let control = Arc::new(ControlSlot::default());
        let controller = FlightController::new(
            &config,
            Default::default(),
            Box::new(imu.clone()),
            outputs,
            control.clone(),
        );
        Self { controller, imu, escs, control, now: Instant::now() }
    }

    pub fn with_altimeter(self, altimeter: FakeAltimeter) -> Self {
        let Self { controller, imu, escs, control, now } = self;
        let controller = controller.with_altimeter(Box::new(altimeter));
        Self { controller, imu, escs, control, now }
    }

    pub fn send(&self, raw: RawControl) {
        self.control.write(raw, self.now);
    }

    pub fn tick(&mut self, millis: u64) -> pi_flight::fcs::Telemetry {
        self.now += Duration::from_millis(millis);
        self.controller.update(self.now)
    }

    pub fn pulses(&self) -> Vec<u16> {
        self.escs.iter().map(|esc| esc.last()).collect()
    }
}

/// Accelerometer at rest for the given attitude in degrees, gyro rates in
/// degrees per second
pub fn readout(roll: f32, pitch: f32, rates: (f32, f32)) -> Readout {
    let (roll, pitch) = (roll.to_radians(), pitch.to_radians());
    let gravity = Vector3::new(-pitch.sin(), roll.sin() * pitch.cos(), roll.cos() * pitch.cos());
    Readout::new(gravity, Vector3::new(rates.0, rates.1, 0.0))
}

pub fn throttle(value: f32) -> RawControl {
    RawControl { left_y: value, ..Default::default() }
}

pub fn arm() -> RawControl {
    RawControl { start_pressed: true, ..Default::default() }
}
