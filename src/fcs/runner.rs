use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::FlightController;
use crate::telemetry::TelemetrySink;

/// Overrun warnings are emitted at most once per this many overruns
const OVERRUN_LOG_INTERVAL: usize = 100;

/// Fixed rate driver for the flight controller
pub struct Runner {
    period: Duration,
    stop: Arc<AtomicBool>,
    sink: TelemetrySink,
    overruns: usize,
}

impl Runner {
    pub fn new(rate: u16, stop: Arc<AtomicBool>, sink: TelemetrySink) -> Self {
        let period = Duration::from_secs(1) / rate.max(1) as u32;
        Self { period, stop, sink, overruns: 0 }
    }

    pub fn overruns(&self) -> usize {
        self.overruns
    }

    /// Ticks until the stop flag is raised, then shuts the controller down
    pub fn run(&mut self, controller: &mut FlightController) {
        info!("Control loop running every {:?}", self.period);
        let mut deadline = Instant::now();
        while !self.stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            let telemetry = controller.update(now);
            self.sink.record(&telemetry, now);

            deadline += self.period;
            let finished = Instant::now();
            if finished < deadline {
                thread::sleep(deadline - finished);
                continue;
            }
            if self.overruns % OVERRUN_LOG_INTERVAL == 0 {
                warn!("Control tick overran by {:?}", finished - deadline);
            }
            self.overruns += 1;
            deadline = finished;
        }
        controller.shutdown();
    }
}
