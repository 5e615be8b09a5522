use std::sync::Arc;
use std::time::Instant;

use log::Level;

use crate::{config, fcs::Telemetry, sync::Slot};

pub type TelemetrySlot = Slot<Telemetry>;

/// Publishes the latest record for readers and logs every n-th one.
///
/// Never blocks the control loop, a busy slot or a failed serialization
/// only drops that record.
pub struct TelemetrySink {
    level: Level,
    interval: usize,
    count: usize,
    latest: Arc<TelemetrySlot>,
}

impl TelemetrySink {
    pub fn new(config: &config::Logging, latest: Arc<TelemetrySlot>) -> Self {
        Self { level: config.telemetry_level, interval: config.telemetry_interval.max(1), count: 0, latest }
    }

    pub fn record(&mut self, telemetry: &Telemetry, now: Instant) {
        self.latest.try_write(*telemetry, now);
        self.count += 1;
        if self.count % self.interval != 0 || !log_enabled!(self.level) {
            return;
        }
        if let Ok(json) = serde_json::to_string(telemetry) {
            log!(self.level, "{}", json);
        }
    }
}

mod test {
    #[test]
    fn test_record_latest() {
        use std::sync::Arc;
        use std::time::Instant;

        use super::{TelemetrySink, TelemetrySlot};
        use crate::config::Logging;
        use crate::fcs::{FlightMode, Telemetry};

        let latest = Arc::new(TelemetrySlot::default());
        let mut sink = TelemetrySink::new(&Logging::default(), latest.clone());
        let telemetry = Telemetry { mode: FlightMode::Armed, throttle: 42.0, ..Default::default() };
        sink.record(&telemetry, Instant::now());
        assert_eq!(latest.read(), telemetry);
    }
}
