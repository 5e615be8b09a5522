use crate::{imu::AttitudeEstimate, types::output::Motors};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlightMode {
    Disarmed,
    /// Arm pulse held on every ESC until the settle time elapses
    Arming,
    Armed,
    /// Motors forced to zero, becomes Disarmed on the next tick
    Failsafe,
}

impl Default for FlightMode {
    fn default() -> Self {
        Self::Disarmed
    }
}

/// Per tick snapshot
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Telemetry {
    pub mode: FlightMode,
    pub attitude: Option<AttitudeEstimate>,
    /// Roll and pitch angle, yaw rate
    pub setpoint: [f32; 3],
    pub throttle: f32,
    pub motors: Motors,
    pub saturated: bool,
    /// Seconds since the previous tick
    pub dt: f32,
}

mod test {
    #[test]
    fn test_serialize() {
        use serde_json::json;

        use super::{FlightMode, Telemetry};
        use crate::types::output::Motors;

        let telemetry = Telemetry {
            mode: FlightMode::Armed,
            setpoint: [10.0, -5.0, 0.0],
            throttle: 40.0,
            motors: Motors([35.0, 45.0, 35.0, 45.0]),
            dt: 0.5,
            ..Default::default()
        };
        let expected = json!({
            "mode": "armed",
            "attitude": null,
            "setpoint": [10.0, -5.0, 0.0],
            "throttle": 40.0,
            "motors": [35.0, 45.0, 35.0, 45.0],
            "saturated": false,
            "dt": 0.5
        });
        assert_eq!(expected, serde_json::to_value(&telemetry).unwrap());
    }
}
