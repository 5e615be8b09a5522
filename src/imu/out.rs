use std::time::Duration;

use serde::ser::SerializeStruct;

/// Fused attitude, degrees for roll and pitch, degrees per second for yaw
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AttitudeEstimate {
    pub roll: f32,
    pub pitch: f32,
    pub yaw_rate: f32,
    /// Since the sensor fusion unit started
    pub timestamp: Duration,
}

impl serde::Serialize for AttitudeEstimate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut struct_ = serializer.serialize_struct("AttitudeEstimate", 4)?;
        struct_.serialize_field("roll", &self.roll)?;
        struct_.serialize_field("pitch", &self.pitch)?;
        struct_.serialize_field("yaw-rate", &self.yaw_rate)?;
        struct_.serialize_field("timestamp", &(self.timestamp.as_micros() as u64))?;
        struct_.end()
    }
}

mod test {
    #[test]
    fn test_serialize() {
        use std::time::Duration;

        use serde_json::json;

        use super::AttitudeEstimate;

        let estimate = AttitudeEstimate {
            roll: 1.5,
            pitch: -2.0,
            yaw_rate: 10.0,
            timestamp: Duration::from_millis(20),
        };
        let expected = json!({"roll": 1.5, "pitch": -2.0, "yaw-rate": 10.0, "timestamp": 20000});
        assert_eq!(expected, serde_json::to_value(&estimate).unwrap());
    }
}
