use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn lenient_axis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().map(|v| v as f32).filter(|v| v.is_finite()).unwrap_or_default())
}

fn lenient_button<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let pressed = match Value::deserialize(deserializer)? {
        Value::Bool(pressed) => pressed,
        // gamepad clients report buttons as 0/1
        Value::Number(number) => number.as_f64().map(|v| v != 0.0).unwrap_or(false),
        _ => false,
    };
    Ok(pressed)
}

/// Controller snapshot as posted by the gamepad or web client.
///
/// Missing or malformed fields fall back to neutral and not pressed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawControl {
    #[serde(deserialize_with = "lenient_axis")]
    pub left_x: f32,
    #[serde(deserialize_with = "lenient_axis")]
    pub left_y: f32,
    #[serde(deserialize_with = "lenient_axis")]
    pub right_x: f32,
    #[serde(deserialize_with = "lenient_axis")]
    pub right_y: f32,
    #[serde(deserialize_with = "lenient_button")]
    pub start_pressed: bool,
    #[serde(deserialize_with = "lenient_button")]
    pub back_pressed: bool,
    #[serde(deserialize_with = "lenient_button")]
    pub a_pressed: bool,
    #[serde(deserialize_with = "lenient_button")]
    pub b_pressed: bool,
    #[serde(deserialize_with = "lenient_button")]
    pub x_pressed: bool,
    #[serde(deserialize_with = "lenient_button")]
    pub y_pressed: bool,
    #[serde(deserialize_with = "lenient_button")]
    pub lb_pressed: bool,
    #[serde(deserialize_with = "lenient_button")]
    pub rb_pressed: bool,
    #[serde(deserialize_with = "lenient_axis")]
    pub lt_value: f32,
    #[serde(deserialize_with = "lenient_axis")]
    pub rt_value: f32,
}

mod test {
    #[test]
    fn test_deserialize_full() {
        use super::RawControl;

        let json = r#"{
            "left_x": 0.5, "left_y": -0.25, "right_x": 1.0, "right_y": -1.0,
            "start_pressed": true, "back_pressed": false,
            "a_pressed": false, "b_pressed": true, "x_pressed": false, "y_pressed": false,
            "lb_pressed": false, "rb_pressed": true, "lt_value": 0.0, "rt_value": 0.75
        }"#;
        let control: RawControl = serde_json::from_str(json).unwrap();
        let expected = RawControl {
            left_x: 0.5,
            left_y: -0.25,
            right_x: 1.0,
            right_y: -1.0,
            start_pressed: true,
            b_pressed: true,
            rb_pressed: true,
            rt_value: 0.75,
            ..Default::default()
        };
        assert_eq!(expected, control);
    }

    #[test]
    fn test_deserialize_malformed_fields() {
        use super::RawControl;

        let json = r#"{"left_x": "fast", "left_y": null, "start_pressed": 1, "back_pressed": "yes",
                       "unknown": 42}"#;
        let control: RawControl = serde_json::from_str(json).unwrap();
        let expected = RawControl { start_pressed: true, ..Default::default() };
        assert_eq!(expected, control);
    }
}
