use std::fmt;
use std::path::Path;

use nalgebra::Vector3;

use crate::hal::imu::Readout;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Io(String),
    Parse(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Unable to access calibration file: {}", e),
            Self::Parse(e) => write!(f, "Malformed calibration data: {}", e),
        }
    }
}

impl std::error::Error for Error {}

/// Offsets subtracted from every readout, g for the accelerometer and
/// degrees per second for the gyroscope
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationData {
    pub accel_offsets: [f32; 3],
    pub gyro_offsets: [f32; 3],
}

impl CalibrationData {
    pub fn accel(&self) -> Vector3<f32> {
        self.accel_offsets.into()
    }

    pub fn gyro(&self) -> Vector3<f32> {
        self.gyro_offsets.into()
    }

    pub fn apply(&self, readout: Readout) -> Readout {
        Readout {
            acceleration: readout.acceleration - self.accel(),
            gyro: readout.gyro - self.gyro(),
            saturated: readout.saturated,
        }
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        let data: Self = serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;
        let finite = data.accel_offsets.iter().chain(data.gyro_offsets.iter()).all(|v| v.is_finite());
        if !finite {
            return Err(Error::Parse("offsets must be finite".to_owned()));
        }
        Ok(data)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).map_err(|e| Error::Parse(e.to_string()))?;
        std::fs::write(path, text).map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))
    }
}

/// Averages readouts of a stationary, level device
#[derive(Default)]
pub struct Calibrator {
    acceleration: Vector3<f64>,
    gyro: Vector3<f64>,
    count: usize,
}

impl Calibrator {
    pub fn add(&mut self, readout: &Readout) {
        if !readout.is_finite() {
            return;
        }
        self.acceleration += readout.acceleration.cast::<f64>();
        self.gyro += readout.gyro.cast::<f64>();
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn finish(&self) -> Option<CalibrationData> {
        if self.count == 0 {
            return None;
        }
        let mut acceleration = (self.acceleration / self.count as f64).cast::<f32>();
        // gravity
        acceleration.z -= 1.0;
        let gyro = (self.gyro / self.count as f64).cast::<f32>();
        Some(CalibrationData { accel_offsets: acceleration.into(), gyro_offsets: gyro.into() })
    }
}

mod test {
    #[test]
    fn test_parse() {
        use super::{CalibrationData, Error};

        let text = r#"{"accel_offsets": [0.01, -0.02, 0.03], "gyro_offsets": [1.5, -0.5, 0.25]}"#;
        let data = CalibrationData::parse(text).unwrap();
        assert_eq!(data.accel_offsets, [0.01, -0.02, 0.03]);
        assert_eq!(data.gyro_offsets, [1.5, -0.5, 0.25]);

        let short = r#"{"accel_offsets": [0.01, -0.02], "gyro_offsets": [1.5, -0.5, 0.25]}"#;
        assert!(matches!(CalibrationData::parse(short), Err(Error::Parse(_))));
        let missing = r#"{"accel_offsets": [0.01, -0.02, 0.03]}"#;
        assert!(matches!(CalibrationData::parse(missing), Err(Error::Parse(_))));
    }

    #[test]
    fn test_apply() {
        use nalgebra::Vector3;

        use super::CalibrationData;
        use crate::hal::imu::Readout;

        let data = CalibrationData { accel_offsets: [0.5, 0.0, 0.0], gyro_offsets: [1.0, 2.0, 3.0] };
        let readout = Readout::new(Vector3::new(0.5, 0.0, 1.0), Vector3::new(1.0, 2.0, 3.0));
        let corrected = data.apply(readout);
        assert_eq!(corrected.acceleration, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(corrected.gyro, Vector3::zeros());
    }

    #[test]
    fn test_calibrator() {
        use nalgebra::Vector3;

        use super::Calibrator;
        use crate::hal::imu::Readout;

        let mut calibrator = Calibrator::default();
        assert_eq!(calibrator.finish(), None);
        calibrator.add(&Readout::new(Vector3::new(0.0, 0.5, 1.0), Vector3::new(1.0, 0.0, -2.0)));
        calibrator.add(&Readout::new(Vector3::new(0.5, 0.5, 1.0), Vector3::new(3.0, 0.0, -2.0)));
        calibrator.add(&Readout::new(Vector3::new(f32::NAN, 0.0, 0.0), Vector3::zeros()));
        assert_eq!(calibrator.count(), 2);
        let data = calibrator.finish().unwrap();
        assert_eq!(data.accel_offsets, [0.25, 0.5, 0.0]);
        assert_eq!(data.gyro_offsets, [2.0, 0.0, -2.0]);
    }

    #[test]
    fn test_save_and_load() {
        use super::{CalibrationData, Error};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        assert!(matches!(CalibrationData::load(&path), Err(Error::Io(_))));

        let data = CalibrationData { accel_offsets: [0.1, 0.2, -0.3], gyro_offsets: [-1.0, 0.0, 4.0] };
        data.save(&path).unwrap();
        assert_eq!(CalibrationData::load(&path).unwrap(), data);
    }
}
