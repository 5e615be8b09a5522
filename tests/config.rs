use pi_flight::config::{self, ControllerType, Model};

#[test]
fn bundled_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/drone.yaml");
    let config = config::load(path).unwrap();
    assert_eq!(config.controller.kind, ControllerType::Xbox);
    assert_eq!(config.imu.model, Model::Mpu6050);
    assert_eq!(config.imu.address, 0x68);
    assert_eq!(config.control_loop.rate, 100);
    assert_eq!(config.motors.pins, [17, 18, 27, 22]);
}

#[test]
fn bundled_calibration_is_valid() {
    use pi_flight::imu::CalibrationData;

    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/calibration.json");
    assert_eq!(CalibrationData::load(path).unwrap(), CalibrationData::default());
}
