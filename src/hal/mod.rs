pub mod imu;
pub mod pwm;
pub mod sensors;
