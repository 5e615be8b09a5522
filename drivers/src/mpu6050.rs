use embedded_hal::i2c::{Error as _, I2c};
use nalgebra::Vector3;
use pi_flight::{
    config::Model,
    hal::imu::{AccelGyro, Readout},
    imu::SensorFault,
};

pub const DEFAULT_ADDRESS: u8 = 0x68;
pub const NUM_MEASUREMENT_REGS: usize = 14;

#[derive(Copy, Clone)]
#[repr(u8)]
enum Register {
    SampleRateDivider = 0x19,
    Config = 0x1A,
    GyroConfig = 0x1B,
    AccelerometerConfig = 0x1C,
    AccelerometerXHigh = 0x3B,
    PowerManagement1 = 0x6B,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Sensitive {
    /// LSB per g
    accelerometer: f32,
    /// LSB per degree per second
    gyroscope: f32,
    accelerometer_config: u8,
    gyro_config: u8,
    sample_rate_divider: u8,
    dlpf: u8,
}

fn sensitive(model: Model) -> Sensitive {
    match model {
        // +/-2g, +/-250dps, DLPF off
        Model::Mpu6050 => Sensitive {
            accelerometer: 16384.0,
            gyroscope: 131.0,
            accelerometer_config: 0,
            gyro_config: 0,
            sample_rate_divider: 9,
            dlpf: 0,
        },
        // +/-16g, +/-2000dps, 1kHz / (1 + 7), 5Hz bandwidth
        Model::Mpu6500 => Sensitive {
            accelerometer: 2048.0,
            gyroscope: 16.4,
            accelerometer_config: 0x18,
            gyro_config: 0x18,
            sample_rate_divider: 7,
            dlpf: 6,
        },
    }
}

fn axes(bytes: &[u8]) -> [i16; 3] {
    let value = |i: usize| i16::from_be_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
    [value(0), value(1), value(2)]
}

/// MPU-6050 or MPU-6500 over I2C, polled
pub struct Mpu6050<I2C> {
    i2c: I2C,
    address: u8,
    sensitive: Sensitive,
}

impl<I2C: I2c> Mpu6050<I2C> {
    pub fn new(i2c: I2C, address: u8, model: Model) -> Self {
        Self { i2c, address, sensitive: sensitive(model) }
    }

    fn write_register(&mut self, register: Register, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[register as u8, value])
    }

    /// Wakes the chip and programs rate, filter and full scale ranges
    pub fn init(&mut self) -> Result<(), I2C::Error> {
        self.write_register(Register::PowerManagement1, 0)?;
        self.write_register(Register::SampleRateDivider, self.sensitive.sample_rate_divider)?;
        self.write_register(Register::Config, self.sensitive.dlpf)?;
        self.write_register(Register::GyroConfig, self.sensitive.gyro_config)?;
        self.write_register(Register::AccelerometerConfig, self.sensitive.accelerometer_config)?;
        debug!("MPU6050 at 0x{:x} initialized", self.address);
        Ok(())
    }

    /// Accelerometer, temperature and gyroscope registers in one burst
    pub fn read_raw(&mut self) -> Result<[u8; NUM_MEASUREMENT_REGS], I2C::Error> {
        let mut bytes = [0u8; NUM_MEASUREMENT_REGS];
        self.i2c.write_read(self.address, &[Register::AccelerometerXHigh as u8], &mut bytes)?;
        Ok(bytes)
    }

    pub fn convert(&self, bytes: &[u8; NUM_MEASUREMENT_REGS]) -> Readout {
        let acceleration = axes(&bytes[..6]);
        let gyro = axes(&bytes[8..]);
        let saturated =
            acceleration.iter().chain(gyro.iter()).any(|&v| v == i16::MIN || v == i16::MAX);
        let scale = |raw: [i16; 3], sensitive: f32| {
            Vector3::new(raw[0] as f32, raw[1] as f32, raw[2] as f32) / sensitive
        };
        Readout {
            acceleration: scale(acceleration, self.sensitive.accelerometer),
            gyro: scale(gyro, self.sensitive.gyroscope),
            saturated,
        }
    }

    pub fn free(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> AccelGyro for Mpu6050<I2C> {
    fn read(&mut self) -> Result<Readout, SensorFault> {
        let bytes = self.read_raw().map_err(|e| SensorFault::Bus(format!("{:?}", e.kind())))?;
        Ok(self.convert(&bytes))
    }
}

#[cfg(test)]
mod test {
    use std::convert::Infallible;

    use embedded_hal::i2c::{ErrorType, I2c, Operation};
    use pi_flight::config::Model;
    use pi_flight::hal::imu::AccelGyro;

    use super::{Mpu6050, DEFAULT_ADDRESS};

    #[derive(Default)]
    struct Mock {
        writes: Vec<(u8, Vec<u8>)>,
        registers: [u8; 14],
    }

    impl ErrorType for Mock {
        type Error = Infallible;
    }

    impl I2c for Mock {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Infallible> {
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                    Operation::Read(buffer) => {
                        let len = buffer.len();
                        buffer.copy_from_slice(&self.registers[..len])
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_init() {
        let mut mpu = Mpu6050::new(Mock::default(), DEFAULT_ADDRESS, Model::Mpu6500);
        mpu.init().unwrap();
        let writes = mpu.free().writes;
        let expected = vec![
            (0x68, vec![0x6B, 0]),
            (0x68, vec![0x19, 7]),
            (0x68, vec![0x1A, 6]),
            (0x68, vec![0x1B, 0x18]),
            (0x68, vec![0x1C, 0x18]),
        ];
        assert_eq!(writes, expected);

        let mut mpu = Mpu6050::new(Mock::default(), DEFAULT_ADDRESS, Model::Mpu6050);
        mpu.init().unwrap();
        let writes = mpu.free().writes;
        let expected = vec![
            (0x68, vec![0x6B, 0]),
            (0x68, vec![0x19, 9]),
            (0x68, vec![0x1A, 0]),
            (0x68, vec![0x1B, 0]),
            (0x68, vec![0x1C, 0]),
        ];
        assert_eq!(writes, expected);
    }

    #[test]
    fn test_read() {
        let mut mock = Mock::default();
        // ax 0, ay -8192, az 16384, temperature, gx 131, gy -262, gz 0x7fff
        mock.registers = [0, 0, 0xE0, 0, 0x40, 0, 0x12, 0x34, 0, 131, 0xFE, 0xFA, 0x7F, 0xFF];
        let mut mpu = Mpu6050::new(mock, DEFAULT_ADDRESS, Model::Mpu6050);
        let readout = mpu.read().unwrap();
        assert_eq!(readout.acceleration.as_slice(), &[0.0, -0.5, 1.0]);
        assert_eq!(readout.gyro.x, 1.0);
        assert_eq!(readout.gyro.y, -2.0);
        assert!(readout.saturated);
        assert_eq!(mpu.free().writes, vec![(0x68, vec![0x3B])]);
    }
}
