use std::time::Duration;

use pi_flight::hal::pwm::{self, PulseOutput, PWM};
use rppal::gpio::{self, Gpio, OutputPin};
use rppal::i2c::{self, I2c};

/// Software PWM on a GPIO pin, one ESC per pin
pub struct GpioPulse {
    pin: OutputPin,
    period: Duration,
}

impl GpioPulse {
    pub fn new(gpio: &Gpio, bcm: u8, frequency: u16) -> Result<Self, gpio::Error> {
        let pin = gpio.get(bcm)?.into_output_low();
        let period = Duration::from_secs(1) / frequency.max(1) as u32;
        Ok(Self { pin, period })
    }
}

impl PulseOutput for GpioPulse {
    fn set_pulse_width(&mut self, micros: u16) -> Result<(), pwm::Error> {
        let pulse_width = Duration::from_micros(micros as u64);
        self.pin.set_pwm(self.period, pulse_width).map_err(|e| pwm::Error(e.to_string()))
    }
}

/// Front-left, front-right, rear-left, rear-right
pub fn motor_outputs(pins: [u8; 4], frequency: u16) -> Result<[PWM; 4], gpio::Error> {
    let gpio = Gpio::new()?;
    let [fl, fr, rl, rr] = pins;
    info!("Motors on GPIO {} {} {} {} at {}Hz", fl, fr, rl, rr, frequency);
    let outputs: [PWM; 4] = [
        Box::new(GpioPulse::new(&gpio, fl, frequency)?),
        Box::new(GpioPulse::new(&gpio, fr, frequency)?),
        Box::new(GpioPulse::new(&gpio, rl, frequency)?),
        Box::new(GpioPulse::new(&gpio, rr, frequency)?),
    ];
    Ok(outputs)
}

/// Kernel I2C timeout in milliseconds, never zero
fn timeout_millis(timeout: Duration) -> u32 {
    timeout.as_millis().clamp(1, u32::MAX as u128) as u32
}

/// Opens the bus with a transaction timeout so a hung bus fails the read
pub fn open_i2c(bus: u8, timeout: Duration) -> Result<I2c, i2c::Error> {
    let i2c = I2c::with_bus(bus)?;
    i2c.set_timeout(timeout_millis(timeout))?;
    debug!("I2C bus {} with {:?} timeout", bus, timeout);
    Ok(i2c)
}

mod test {
    #[test]
    fn test_timeout_millis() {
        use std::time::Duration;

        use super::timeout_millis;

        assert_eq!(timeout_millis(Duration::from_millis(5)), 5);
        assert_eq!(timeout_millis(Duration::from_micros(300)), 1);
        assert_eq!(timeout_millis(Duration::ZERO), 1);
    }
}
