use core::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct Error(pub String);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for Error {}

/// A servo style output whose pulse width is held until changed
pub trait PulseOutput {
    fn set_pulse_width(&mut self, micros: u16) -> Result<(), Error>;
}

pub type PWM = Box<dyn PulseOutput + Send>;
