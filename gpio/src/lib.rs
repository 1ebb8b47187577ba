pub mod delay;
pub mod gpiod;
pub mod lcd;

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// Identifies a single GPIO line by the bank (port, GPIO chip) it belongs to and its index within
/// that bank.
///
/// Written as `bank:index` when displayed or parsed. A bare index is parsed as a line of bank 0.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PinRef {
    pub bank: usize,
    pub index: usize,
}

impl PinRef {
    pub const fn new(bank: usize, index: usize) -> Self {
        PinRef { bank, index }
    }
}

impl Display for PinRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.bank, self.index)
    }
}

impl FromStr for PinRef {
    type Err = GpioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| GpioError::Other(format!("parsing pin reference `{}` failed", s)))
        };

        match s.split_once(':') {
            Some((bank, index)) => Ok(PinRef::new(parse(bank)?, parse(index)?)),
            None => Ok(PinRef::new(0, parse(s)?)),
        }
    }
}

/// Specifies the bias of the GPIO pin.
///
/// You can use this to enable pull-up or pull-down resistors.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioBias {
    #[default] None,
    PullUp,
    PullDown,
}

/// Specifies the drive mode of the GPIO pin.
///
/// By default, the drive mode is push-pull, which drives the pin high or low with low impedance.
/// There's also open-drain and open-source modes, that leave the pin floating when the output is high or low, respectively.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioDriveMode {
    /// GPIO pin is driven high or low with low impedance.
    #[default] PushPull,
    /// GPIO pin is driven low or left floating when high.
    OpenDrain,
    /// GPIO pin is driven high or left floating when low.
    OpenSource,
}

/// The minimal capability a platform has to provide to drive output-only peripherals.
///
/// Pins are addressed by [PinRef]. Any platform-specific initialization (opening devices, enabling
/// clocks) happens when the implementation is constructed, before the first call to any of these.
pub trait GpioPlatform: Debug {
    /// Configures the pin as a digital output with the given bias and drive mode.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the pin does not exist on this platform.
    /// - `GpioError::AlreadyInUse` if the pin was already configured.
    fn configure_output(
        &mut self,
        pin: PinRef,
        bias: GpioBias,
        drive: GpioDriveMode,
    ) -> GpioResult<()>;

    /// Drives a previously configured output pin to the given level.
    fn set_output(&mut self, pin: PinRef, level: bool) -> GpioResult<()>;
}

impl<T: GpioPlatform + ?Sized> GpioPlatform for &mut T {
    fn configure_output(
        &mut self,
        pin: PinRef,
        bias: GpioBias,
        drive: GpioDriveMode,
    ) -> GpioResult<()> {
        (**self).configure_output(pin, bias, drive)
    }

    fn set_output(&mut self, pin: PinRef, level: bool) -> GpioResult<()> {
        (**self).set_output(pin, level)
    }
}
