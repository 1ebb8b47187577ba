//! [GpioPlatform] implementation on top of the Linux GPIO character devices, using the gpiod library.
//!
//! Each bank of a [PinRef] is one GPIO chip (`/dev/gpiochipN`, in the order given to the
//! constructor), and the index is the line offset within that chip.
use crate::{GpioBias, GpioDriveMode, GpioError, GpioPlatform, GpioResult, PinRef};
use log::debug;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::path::Path;

/// GpiodPlatform is a GPIO platform that uses the gpiod library to drive output lines.
pub struct GpiodPlatform {
    chips: Vec<gpiod::Chip>,
    lines: BTreeMap<PinRef, gpiod::Lines<gpiod::Output>>,
}

impl GpiodPlatform {
    pub fn new(chips: Vec<gpiod::Chip>) -> Self {
        Self {
            chips,
            lines: BTreeMap::new(),
        }
    }

    /// Opens the given GPIO chip devices. Bank `n` refers to the `n`-th path.
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> GpioResult<Self> {
        let chips = paths
            .iter()
            .map(|path| gpiod::Chip::new(path.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(chips))
    }

    /// Opens `/dev/gpiochip0` up to `/dev/gpiochip{banks - 1}`.
    pub fn open_banks(banks: usize) -> GpioResult<Self> {
        let paths = (0..banks)
            .map(|bank| format!("/dev/gpiochip{}", bank))
            .collect::<Vec<_>>();
        Self::open(&paths)
    }

    fn chip(&self, pin: PinRef) -> GpioResult<&gpiod::Chip> {
        let chip = self.chips.get(pin.bank).ok_or(GpioError::InvalidArgument)?;
        if pin.index >= chip.num_lines() as usize {
            return Err(GpioError::InvalidArgument);
        }
        Ok(chip)
    }
}

impl Debug for GpiodPlatform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names = self.chips.iter().map(|chip| chip.name()).collect::<Vec<_>>();
        write!(f, "GpiodPlatform({})", names.join(", "))
    }
}

impl From<GpioBias> for gpiod::Bias {
    fn from(bias: GpioBias) -> Self {
        match bias {
            GpioBias::None => gpiod::Bias::Disable,
            GpioBias::PullUp => gpiod::Bias::PullUp,
            GpioBias::PullDown => gpiod::Bias::PullDown,
        }
    }
}

impl From<GpioDriveMode> for gpiod::Drive {
    fn from(mode: GpioDriveMode) -> Self {
        match mode {
            GpioDriveMode::PushPull => gpiod::Drive::PushPull,
            GpioDriveMode::OpenDrain => gpiod::Drive::OpenDrain,
            GpioDriveMode::OpenSource => gpiod::Drive::OpenSource,
        }
    }
}

impl GpioPlatform for GpiodPlatform {
    fn configure_output(
        &mut self,
        pin: PinRef,
        bias: GpioBias,
        drive: GpioDriveMode,
    ) -> GpioResult<()> {
        if self.lines.contains_key(&pin) {
            return Err(GpioError::AlreadyInUse);
        }

        let line = self.chip(pin)?.request_lines(
            gpiod::Options::output([pin.index as u32])
                .consumer(env!("CARGO_PKG_NAME"))
                .bias(bias.into())
                .drive(drive.into()),
        )?;
        debug!("{:?}: line {} requested as output", self, pin);
        self.lines.insert(pin, line);
        Ok(())
    }

    fn set_output(&mut self, pin: PinRef, level: bool) -> GpioResult<()> {
        let line = self.lines.get(&pin).ok_or(GpioError::NotSupported)?;
        line.set_values([level])?;
        Ok(())
    }
}
