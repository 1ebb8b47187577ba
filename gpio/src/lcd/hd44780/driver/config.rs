use crate::PinRef;
use log::warn;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// The pins the HD44780 is wired to. R/W is expected to be tied to GND, as the driver never reads.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PinConfig {
    /// Register select: low for commands, high for character data.
    pub rs: PinRef,
    /// Enable, the controller latches the data lines on its falling edge.
    pub e: PinRef,
    /// Data lines D4..D7. `data[0]` carries bit 0 of each nibble.
    pub data: [PinRef; 4],
}

impl PinConfig {
    /// All the pins used by the bus: RS, E, then D4..D7.
    pub fn iter(&self) -> impl Iterator<Item = PinRef> + '_ {
        [self.rs, self.e].into_iter().chain(self.data)
    }
}

impl Display for PinConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RS: {}, E: {}, Data: [{}, {}, {}, {}]",
            self.rs, self.e, self.data[0], self.data[1], self.data[2], self.data[3]
        )
    }
}

/// Delays used by the driver. The bus is open-loop, so these have to cover the worst case
/// execution time of the controller.
///
/// Nothing here is rejected, but values under the datasheet minimums are logged by
/// [LcdConfig::check] and will likely garble the display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimingConfig {
    /// Wait after configuring the pins, before the first nibble. Millisecond granularity.
    pub power_on_delay: Duration,
    /// How long E is held high.
    pub enable_pulse: Duration,
    /// Wait after every byte transfer.
    pub command_delay: Duration,
    /// Additional wait after the clear display command.
    pub clear_delay: Duration,
}

impl TimingConfig {
    pub const MIN_POWER_ON_DELAY: Duration = Duration::from_millis(40);
    pub const MIN_ENABLE_PULSE: Duration = Duration::from_nanos(450);
    pub const MIN_COMMAND_DELAY: Duration = Duration::from_micros(37);
    pub const MIN_CLEAR_DELAY: Duration = Duration::from_micros(1520);
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            power_on_delay: Duration::from_millis(50),
            enable_pulse: Duration::from_micros(1),
            command_delay: Duration::from_micros(50),
            clear_delay: Duration::from_millis(2),
        }
    }
}

/// Display feature flags.
///
/// Note that the 5x10 font only works in one-line mode. This is a hardware limitation, the
/// driver only warns about it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DisplayConfig {
    pub cursor_on: bool,
    pub cursor_blink: bool,
    pub display_on: bool,
    pub two_lines: bool,
    /// 5x10 dots font instead of 5x8.
    pub big_font: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            cursor_on: false,
            cursor_blink: false,
            display_on: true,
            two_lines: true,
            big_font: false,
        }
    }
}

/// The complete configuration of a display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LcdConfig {
    pub pins: PinConfig,
    pub timing: TimingConfig,
    pub display: DisplayConfig,
}

impl LcdConfig {
    /// Creates a configuration with the given pins and default timing and display settings.
    pub fn new(pins: PinConfig) -> Self {
        LcdConfig {
            pins,
            timing: TimingConfig::default(),
            display: DisplayConfig::default(),
        }
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    /// Logs every setting that violates the HD44780 datasheet. Returns the number of warnings.
    pub fn check(&self) -> usize {
        let mut warnings = 0;
        let mut warn_if = |condition: bool, message: &str| {
            if condition {
                warn!("{}", message);
                warnings += 1;
            }
        };

        warn_if(
            self.display.big_font && self.display.two_lines,
            "5x10 font is only supported in one-line mode",
        );
        warn_if(
            self.timing.power_on_delay < TimingConfig::MIN_POWER_ON_DELAY,
            "power-on delay is shorter than 40 ms",
        );
        warn_if(
            self.timing.enable_pulse < TimingConfig::MIN_ENABLE_PULSE,
            "enable pulse is shorter than 450 ns",
        );
        warn_if(
            self.timing.command_delay < TimingConfig::MIN_COMMAND_DELAY,
            "command delay is shorter than 37 us",
        );
        warn_if(
            self.timing.clear_delay < TimingConfig::MIN_CLEAR_DELAY,
            "clear delay is shorter than 1.52 ms",
        );

        let pins = self.pins.iter().collect::<Vec<_>>();
        let mut unique = pins.clone();
        unique.sort();
        unique.dedup();
        warn_if(unique.len() != pins.len(), "the same pin is used more than once");

        warnings
    }
}
