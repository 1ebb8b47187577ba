use crate::demos::DemoKind;
use eyre::WrapErr;
use lcd1602_gpio::PinRef;
use lcd1602_gpio::lcd::hd44780::driver::{DisplayConfig, LcdConfig, PinConfig, TimingConfig};
use serde::{Deserialize, Serialize};
use std::env::{var, var_os};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SettingsError {
    #[error("unknown backend `{0}`, expected `gpiod` or `sim`")]
    UnknownBackend(String),
    #[error("unknown demo `{0}`, expected `basic`, `custom_char`, `scrolling` or `animation`")]
    UnknownDemo(String),
    #[error("expected 4 data pins, got {0}")]
    DataPinCount(usize),
}

/// Where the display is driven.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Backend {
    /// Linux GPIO character devices.
    Gpiod,
    /// The simulated controller, printing the screen to the log.
    #[default]
    Sim,
}

impl FromStr for Backend {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gpiod" => Ok(Backend::Gpiod),
            "sim" => Ok(Backend::Sim),
            other => Err(SettingsError::UnknownBackend(other.to_string())),
        }
    }
}

/// Timing as stored in the config file, in microseconds.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct TimingMicros {
    pub power_on: u64,
    pub enable_pulse: u64,
    pub command: u64,
    pub clear: u64,
}

impl Default for TimingMicros {
    fn default() -> Self {
        let timing = TimingConfig::default();
        TimingMicros {
            power_on: timing.power_on_delay.as_micros() as u64,
            enable_pulse: timing.enable_pulse.as_micros() as u64,
            command: timing.command_delay.as_micros() as u64,
            clear: timing.clear_delay.as_micros() as u64,
        }
    }
}

impl From<&TimingMicros> for TimingConfig {
    fn from(timing: &TimingMicros) -> Self {
        TimingConfig {
            power_on_delay: Duration::from_micros(timing.power_on),
            enable_pulse: Duration::from_micros(timing.enable_pulse),
            command_delay: Duration::from_micros(timing.command),
            clear_delay: Duration::from_micros(timing.clear),
        }
    }
}

/// Display flags as stored in the config file.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct DisplayFlags {
    pub cursor_on: bool,
    pub cursor_blink: bool,
    pub display_on: bool,
    pub two_lines: bool,
    pub big_font: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        let display = DisplayConfig::default();
        DisplayFlags {
            cursor_on: display.cursor_on,
            cursor_blink: display.cursor_blink,
            display_on: display.display_on,
            two_lines: display.two_lines,
            big_font: display.big_font,
        }
    }
}

impl From<&DisplayFlags> for DisplayConfig {
    fn from(flags: &DisplayFlags) -> Self {
        DisplayConfig {
            cursor_on: flags.cursor_on,
            cursor_blink: flags.cursor_blink,
            display_on: flags.display_on,
            two_lines: flags.two_lines,
            big_font: flags.big_font,
        }
    }
}

/// Optional JSON file with the timing and the display flags, pointed to by `LCD_CONFIG_FILE`.
#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub timing_us: TimingMicros,
    pub display: DisplayFlags,
}

impl FileConfig {
    pub fn try_load() -> eyre::Result<Option<Self>> {
        let Some(path) = var_os("LCD_CONFIG_FILE") else {
            return Ok(None);
        };
        let path = Path::new(&path);
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("opening {}", path.display()))?;
        let reader = std::io::BufReader::new(file);
        let config = serde_json::from_reader(reader)
            .wrap_err_with(|| format!("parsing {}", path.display()))?;
        Ok(Some(config))
    }
}

/// Everything the demo needs, read from the environment (and `.env`).
#[derive(Debug)]
pub struct Settings {
    pub backend: Backend,
    pub demo: DemoKind,
    pub frames: usize,
    pub lcd: LcdConfig,
}

impl Settings {
    /// The wiring of the reference board: RS on PB3, E on PA10, D4..D7 on PB10, PB4, PB5, PA15,
    /// with port A as bank 0 and port B as bank 1.
    pub const DEFAULT_PINS: PinConfig = PinConfig {
        rs: PinRef::new(1, 3),
        e: PinRef::new(0, 10),
        data: [
            PinRef::new(1, 10),
            PinRef::new(1, 4),
            PinRef::new(1, 5),
            PinRef::new(0, 15),
        ],
    };

    pub fn from_env() -> eyre::Result<Self> {
        let backend = optional_var("LCD_BACKEND")
            .map(|s| s.parse::<Backend>())
            .transpose()?
            .unwrap_or_default();
        let demo = optional_var("LCD_DEMO")
            .map(|s| s.parse::<DemoKind>())
            .transpose()?
            .unwrap_or_default();
        let frames = optional_var("LCD_FRAMES")
            .map(|s| s.trim().parse::<usize>())
            .transpose()
            .wrap_err("parsing LCD_FRAMES")?
            .unwrap_or(20);

        let mut pins = Self::DEFAULT_PINS;
        if let Some(rs) = optional_var("LCD_PIN_RS") {
            pins.rs = rs.parse()?;
        }
        if let Some(e) = optional_var("LCD_PIN_E") {
            pins.e = e.parse()?;
        }
        if let Some(data) = optional_var("LCD_PINS_DATA") {
            pins.data = parse_pin_bus(&data)?;
        }

        let mut lcd = LcdConfig::new(pins);
        if let Some(file) = FileConfig::try_load()? {
            lcd = lcd
                .with_timing((&file.timing_us).into())
                .with_display((&file.display).into());
        }

        Ok(Settings {
            backend,
            demo,
            frames,
            lcd,
        })
    }

    /// Number of GPIO chips to open, so every bank used by the pins exists.
    pub fn banks(&self) -> usize {
        self.lcd.pins.iter().map(|pin| pin.bank + 1).max().unwrap_or(1)
    }
}

fn optional_var(name: &str) -> Option<String> {
    var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parse_pin_bus(pin_str: &str) -> eyre::Result<[PinRef; 4]> {
    let pins = pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<PinRef>, _>>()?;
    let count = pins.len();
    let bus: [PinRef; 4] = pins
        .try_into()
        .map_err(|_| SettingsError::DataPinCount(count))?;
    Ok(bus)
}
