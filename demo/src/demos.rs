use crate::config::SettingsError;
use lcd1602_gpio::lcd::hd44780::driver::{COLUMNS, GlyphPattern, HD44780Driver, LcdResult};
use std::str::FromStr;
use std::time::Duration;

pub const BELL: GlyphPattern = [
    0b00100, 0b01110, 0b01110, 0b01110, 0b11111, 0b00000, 0b00100, 0b00000,
];
pub const SPEAKER: GlyphPattern = [
    0b00001, 0b00011, 0b01111, 0b01111, 0b01111, 0b00011, 0b00001, 0b00000,
];

/// Battery outline: empty, quarter, half, full.
pub const BATTERY: [GlyphPattern; 4] = [
    [0b01110, 0b11011, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111, 0b11111],
    [0b01110, 0b11011, 0b10001, 0b10001, 0b10001, 0b11111, 0b11111, 0b11111],
    [0b01110, 0b11011, 0b10001, 0b10001, 0b11111, 0b11111, 0b11111, 0b11111],
    [0b01110, 0b11011, 0b11111, 0b11111, 0b11111, 0b11111, 0b11111, 0b11111],
];

pub const SCROLL_MESSAGE: &str = "HD44780 LCD Driver - Scrolling Text Demo  ";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DemoKind {
    /// Static text on both rows.
    #[default]
    Basic,
    /// Two custom glyphs next to their labels.
    CustomChar,
    /// A message scrolling through the top row.
    Scrolling,
    /// A charging battery glyph, redefined every frame.
    Animation,
}

impl FromStr for DemoKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "basic" => Ok(DemoKind::Basic),
            "custom_char" => Ok(DemoKind::CustomChar),
            "scrolling" => Ok(DemoKind::Scrolling),
            "animation" => Ok(DemoKind::Animation),
            other => Err(SettingsError::UnknownDemo(other.to_string())),
        }
    }
}

impl DemoKind {
    /// Time between two frames.
    pub fn interval(self) -> Duration {
        match self {
            DemoKind::Scrolling => Duration::from_millis(300),
            _ => Duration::from_secs(1),
        }
    }

    /// Draws frame number `frame`. The static demos only draw on the first frame.
    pub fn frame(self, lcd: &mut dyn HD44780Driver, frame: usize) -> LcdResult<()> {
        match self {
            DemoKind::Basic => {
                if frame == 0 {
                    lcd.set_cursor(0, 0)?;
                    lcd.write_str("HD44780 16x2")?;
                    lcd.set_cursor(1, 0)?;
                    lcd.write_str("4-bit GPIO")?;
                }
                Ok(())
            }
            DemoKind::CustomChar => {
                if frame == 0 {
                    lcd.create_glyph(0, &BELL)?;
                    lcd.create_glyph(1, &SPEAKER)?;
                    lcd.set_cursor(0, 0)?;
                    lcd.write_str("Alarm ")?;
                    lcd.write_glyph(0)?;
                    lcd.set_cursor(1, 0)?;
                    lcd.write_str("Volume ")?;
                    lcd.write_glyph(1)?;
                }
                Ok(())
            }
            DemoKind::Scrolling => {
                lcd.clear()?;
                lcd.set_cursor(0, 0)?;
                lcd.write_string(&scroll_window(SCROLL_MESSAGE.as_bytes(), frame))?;
                lcd.set_cursor(1, 0)?;
                lcd.write_str("Scrolling...")
            }
            DemoKind::Animation => {
                let stage = frame % BATTERY.len();
                lcd.create_glyph(0, &BATTERY[stage])?;
                lcd.set_cursor(0, 0)?;
                if stage == BATTERY.len() - 1 {
                    lcd.write_str("Charged!  ")?;
                } else {
                    lcd.write_str("Charging: ")?;
                }
                lcd.write_glyph(0)
            }
        }
    }
}

/// The visible part of `message` after `offset` steps, wrapping around its end.
fn scroll_window(message: &[u8], offset: usize) -> Vec<u8> {
    if message.is_empty() {
        return Vec::new();
    }
    (0..COLUMNS as usize)
        .map(|i| message[(offset + i) % message.len()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use lcd1602_gpio::lcd::hd44780::driver::{GpioHD44780Driver, LcdConfig};
    use lcd1602_gpio::lcd::hd44780::sim::{SimClock, SimulatedHD44780};

    fn lcd() -> GpioHD44780Driver<SimulatedHD44780, SimClock> {
        let config = LcdConfig::new(Settings::DEFAULT_PINS);
        GpioHD44780Driver::init(
            SimulatedHD44780::new(config.pins),
            SimClock::default(),
            &config,
        )
        .unwrap()
    }

    #[test]
    fn demo_names() {
        assert_eq!("custom_char".parse::<DemoKind>(), Ok(DemoKind::CustomChar));
        assert_eq!("animation".parse::<DemoKind>(), Ok(DemoKind::Animation));
        assert!("tetris".parse::<DemoKind>().is_err());
    }

    #[test]
    fn scroll_window_wraps() {
        assert_eq!(scroll_window(b"abc", 1), b"bcabcabcabcabcab");
        assert_eq!(scroll_window(b"", 4), b"");
    }

    #[test]
    fn basic_draws_once() {
        let mut lcd = lcd();
        DemoKind::Basic.frame(&mut lcd, 0).unwrap();
        assert_eq!(lcd.platform().row_text(0), "HD44780 16x2    ");
        assert_eq!(lcd.platform().row_text(1), "4-bit GPIO      ");

        let transfers = lcd.platform().transfers().len();
        DemoKind::Basic.frame(&mut lcd, 1).unwrap();
        assert_eq!(lcd.platform().transfers().len(), transfers);
    }

    #[test]
    fn custom_char_defines_both_glyphs() {
        let mut lcd = lcd();
        DemoKind::CustomChar.frame(&mut lcd, 0).unwrap();
        let sim = lcd.platform();
        assert_eq!(sim.glyph(0), Some(BELL));
        assert_eq!(sim.glyph(1), Some(SPEAKER));
        assert_eq!(sim.row_bytes(0)[..7], *b"Alarm \x00");
        assert_eq!(sim.row_bytes(1)[..8], *b"Volume \x01");
    }

    #[test]
    fn scrolling_advances_one_column_per_frame() {
        let mut lcd = lcd();
        DemoKind::Scrolling.frame(&mut lcd, 0).unwrap();
        assert_eq!(lcd.platform().row_text(0), &SCROLL_MESSAGE[..16]);
        DemoKind::Scrolling.frame(&mut lcd, 3).unwrap();
        assert_eq!(lcd.platform().row_text(0), &SCROLL_MESSAGE[3..19]);
        assert_eq!(lcd.platform().row_text(1), "Scrolling...    ");
    }

    #[test]
    fn battery_fills_up_from_the_bottom() {
        let filled = |pattern: &GlyphPattern| pattern.iter().filter(|&&row| row == 0b11111).count();
        let counts = BATTERY.iter().map(filled).collect::<Vec<_>>();
        assert_eq!(counts, vec![2, 3, 4, 6]);
        for pattern in &BATTERY {
            assert_eq!(pattern[..2], [0b01110, 0b11011]);
        }
    }

    #[test]
    fn animation_cycles_through_the_battery() {
        let mut lcd = lcd();
        for frame in 0..BATTERY.len() {
            DemoKind::Animation.frame(&mut lcd, frame).unwrap();
            assert_eq!(lcd.platform().glyph(0), Some(BATTERY[frame]));
        }
        assert_eq!(lcd.platform().row_bytes(0)[..11], *b"Charged!  \x00");

        DemoKind::Animation.frame(&mut lcd, BATTERY.len()).unwrap();
        assert_eq!(lcd.platform().glyph(0), Some(BATTERY[0]));
        assert_eq!(lcd.platform().row_bytes(0)[..11], *b"Charging: \x00");
    }
}
