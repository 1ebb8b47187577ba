//! HD44780 LCD driver module.
//!
//! See [HD44780Driver] for the command layer shared by every implementation, and
//! [GpioHD44780Driver] for the bit-banged 4-bit implementation on top of a
//! [GpioPlatform](crate::GpioPlatform).
//!
//! # Memory
//!
//! - **DDRAM** (Display Data RAM) holds the displayed characters. In two-line mode, row 0 starts at
//!   address `0x00` and row 1 at `0x40`, see [ROW_OFFSETS].
//! - **CGRAM** (Character Generator RAM) holds 8 user-defined 5x8 characters, 8 bytes each.
//!   Character codes `0..=7` display them.
//!
//! The controller writes data to whichever of these was last addressed by a set address command.
//! Every command that leaves it in CGRAM mode has to switch it back to DDRAM, or subsequent text
//! overwrites the glyph instead.

mod config;
mod gpio;

use crate::GpioError;
pub use config::*;
pub use gpio::*;
use log::warn;
use std::fmt::Debug;
use thiserror::Error;

/// Number of rows on the display.
pub const ROWS: u8 = 2;
/// Number of visible columns on the display.
pub const COLUMNS: u8 = 16;
/// DDRAM address of the first column of each row.
pub const ROW_OFFSETS: [u8; ROWS as usize] = [0x00, 0x40];
/// Number of custom character slots in CGRAM.
pub const GLYPH_SLOTS: u8 = 8;

/// A custom character, one byte per row from the top. Only the 5 low bits of each row are shown.
pub type GlyphPattern = [u8; 8];

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("invalid parameter")]
    InvalidParameter,
    /// Never produced while the driver cannot read the busy flag.
    #[error("LCD controller is busy")]
    Busy,
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
}

pub type LcdResult<T> = Result<T, LcdError>;

/// The outcome of an LCD operation as a plain status, for callers that report numeric codes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    Success,
    InvalidParameter,
    Busy,
    /// The GPIO platform failed to drive a line.
    Hardware,
}

impl Status {
    pub fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::InvalidParameter => -1,
            Status::Busy => -2,
            Status::Hardware => -3,
        }
    }
}

impl<T> From<&LcdResult<T>> for Status {
    fn from(result: &LcdResult<T>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(LcdError::InvalidParameter) => Status::InvalidParameter,
            Err(LcdError::Busy) => Status::Busy,
            Err(LcdError::Gpio(_)) => Status::Hardware,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}

/// A position on the display, both zero-based.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Position {
    pub row: u8,
    pub column: u8,
}

impl Position {
    pub const fn new(row: u8, column: u8) -> Self {
        Position { row, column }
    }

    /// The DDRAM address of this position, or `None` if it is off the display.
    pub fn ddram_address(self) -> Option<u8> {
        if self.row >= ROWS || self.column >= COLUMNS {
            return None;
        }
        Some(ROW_OFFSETS[self.row as usize] + self.column)
    }
}

/// The `HD44780Driver` trait is the command layer of the HD44780 controller. Implementations only
/// provide the byte transfers and the configuration, every command is built on top of them.
///
/// All operations block until the controller had the time to execute them. Validation happens
/// before anything is sent, so an [LcdError::InvalidParameter] never leaves a half-sent command
/// on the bus.
pub trait HD44780Driver: Debug {
    /// The active configuration.
    fn config(&self) -> &LcdConfig;

    /// Sends a command byte to the controller (RS low) and waits the command delay.
    fn send_command(&mut self, command: u8) -> LcdResult<()>;

    /// Sends a data byte to the controller (RS high) and waits the command delay.
    fn send_data(&mut self, data: u8) -> LcdResult<()>;

    /// Blocks for the given time, on top of the delay every transfer already includes.
    fn settle(&mut self, duration: std::time::Duration);

    /// Applies the display flags and stores them as the active display configuration. The pins and
    /// the timing are left untouched.
    fn set_display(&mut self, display: &DisplayConfig) -> LcdResult<()>;

    /// The active display flags.
    fn display_config(&self) -> &DisplayConfig {
        &self.config().display
    }

    /// Clears the display and sets the cursor to the home position.
    ///
    /// Clearing takes much longer than the other commands, so this waits the clear delay on top
    /// of the command delay.
    fn clear(&mut self) -> LcdResult<()> {
        self.send_command(0b00000001)?;
        let clear_delay = self.config().timing.clear_delay;
        self.settle(clear_delay);
        Ok(())
    }

    /// Sets the cursor to the home position and undoes any display shift.
    fn home(&mut self) -> LcdResult<()> {
        self.send_command(0b00000010)?;
        let command_delay = self.config().timing.command_delay;
        self.settle(command_delay);
        Ok(())
    }

    /// Sets the direction the cursor moves after each character, and whether the whole display
    /// shifts instead.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> LcdResult<()> {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> LcdResult<()> {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Moves the cursor or shifts the display by one, without touching DDRAM.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> LcdResult<()> {
        let mut command = 0b00010000;
        if display_shift {
            command |= 0b00001000;
        }
        if direction == CursorDirection::Right {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Function set. The data length is always 4 bits.
    fn function_set(&mut self, two_lines: bool, big_font: bool) -> LcdResult<()> {
        let mut command = 0b00100000;
        if two_lines {
            command |= 0b00001000;
        }
        if big_font {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the CGRAM address. Subsequent data goes to CGRAM.
    fn set_cgram_address(&mut self, address: u8) -> LcdResult<()> {
        if address > 0b00111111 {
            return Err(LcdError::InvalidParameter);
        }
        self.send_command(0b01000000 | address)
    }

    /// Sets the DDRAM address. Subsequent data goes to DDRAM.
    fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        if address > 0b01111111 {
            return Err(LcdError::InvalidParameter);
        }
        self.send_command(0b10000000 | address)
    }

    /// Moves the cursor to the given row (`0..2`) and column (`0..16`).
    fn set_cursor(&mut self, row: u8, column: u8) -> LcdResult<()> {
        self.set_position(Position::new(row, column))
    }

    /// Moves the cursor to the given [Position].
    fn set_position(&mut self, position: Position) -> LcdResult<()> {
        let address = position.ddram_address().ok_or(LcdError::InvalidParameter)?;
        self.set_ddram_address(address)
    }

    /// Stores a custom character in one of the 8 CGRAM slots, then goes back to DDRAM address 0.
    ///
    /// The cursor ends up at the home position, so set it again before writing text.
    fn create_glyph(&mut self, slot: u8, pattern: &GlyphPattern) -> LcdResult<()> {
        if slot >= GLYPH_SLOTS {
            return Err(LcdError::InvalidParameter);
        }
        self.set_cgram_address(slot << 3)?;
        for &row in pattern {
            self.send_data(row)?;
        }
        self.set_ddram_address(0)
    }

    /// Writes a raw character code at the cursor. Every code is accepted, the character ROM
    /// decides what it looks like.
    fn write_char(&mut self, c: u8) -> LcdResult<()> {
        self.send_data(c)
    }

    /// Writes the custom character stored in `slot`.
    fn write_glyph(&mut self, slot: u8) -> LcdResult<()> {
        if slot >= GLYPH_SLOTS {
            return Err(LcdError::InvalidParameter);
        }
        self.write_char(slot)
    }

    /// Writes raw character codes, in order.
    fn write_string(&mut self, s: &[u8]) -> LcdResult<()> {
        for &c in s {
            self.write_char(c)?;
        }
        Ok(())
    }

    /// Writes ASCII text. Other characters are shown as `?`.
    fn write_str(&mut self, s: &str) -> LcdResult<()> {
        for c in s.chars() {
            if c.is_ascii() {
                self.write_char(c as u8)?;
            } else {
                warn!("Non-ASCII character: {}", c);
                self.write_char(b'?')?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Records the bytes without any bus underneath.
    #[derive(Debug)]
    struct ByteRecorder {
        config: LcdConfig,
        sent: Vec<(bool, u8)>,
        settled: Vec<Duration>,
    }

    impl ByteRecorder {
        fn new() -> Self {
            let pin = crate::PinRef::default();
            ByteRecorder {
                config: LcdConfig::new(PinConfig { rs: pin, e: pin, data: [pin; 4] }),
                sent: Vec::new(),
                settled: Vec::new(),
            }
        }

        fn commands(&self) -> Vec<u8> {
            self.sent.iter().filter(|(rs, _)| !rs).map(|&(_, b)| b).collect()
        }
    }

    impl HD44780Driver for ByteRecorder {
        fn config(&self) -> &LcdConfig {
            &self.config
        }

        fn send_command(&mut self, command: u8) -> LcdResult<()> {
            self.sent.push((false, command));
            Ok(())
        }

        fn send_data(&mut self, data: u8) -> LcdResult<()> {
            self.sent.push((true, data));
            Ok(())
        }

        fn settle(&mut self, duration: Duration) {
            self.settled.push(duration);
        }

        fn set_display(&mut self, display: &DisplayConfig) -> LcdResult<()> {
            self.set_display_control(display.display_on, display.cursor_on, display.cursor_blink)?;
            self.config.display = *display;
            Ok(())
        }
    }

    #[test]
    fn every_position_on_the_display_maps_to_its_row_offset() {
        for row in 0..ROWS {
            for column in 0..COLUMNS {
                let address = Position::new(row, column).ddram_address();
                assert_eq!(address, Some(ROW_OFFSETS[row as usize] + column));
            }
        }
        assert_eq!(Position::new(1, 5).ddram_address(), Some(0x45));
        assert_eq!(Position::new(0, 0).ddram_address(), Some(0x00));
    }

    #[test]
    fn positions_off_the_display_have_no_address() {
        assert_eq!(Position::new(2, 0).ddram_address(), None);
        assert_eq!(Position::new(0, 16).ddram_address(), None);
        assert_eq!(Position::new(255, 255).ddram_address(), None);
    }

    #[test]
    fn set_cursor_sends_ddram_address_command() {
        let mut lcd = ByteRecorder::new();
        lcd.set_cursor(1, 5).unwrap();
        lcd.set_cursor(0, 0).unwrap();
        assert_eq!(lcd.commands(), vec![0x80 | 0x45, 0x80]);
    }

    #[test]
    fn set_cursor_out_of_range_sends_nothing() {
        let mut lcd = ByteRecorder::new();
        for (row, column) in [(2, 0), (0, 16), (7, 3), (1, 200)] {
            assert_eq!(lcd.set_cursor(row, column), Err(LcdError::InvalidParameter));
        }
        assert!(lcd.sent.is_empty());
    }

    #[test]
    fn clear_settles_for_the_clear_delay_and_home_for_the_command_delay() {
        let mut lcd = ByteRecorder::new();
        lcd.clear().unwrap();
        lcd.home().unwrap();
        assert_eq!(lcd.commands(), vec![0x01, 0x02]);
        assert_eq!(
            lcd.settled,
            vec![lcd.config.timing.clear_delay, lcd.config.timing.command_delay]
        );
    }

    #[test]
    fn flag_commands_are_encoded() {
        let mut lcd = ByteRecorder::new();
        lcd.set_entry_mode(CursorDirection::Right, false).unwrap();
        lcd.set_entry_mode(CursorDirection::Left, true).unwrap();
        lcd.set_display_control(true, true, false).unwrap();
        lcd.cursor_shift(true, CursorDirection::Left).unwrap();
        lcd.cursor_shift(false, CursorDirection::Right).unwrap();
        lcd.function_set(true, false).unwrap();
        lcd.function_set(false, true).unwrap();
        assert_eq!(
            lcd.commands(),
            vec![0x06, 0x05, 0x0E, 0x18, 0x14, 0x28, 0x24]
        );
    }

    #[test]
    fn address_commands_reject_out_of_range_addresses() {
        let mut lcd = ByteRecorder::new();
        assert_eq!(lcd.set_cgram_address(0x40), Err(LcdError::InvalidParameter));
        assert_eq!(lcd.set_ddram_address(0x80), Err(LcdError::InvalidParameter));
        assert!(lcd.sent.is_empty());
    }

    #[test]
    fn create_glyph_sends_address_pattern_then_restores_ddram() {
        let pattern = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut lcd = ByteRecorder::new();
        lcd.create_glyph(3, &pattern).unwrap();

        let mut expected = vec![(false, 0x40 | (3 << 3))];
        expected.extend(pattern.iter().map(|&row| (true, row)));
        expected.push((false, 0x80));
        assert_eq!(lcd.sent, expected);
    }

    #[test]
    fn create_glyph_rejects_slots_above_seven() {
        let mut lcd = ByteRecorder::new();
        for slot in 8..=255u8 {
            assert_eq!(lcd.create_glyph(slot, &[0; 8]), Err(LcdError::InvalidParameter));
        }
        assert!(lcd.sent.is_empty());
    }

    #[test]
    fn write_string_sends_each_byte_as_data() {
        let mut lcd = ByteRecorder::new();
        lcd.write_string(b"").unwrap();
        assert!(lcd.sent.is_empty());

        lcd.write_string(b"HI\x00\xff").unwrap();
        assert_eq!(
            lcd.sent,
            vec![(true, b'H'), (true, b'I'), (true, 0x00), (true, 0xff)]
        );
    }

    #[test]
    fn write_str_replaces_non_ascii() {
        let mut lcd = ByteRecorder::new();
        lcd.write_str("a€b").unwrap();
        assert_eq!(lcd.sent, vec![(true, b'a'), (true, b'?'), (true, b'b')]);
    }

    #[test]
    fn write_glyph_checks_the_slot() {
        let mut lcd = ByteRecorder::new();
        lcd.write_glyph(7).unwrap();
        assert_eq!(lcd.write_glyph(8), Err(LcdError::InvalidParameter));
        assert_eq!(lcd.sent, vec![(true, 7)]);
    }

    #[test]
    fn set_display_only_updates_the_display_section() {
        let mut lcd = ByteRecorder::new();
        let before = lcd.config;
        let display = DisplayConfig {
            cursor_on: true,
            cursor_blink: true,
            display_on: false,
            two_lines: false,
            big_font: true,
        };
        lcd.set_display(&display).unwrap();
        assert_eq!(lcd.commands(), vec![0b00001011]);
        assert_eq!(lcd.display_config(), &display);
        assert_eq!(lcd.config.pins, before.pins);
        assert_eq!(lcd.config.timing, before.timing);
    }

    #[test]
    fn status_codes_match_results() {
        assert_eq!(Status::from(&LcdResult::Ok(())), Status::Success);
        assert_eq!(Status::from(&LcdResult::<()>::Err(LcdError::InvalidParameter)).code(), -1);
        assert_eq!(Status::from(&LcdResult::<()>::Err(LcdError::Busy)).code(), -2);
        assert_eq!(
            Status::from(&LcdResult::<()>::Err(GpioError::NotSupported.into())),
            Status::Hardware
        );
        assert_eq!(Status::Success.code(), 0);
    }
}
