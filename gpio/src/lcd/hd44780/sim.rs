//! A simulated HD44780 controller and a fake clock, to run the driver without hardware.
//!
//! [SimulatedHD44780] is a [GpioPlatform]: it follows the levels of the lines it is wired to,
//! samples the data lines on every falling edge of E, and decodes them like the controller would,
//! starting in 8-bit mode after power-on. Every latched nibble and every decoded byte is logged,
//! and the DDRAM and CGRAM contents can be inspected.
//!
//! Timing is not checked, the [SimClock] only records the waits.

use crate::delay::DelayNs;
use crate::lcd::hd44780::driver::{GlyphPattern, PinConfig, COLUMNS, ROW_OFFSETS};
use crate::{GpioBias, GpioDriveMode, GpioError, GpioPlatform, GpioResult, PinRef};
use log::{debug, trace};
use std::collections::BTreeMap;
use std::time::Duration;

/// A byte decoded by the simulated controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transfer {
    /// Sent with RS low.
    Command(u8),
    /// Sent with RS high.
    Data(u8),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum AddressMode {
    Ddram,
    Cgram,
}

const DDRAM_SIZE: usize = 0x80;
const CGRAM_SIZE: usize = 0x40;

/// A simulated HD44780 wired to the pins of a [PinConfig].
#[derive(Debug)]
pub struct SimulatedHD44780 {
    pins: PinConfig,
    outputs: BTreeMap<PinRef, (GpioBias, GpioDriveMode)>,
    levels: BTreeMap<PinRef, bool>,

    nibbles: Vec<u8>,
    transfers: Vec<Transfer>,
    pending: Option<(u8, bool)>,

    four_bit: bool,
    two_lines: bool,
    big_font: bool,
    display_on: bool,
    cursor_on: bool,
    blink_on: bool,
    increment: bool,
    shift_on_write: bool,
    display_shift: usize,

    mode: AddressMode,
    address: u8,
    ddram: [u8; DDRAM_SIZE],
    cgram: [u8; CGRAM_SIZE],
}

impl SimulatedHD44780 {
    /// Creates a controller in its power-on state: 8-bit mode, one line, display off, DDRAM
    /// filled with spaces.
    pub fn new(pins: PinConfig) -> Self {
        SimulatedHD44780 {
            pins,
            outputs: BTreeMap::new(),
            levels: BTreeMap::new(),
            nibbles: Vec::new(),
            transfers: Vec::new(),
            pending: None,
            four_bit: false,
            two_lines: false,
            big_font: false,
            display_on: false,
            cursor_on: false,
            blink_on: false,
            increment: true,
            shift_on_write: false,
            display_shift: 0,
            mode: AddressMode::Ddram,
            address: 0,
            ddram: [b' '; DDRAM_SIZE],
            cgram: [0; CGRAM_SIZE],
        }
    }

    /// The current level of a line, `false` if it was never driven.
    pub fn level(&self, pin: PinRef) -> bool {
        self.levels.get(&pin).copied().unwrap_or(false)
    }

    /// The bias and drive mode a pin was configured with, if it was configured as an output.
    pub fn output_mode(&self, pin: PinRef) -> Option<(GpioBias, GpioDriveMode)> {
        self.outputs.get(&pin).copied()
    }

    /// Every nibble latched so far, including the ones sent in 8-bit mode.
    pub fn nibbles(&self) -> &[u8] {
        &self.nibbles
    }

    pub fn take_nibbles(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.nibbles)
    }

    /// Every complete byte decoded so far. In 8-bit mode, a single nibble is one byte, with the
    /// unconnected D0..D3 read as zeros.
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn take_transfers(&mut self) -> Vec<Transfer> {
        std::mem::take(&mut self.transfers)
    }

    pub fn is_four_bit(&self) -> bool {
        self.four_bit
    }

    pub fn is_two_lines(&self) -> bool {
        self.two_lines
    }

    pub fn is_big_font(&self) -> bool {
        self.big_font
    }

    /// Display on, cursor on, blink on.
    pub fn display_control(&self) -> (bool, bool, bool) {
        (self.display_on, self.cursor_on, self.blink_on)
    }

    /// The address counter, pointing into DDRAM or CGRAM depending on [Self::is_ddram_mode].
    pub fn address_counter(&self) -> u8 {
        self.address
    }

    /// Whether data writes go to DDRAM (`true`) or CGRAM (`false`).
    pub fn is_ddram_mode(&self) -> bool {
        self.mode == AddressMode::Ddram
    }

    pub fn ddram(&self) -> &[u8; DDRAM_SIZE] {
        &self.ddram
    }

    /// The pattern stored in a CGRAM slot, `None` if `slot` is not below 8.
    pub fn glyph(&self, slot: u8) -> Option<GlyphPattern> {
        let start = slot as usize * 8;
        self.cgram.get(start..start + 8)?.try_into().ok()
    }

    /// The character codes visible on a row, taking the display shift into account.
    pub fn row_bytes(&self, row: u8) -> [u8; COLUMNS as usize] {
        let mut bytes = [b' '; COLUMNS as usize];
        let base = match ROW_OFFSETS.get(row as usize) {
            Some(&base) if row == 0 || self.two_lines => base as usize,
            _ => return bytes,
        };
        let width = self.line_width();
        for (column, byte) in bytes.iter_mut().enumerate() {
            *byte = self.ddram[base + (column + self.display_shift) % width];
        }
        bytes
    }

    /// The text visible on a row. Custom characters are shown as `█`, codes outside of printable
    /// ASCII as `?`.
    pub fn row_text(&self, row: u8) -> String {
        self.row_bytes(row)
            .iter()
            .map(|&byte| match byte {
                0x00..=0x0F => '█',
                0x20..=0x7E => byte as char,
                _ => '?',
            })
            .collect()
    }

    /// All visible rows, framed, one per line.
    pub fn screen(&self) -> String {
        let rows = ROW_OFFSETS
            .iter()
            .enumerate()
            .map(|(row, _)| format!("|{}|", self.row_text(row as u8)))
            .collect::<Vec<_>>();
        rows.join("\n")
    }

    fn line_width(&self) -> usize {
        if self.two_lines { 40 } else { 80 }
    }

    fn latch(&mut self) {
        let nibble = self
            .pins
            .data
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &pin)| acc | (u8::from(self.level(pin)) << i));
        let rs = self.level(self.pins.rs);
        trace!("Simulated LCD latched {:04b}, RS: {}", nibble, rs);
        self.nibbles.push(nibble);

        if !self.four_bit {
            self.execute(nibble << 4, rs);
            return;
        }

        match self.pending.take() {
            Some((high, rs)) => self.execute((high << 4) | nibble, rs),
            None => self.pending = Some((nibble, rs)),
        }
    }

    fn execute(&mut self, byte: u8, rs: bool) {
        if rs {
            self.transfers.push(Transfer::Data(byte));
            self.write_data(byte);
            return;
        }

        self.transfers.push(Transfer::Command(byte));
        debug!("Simulated LCD command: {:08b}", byte);

        match byte.leading_zeros() {
            0 => {
                self.mode = AddressMode::Ddram;
                self.address = byte & 0x7F;
            }
            1 => {
                self.mode = AddressMode::Cgram;
                self.address = byte & 0x3F;
            }
            2 => {
                self.four_bit = byte & 0b00010000 == 0;
                self.two_lines = byte & 0b00001000 != 0;
                self.big_font = byte & 0b00000100 != 0;
            }
            3 => {
                let right = byte & 0b00000100 != 0;
                if byte & 0b00001000 != 0 {
                    self.shift_display(right);
                } else {
                    self.address = self.step_address(self.address, right);
                }
            }
            4 => {
                self.display_on = byte & 0b00000100 != 0;
                self.cursor_on = byte & 0b00000010 != 0;
                self.blink_on = byte & 0b00000001 != 0;
            }
            5 => {
                self.increment = byte & 0b00000010 != 0;
                self.shift_on_write = byte & 0b00000001 != 0;
            }
            6 => {
                self.mode = AddressMode::Ddram;
                self.address = 0;
                self.display_shift = 0;
            }
            7 => {
                self.ddram.fill(b' ');
                self.mode = AddressMode::Ddram;
                self.address = 0;
                self.display_shift = 0;
                self.increment = true;
            }
            _ => {}
        }
    }

    fn write_data(&mut self, byte: u8) {
        match self.mode {
            AddressMode::Ddram => {
                self.ddram[self.address as usize & (DDRAM_SIZE - 1)] = byte;
                if self.shift_on_write {
                    self.shift_display(!self.increment);
                }
            }
            // Only 5 bits per row exist
            AddressMode::Cgram => self.cgram[self.address as usize & (CGRAM_SIZE - 1)] = byte & 0x1F,
        }
        self.address = self.step_address(self.address, self.increment);
    }

    fn step_address(&self, address: u8, forward: bool) -> u8 {
        if self.mode == AddressMode::Cgram {
            let next = if forward { address.wrapping_add(1) } else { address.wrapping_sub(1) };
            return next & 0x3F;
        }

        let next = match (self.two_lines, address, forward) {
            (true, 0x27, true) => 0x40,
            (true, 0x67, true) => 0x00,
            (true, 0x00, false) => 0x67,
            (true, 0x40, false) => 0x27,
            (false, 0x4F, true) => 0x00,
            (false, 0x00, false) => 0x4F,
            (_, address, true) => address.wrapping_add(1),
            (_, address, false) => address.wrapping_sub(1),
        };
        next & 0x7F
    }

    /// Moves the visible window. Shifting right moves the text right.
    fn shift_display(&mut self, right: bool) {
        let width = self.line_width();
        self.display_shift = if right {
            (self.display_shift + width - 1) % width
        } else {
            (self.display_shift + 1) % width
        };
    }
}

impl GpioPlatform for SimulatedHD44780 {
    fn configure_output(
        &mut self,
        pin: PinRef,
        bias: GpioBias,
        drive: GpioDriveMode,
    ) -> GpioResult<()> {
        if self.outputs.contains_key(&pin) {
            return Err(GpioError::AlreadyInUse);
        }
        self.outputs.insert(pin, (bias, drive));
        self.levels.insert(pin, false);
        Ok(())
    }

    fn set_output(&mut self, pin: PinRef, level: bool) -> GpioResult<()> {
        if !self.outputs.contains_key(&pin) {
            return Err(GpioError::Other(format!("pin {} is not configured as output", pin)));
        }
        let previous = self.levels.insert(pin, level).unwrap_or(false);
        if pin == self.pins.e && previous && !level {
            self.latch();
        }
        Ok(())
    }
}

/// A fake clock: delays return immediately, but are recorded and summed up.
#[derive(Debug, Default)]
pub struct SimClock {
    elapsed: Duration,
    waits: Vec<Duration>,
}

impl SimClock {
    /// Total time the driver waited.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Every delay, in order.
    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    pub fn take_waits(&mut self) -> Vec<Duration> {
        std::mem::take(&mut self.waits)
    }

    fn record(&mut self, duration: Duration) {
        self.elapsed += duration;
        self.waits.push(duration);
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.record(Duration::from_nanos(ns.into()));
    }

    fn delay_us(&mut self, us: u32) {
        self.record(Duration::from_micros(us.into()));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.record(Duration::from_millis(ms.into()));
    }
}
