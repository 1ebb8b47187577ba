use crate::delay::{DelayExt, DelayNs};
use crate::lcd::hd44780::driver::{DisplayConfig, HD44780Driver, LcdConfig, LcdResult};
use crate::{GpioBias, GpioDriveMode, GpioPlatform};
use log::{debug, trace};
use std::fmt::Debug;
use std::time::Duration;

/// GpioHD44780Driver for the HD44780 LCD controller, bit-banging the 4-bit bus on GPIO pins.
///
/// The bus is write-only: R/W has to be tied to GND, and the busy flag is never polled. Instead,
/// each transfer waits the delays from the [TimingConfig](super::TimingConfig), so they have to
/// cover the slowest command.
///
/// The driver owns the platform and the delay, but both can also be borrowed, as
/// [GpioPlatform] and [DelayNs] are implemented for `&mut T`.
#[derive(Debug)]
pub struct GpioHD44780Driver<P: GpioPlatform, D: DelayNs> {
    platform: P,
    delay: D,
    config: LcdConfig,
}

impl<P: GpioPlatform, D: DelayNs> GpioHD44780Driver<P, D> {
    /// Nibbles sent to get the controller into 4-bit mode from any state, each followed by the
    /// time it needs before the next one. The controller might power up in 8-bit mode, or be in
    /// the middle of a 4-bit transfer, so `0011` is sent three times before switching with `0010`.
    const SYNC_SEQUENCE: [(u8, Duration); 4] = [
        (0b0011, Duration::from_micros(4500)),
        (0b0011, Duration::from_micros(4500)),
        (0b0011, Duration::from_micros(150)),
        (0b0010, Duration::ZERO),
    ];

    /// Time E has to be held low before the rising edge.
    const ENABLE_SETUP: Duration = Duration::from_micros(1);

    /// Configures the pins and initializes the display.
    ///
    /// After the power-on delay, it commences with the synchronization sequence (see
    /// [Self::SYNC_SEQUENCE]), then sets the line count and font, applies the display flags, and
    /// clears the display. The entry mode is left at its power-on default (cursor moving right,
    /// no display shift).
    pub fn init(platform: P, delay: D, config: &LcdConfig) -> LcdResult<Self>
    where
        D: Debug,
    {
        config.check();

        let mut driver = GpioHD44780Driver {
            platform,
            delay,
            config: *config,
        };

        debug!("Configuring LCD pins ({})", config.pins);
        for pin in config.pins.iter() {
            driver
                .platform
                .configure_output(pin, GpioBias::None, GpioDriveMode::PushPull)?;
        }
        driver.platform.set_output(config.pins.rs, false)?;
        driver.platform.set_output(config.pins.e, false)?;

        let power_on_ms = config.timing.power_on_delay.as_millis();
        driver
            .delay
            .delay_ms(u32::try_from(power_on_ms).unwrap_or(u32::MAX));

        // Synchronize
        debug!("Switching LCD to 4-bit mode");
        for (nibble, wait) in Self::SYNC_SEQUENCE {
            driver.write_nibble(nibble)?;
            if !wait.is_zero() {
                driver.delay.wait(wait);
            }
        }

        let display = config.display;
        driver.function_set(display.two_lines, display.big_font)?;
        driver.set_display_control(display.display_on, display.cursor_on, display.cursor_blink)?;
        driver.clear()?;

        debug!("LCD initialized");
        Ok(driver)
    }

    /// The platform the display is wired to.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The delay used for the bus timing.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Gives the platform and the delay back.
    pub fn release(self) -> (P, D) {
        (self.platform, self.delay)
    }

    /// Pulses E low, high, then low again. The controller latches the data lines on the falling edge.
    fn pulse_enable(&mut self) -> LcdResult<()> {
        let pin_e = self.config.pins.e;
        self.platform.set_output(pin_e, false)?;
        self.delay.wait(Self::ENABLE_SETUP);
        self.platform.set_output(pin_e, true)?;
        self.delay.wait(self.config.timing.enable_pulse);
        self.platform.set_output(pin_e, false)?;
        Ok(())
    }

    /// Puts the low nibble of `value` on D4..D7, LSb first, and latches it.
    fn write_nibble(&mut self, value: u8) -> LcdResult<()> {
        trace!("Writing nibble: {:04b}", value & 0x0F);
        for (i, pin) in self.config.pins.data.into_iter().enumerate() {
            self.platform.set_output(pin, (value >> i) & 1 != 0)?;
        }
        self.pulse_enable()
    }

    /// Sends a whole byte, high nibble first, and waits the command delay.
    fn write_byte(&mut self, value: u8, is_command: bool) -> LcdResult<()> {
        trace!("Sending byte: {:08b}, RS: {}", value, !is_command);

        self.platform.set_output(self.config.pins.rs, !is_command)?;
        self.write_nibble(value >> 4)?;
        self.write_nibble(value & 0x0F)?;
        self.delay.wait(self.config.timing.command_delay);
        Ok(())
    }
}

impl<P: GpioPlatform, D: DelayNs + Debug> HD44780Driver for GpioHD44780Driver<P, D> {
    fn config(&self) -> &LcdConfig {
        &self.config
    }

    fn send_command(&mut self, command: u8) -> LcdResult<()> {
        self.write_byte(command, true)
    }

    fn send_data(&mut self, data: u8) -> LcdResult<()> {
        self.write_byte(data, false)
    }

    fn settle(&mut self, duration: Duration) {
        self.delay.wait(duration);
    }

    fn set_display(&mut self, display: &DisplayConfig) -> LcdResult<()> {
        self.set_display_control(display.display_on, display.cursor_on, display.cursor_blink)?;
        self.config.display = *display;
        Ok(())
    }
}
