//! HD44780 LCD module, for 16x2 character displays wired in 4-bit mode.
//!
//! See [driver::HD44780Driver] for the command set and [driver::GpioHD44780Driver] for the
//! bit-banged implementation over any [GpioPlatform](crate::GpioPlatform). The [sim] module
//! contains a simulated controller that decodes the bus, used to check the driver without hardware.

pub mod driver;
pub mod sim;
