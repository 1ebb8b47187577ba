//! Blocking delays used by bit-banged drivers, on top of [DelayNs].

pub use embedded_hal::delay::DelayNs;
use std::thread::sleep;
use std::time::Duration;

/// Extension trait for [DelayNs], waiting for a [Duration].
pub trait DelayExt: DelayNs {
    /// Blocks for at least the given [Duration], down to the nanosecond.
    fn wait(&mut self, duration: Duration) {
        let mut ns = duration.as_nanos();
        while ns > 0 {
            let chunk = u32::try_from(ns).unwrap_or(u32::MAX);
            self.delay_ns(chunk);
            ns -= u128::from(chunk);
        }
    }
}

impl<T: DelayNs + ?Sized> DelayExt for T {}

/// Delay backed by [std::thread::sleep].
///
/// The OS scheduler may oversleep, which is fine for the HD44780, as every delay is a minimum.
#[derive(Copy, Clone, Debug, Default)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        sleep(Duration::from_nanos(ns.into()));
    }

    fn delay_us(&mut self, us: u32) {
        sleep(Duration::from_micros(us.into()));
    }

    fn delay_ms(&mut self, ms: u32) {
        sleep(Duration::from_millis(ms.into()));
    }
}
