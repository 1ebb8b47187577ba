mod config;
mod demos;

use crate::config::{Backend, Settings};
use dotenv::dotenv;
use lcd1602_gpio::delay::ThreadDelay;
use lcd1602_gpio::gpiod::GpiodPlatform;
use lcd1602_gpio::lcd::hd44780::driver::GpioHD44780Driver;
use lcd1602_gpio::lcd::hd44780::sim::{SimClock, SimulatedHD44780};
use log::{debug, info};
use std::thread::sleep;
use sysinfo::System;

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "Hostname {}, architecture {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::cpu_arch()
    );

    let settings = Settings::from_env()?;
    info!("LCD @ {}", settings.lcd.pins);
    info!(
        "Running {:?} for {} frames on {:?}",
        settings.demo, settings.frames, settings.backend
    );

    match settings.backend {
        Backend::Gpiod => {
            debug!("Opening {} GPIO chips...", settings.banks());
            let platform = GpiodPlatform::open_banks(settings.banks())?;
            debug!("{:?} opened.", platform);

            let mut lcd = GpioHD44780Driver::init(platform, ThreadDelay, &settings.lcd)?;
            debug!("LCD initialized.");

            for frame in 0..settings.frames {
                settings.demo.frame(&mut lcd, frame)?;
                sleep(settings.demo.interval());
            }
        }
        Backend::Sim => {
            let platform = SimulatedHD44780::new(settings.lcd.pins);
            let mut lcd = GpioHD44780Driver::init(platform, SimClock::default(), &settings.lcd)?;
            debug!("Simulated LCD initialized.");

            for frame in 0..settings.frames {
                settings.demo.frame(&mut lcd, frame)?;
                info!("Frame {}:\n{}", frame, lcd.platform().screen());
            }
            info!("Simulated bus time {:?}", lcd.delay().elapsed());
        }
    }

    Ok(())
}
