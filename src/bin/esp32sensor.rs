// bin/esp32sensor.rs

#![warn(clippy::large_futures)]

use esp_idf_hal::{
    delay::FreeRtos,
    gpio::{AnyInputPin, Input, InputPin, PinDriver},
    prelude::Peripherals,
};
use esp_idf_svc::nvs;

use esp32sensor::*;

#[cfg(all(feature = "esp32c3", feature = "esp-wroom-32"))]
compile_error!("Select only one hardware feature: `esp32c3` or `esp-wroom-32`");
#[cfg(not(any(feature = "esp32c3", feature = "esp-wroom-32")))]
compile_error!("Select a hardware feature: `esp32c3` or `esp-wroom-32`");

struct BootButton<'a>(PinDriver<'a, AnyInputPin, Input>);

impl ResetButton for BootButton<'_> {
    fn is_pressed(&self) -> bool {
        self.0.is_low()
    }
}

struct Esp;

impl SystemControl for Esp {
    fn restart(&mut self) {
        esp_idf_hal::reset::restart();
    }
}

fn main() -> anyhow::Result<()> {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Hello.");
    info!("Starting up, firmware version {FW_VERSION} built {BUILD_TIME}");

    let nvs_default_partition = nvs::EspDefaultNvsPartition::take()?;
    let ns = env!("CARGO_BIN_NAME");
    let nvs = match nvs::EspNvs::new(nvs_default_partition, ns, true) {
        Ok(nvs) => {
            info!("Got namespace {ns:?} from default partition");
            nvs
        }
        Err(e) => panic!("Could not get namespace {ns}: {e:?}"),
    };

    let backing = NvsBacking::open(nvs, DEFAULT_CAPACITY)?;
    let config = SensorConfig::boot(RomStore::new(backing)?)?;
    info!(
        "Configuration {:?}, sensor read every {} ms",
        config.state(),
        config.record().sensor_wait_time
    );

    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    #[cfg(feature = "esp32c3")]
    let button = BootButton(PinDriver::input(pins.gpio9.downgrade_input())?);

    #[cfg(feature = "esp-wroom-32")]
    let button = BootButton(PinDriver::input(pins.gpio0.downgrade_input())?);

    let state = Arc::new(Box::pin(DeviceState::new(config)));

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(Box::pin(async move {
            info!("Entering main loop...");
            let mut esp = Esp;
            if let Err(e) = Box::pin(supervise(state.clone(), button, &mut esp)).await {
                error!("supervise() ended: {e:?}");
            }
        }));

    // not actually returning from main() but we reboot instead!
    info!("main() finished, reboot.");
    FreeRtos::delay_ms(3000);
    esp_idf_hal::reset::restart();
}

// EOF
