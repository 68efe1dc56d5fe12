// bin/sensornode.rs

#[cfg(target_os = "espidf")]
use esp32pubsub::*;

#[cfg(target_os = "espidf")]
esp_idf_sys::esp_app_desc!();

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_hal::{delay::FreeRtos, gpio::IOPin, prelude::Peripherals};
    use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs, wifi::EspWifi};
    use log::*;

    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Hello.");
    info!("sensornode v{FW_VERSION} starting up.");

    let config = MyConfig::sensor_node();
    info!("My config:\n{config:#?}");

    let sysloop = EspSystemEventLoop::take()?;
    let nvs_default_partition = nvs::EspDefaultNvsPartition::take()?;
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    // DHT11 data line is on gpio4 for both boards
    let sensor = Dht11Sensor::new(pins.gpio4.downgrade(), "gpio4")?;

    let wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs_default_partition))?;
    let mut net = NetworkSession::new(EspWifiLink::new(wifi), config.wifi_poll);
    let mut delay = FreeRtos;
    net.associate(&config.wifi, &mut delay)?;

    let ip_info = net.link().wifi().sta_netif().get_ip_info()?;
    info!("My IP address: {}", ip_info.ip);

    let transport = EspMqttTransport::new(config.mqtt_url(), config.mqtt_keep_alive);
    let mut mqtt = MqttSession::new(transport, &config, LogOnly);
    let mut publisher = PublisherLoop::new(sensor, &config);

    info!("Entering main loop...");
    loop {
        if let Err(e) = publisher.run_once(&mut mqtt, &mut delay) {
            error!("Main loop error: {e:#}");
            FreeRtos::delay_ms(1000);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!(
        "{} {} must be built for an ESP-IDF target",
        env!("CARGO_BIN_NAME"),
        esp32pubsub::FW_VERSION
    )
}

// EOF
