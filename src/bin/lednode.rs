// bin/lednode.rs

#[cfg(target_os = "espidf")]
use esp32pubsub::*;

#[cfg(target_os = "espidf")]
esp_idf_sys::esp_app_desc!();

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_hal::{
        delay::FreeRtos,
        gpio::{OutputPin, PinDriver},
        prelude::Peripherals,
    };
    use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs, wifi::EspWifi};
    use log::*;

    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Hello.");
    info!("lednode v{FW_VERSION} starting up.");

    let config = MyConfig::led_node();
    info!("My config:\n{config:#?}");

    let sysloop = EspSystemEventLoop::take()?;
    let nvs_default_partition = nvs::EspDefaultNvsPartition::take()?;
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    #[cfg(feature = "esp32c3")]
    let led_pin = pins.gpio8.downgrade_output();
    #[cfg(not(feature = "esp32c3"))]
    let led_pin = pins.gpio2.downgrade_output();

    let mut led = PinDriver::output(led_pin)?;
    led.set_low()?;
    let handler = LedHandler::new(led, config.mqtt_topic.clone());

    let wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs_default_partition))?;
    let mut net = NetworkSession::new(EspWifiLink::new(wifi), config.wifi_poll);
    let mut delay = FreeRtos;
    net.associate(&config.wifi, &mut delay)?;

    let ip_info = net.link().wifi().sta_netif().get_ip_info()?;
    info!("My IP address: {}", ip_info.ip);

    let transport = EspMqttTransport::new(config.mqtt_url(), config.mqtt_keep_alive);
    let mut mqtt = MqttSession::new(transport, &config, handler);
    let mut subscriber = SubscriberLoop::new(&config);

    info!("Entering main loop...");
    loop {
        if let Err(e) = subscriber.run_once(&mut mqtt, &mut delay) {
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
