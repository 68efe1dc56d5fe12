// build.rs

use std::env;

fn main() -> anyhow::Result<()> {
    // Necessary because of this issue: https://github.com/rust-lang/cargo/issues/9641
    // see also https://github.com/rust-lang/cargo/issues/9554
    // Host builds (tests) have no ESP-IDF to propagate from.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::build::CfgArgs::output_propagated("ESP_IDF")?;
        embuild::build::LinkArgs::output_propagated("ESP_IDF")?;
    }

    let wifi_ssid = env::var("WIFI_SSID").unwrap_or_else(|_| "internet".into());
    let wifi_pass = env::var("WIFI_PASS").unwrap_or_else(|_| "password".into());
    let mqtt_host = env::var("MQTT_HOST").unwrap_or_else(|_| "broker.hivemq.com".into());
    let mqtt_port = env::var("MQTT_PORT").unwrap_or_else(|_| "1883".into());

    println!("cargo:rustc-env=WIFI_SSID={wifi_ssid}");
    println!("cargo:rustc-env=WIFI_PASS={wifi_pass}");
    println!("cargo:rustc-env=MQTT_HOST={mqtt_host}");
    println!("cargo:rustc-env=MQTT_PORT={mqtt_port}");
    for var in ["WIFI_SSID", "WIFI_PASS", "MQTT_HOST", "MQTT_PORT"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    Ok(())
}

// EOF
