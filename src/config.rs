// config.rs

use std::{fmt, time::Duration};

pub const SENSOR_TOPIC: &str = "sensor/temperature";
pub const LED_TOPIC: &str = "led/actuate";

const SENSOR_CLIENT_ID: &str = "ESP32Client";
const LED_CLIENT_ID: &str = "ESP32Client2";

const DEFAULT_MQTT_HOST: &str = "broker.hivemq.com";
const DEFAULT_MQTT_PORT: u16 = 1883;

const DEFAULT_WIFI_POLL_MS: u64 = 500;
const DEFAULT_MQTT_RETRY_MS: u64 = 5000;
const DEFAULT_PUBLISH_DELAY_MS: u64 = 2000;
const DEFAULT_LOOP_IDLE_MS: u64 = 10;
const DEFAULT_KEEP_ALIVE: u64 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
    Sensor,
    Led,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub pass: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("pass", &"********")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct MyConfig {
    pub role: NodeRole,
    pub wifi: Credentials,

    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_client_id: String,
    /// The one topic this node subscribes to after every (re)connect.
    pub mqtt_topic: String,

    pub wifi_poll: Duration,
    pub mqtt_retry: Duration,
    pub mqtt_keep_alive: Duration,
    pub publish_delay: Duration,
    pub loop_idle: Duration,
}

impl MyConfig {
    pub fn for_role(role: NodeRole) -> Self {
        let (client_id, topic) = match role {
            NodeRole::Sensor => (SENSOR_CLIENT_ID, SENSOR_TOPIC),
            NodeRole::Led => (LED_CLIENT_ID, LED_TOPIC),
        };

        Self {
            role,
            wifi: Credentials {
                ssid: option_env!("WIFI_SSID").unwrap_or("internet").into(),
                pass: option_env!("WIFI_PASS").unwrap_or("password").into(),
            },

            mqtt_host: option_env!("MQTT_HOST").unwrap_or(DEFAULT_MQTT_HOST).into(),
            mqtt_port: option_env!("MQTT_PORT")
                .unwrap_or("-")
                .parse()
                .unwrap_or(DEFAULT_MQTT_PORT),
            mqtt_client_id: client_id.into(),
            mqtt_topic: topic.into(),

            wifi_poll: Duration::from_millis(DEFAULT_WIFI_POLL_MS),
            mqtt_retry: Duration::from_millis(DEFAULT_MQTT_RETRY_MS),
            mqtt_keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE),
            publish_delay: Duration::from_millis(DEFAULT_PUBLISH_DELAY_MS),
            loop_idle: Duration::from_millis(DEFAULT_LOOP_IDLE_MS),
        }
    }

    pub fn sensor_node() -> Self {
        Self::for_role(NodeRole::Sensor)
    }

    pub fn led_node() -> Self {
        Self::for_role(NodeRole::Led)
    }

    pub fn mqtt_url(&self) -> String {
        format!("mqtt://{}:{}", self.mqtt_host, self.mqtt_port)
    }
}


// EOF
