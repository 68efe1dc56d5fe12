// publisher.rs

use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::*;

use crate::*;

/// Device 1 main loop body: keep the session up, sample, publish, wait.
pub struct PublisherLoop<S> {
    sensor: S,
    topic: String,
    delay: Duration,
}

impl<S: Sensor> PublisherLoop<S> {
    pub fn new(sensor: S, config: &MyConfig) -> Self {
        Self {
            sensor,
            topic: SENSOR_TOPIC.into(),
            delay: config.publish_delay,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// One iteration. Returns whether a complete reading was handed to the
    /// broker client without error.
    pub fn run_once<T, H, D>(&mut self, mqtt: &mut MqttSession<T, H>, delay: &mut D) -> anyhow::Result<bool>
    where
        T: MqttTransport,
        H: MessageHandler,
        D: DelayNs,
    {
        mqtt.connect_or_reconnect(delay)?;
        mqtt.pump();

        let reading = self.sensor.read();
        let published = match reading.payload() {
            Some(payload) => {
                info!("Publishing {payload:?} to {}", self.topic);
                match mqtt.publish(&self.topic, payload.as_bytes()) {
                    Ok(()) => true,
                    Err(e) => {
                        error!("MQTT send error: {e:#}");
                        false
                    }
                }
            }
            None => {
                debug!("Sensor read failed: {reading:?}");
                false
            }
        };

        delay.delay_ms(u32::try_from(self.delay.as_millis()).unwrap_or(u32::MAX));
        Ok(published)
    }
}

// EOF
