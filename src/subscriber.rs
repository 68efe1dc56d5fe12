// subscriber.rs

use std::time::Duration;

use embedded_hal::delay::DelayNs;

use crate::*;

/// Device 2 main loop body. All the work happens in the handler, which
/// `pump()` calls for each inbound message.
pub struct SubscriberLoop {
    idle: Duration,
}

impl SubscriberLoop {
    pub fn new(config: &MyConfig) -> Self {
        Self {
            idle: config.loop_idle,
        }
    }

    /// One iteration. Returns the number of messages handled.
    pub fn run_once<T, H, D>(&mut self, mqtt: &mut MqttSession<T, H>, delay: &mut D) -> anyhow::Result<usize>
    where
        T: MqttTransport,
        H: MessageHandler,
        D: DelayNs,
    {
        mqtt.connect_or_reconnect(delay)?;
        let n = mqtt.pump();

        // give the idle task a chance, or the task watchdog fires
        if !self.idle.is_zero() {
            delay.delay_ms(u32::try_from(self.idle.as_millis()).unwrap_or(u32::MAX));
        }
        Ok(n)
    }
}

// EOF
