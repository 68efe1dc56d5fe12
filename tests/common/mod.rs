// tests/common/mod.rs

#![allow(dead_code)]

use std::{collections::VecDeque, convert::Infallible};

use anyhow::bail;
use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, OutputPin},
};
use esp32pubsub::*;

/// Records every requested sleep instead of sleeping.
#[derive(Debug, Default)]
pub struct FakeDelay {
    pub sleeps_ms: Vec<u32>,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.sleeps_ms.push(ms);
    }
}

/// In-memory broker connection that refuses the first `fail_connects`
/// connection attempts.
#[derive(Debug, Default)]
pub struct FakeTransport {
    pub fail_connects: u32,
    pub connect_calls: u32,
    pub client_ids: Vec<String>,
    pub connected: bool,
    pub subscriptions: Vec<String>,
    pub published: Vec<Message>,
    pub inbox: VecDeque<Message>,
    pub service_calls: u32,
    pub fail_publish: bool,
    /// Connect attempts that report an error although the broker already
    /// accepted the session.
    pub late_acks: u32,
    pub fail_subscribes: u32,
    pub subscribe_calls: u32,
}

impl FakeTransport {
    pub fn failing(n: u32) -> Self {
        Self {
            fail_connects: n,
            ..Default::default()
        }
    }

    pub fn deliver(&mut self, topic: &str, payload: &[u8]) {
        self.inbox.push_back(Message::new(topic, payload));
    }

    pub fn drop_connection(&mut self) {
        self.connected = false;
    }
}

impl MqttTransport for FakeTransport {
    fn connect(&mut self, client_id: &str) -> anyhow::Result<()> {
        self.connect_calls += 1;
        self.client_ids.push(client_id.to_string());
        if self.connect_calls <= self.fail_connects {
            bail!("connection refused");
        }
        self.connected = true;
        if self.connect_calls <= self.fail_connects + self.late_acks {
            bail!("timeout");
        }
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> anyhow::Result<()> {
        self.subscribe_calls += 1;
        if !self.connected {
            bail!("not connected");
        }
        if self.subscribe_calls <= self.fail_subscribes {
            bail!("subscribe rejected");
        }
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> anyhow::Result<()> {
        if self.fail_publish {
            bail!("socket closed");
        }
        self.published.push(Message::new(topic, payload));
        Ok(())
    }

    fn service(&mut self) -> anyhow::Result<()> {
        self.service_calls += 1;
        Ok(())
    }

    fn try_recv(&mut self) -> Option<Message> {
        self.inbox.pop_front()
    }
}

/// Output pin that remembers its level and every write.
#[derive(Debug, Default)]
pub struct FakePin {
    pub high: bool,
    pub writes: Vec<bool>,
}

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        self.writes.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        self.writes.push(true);
        Ok(())
    }
}

/// Hands out canned readings in order, then failures.
pub struct ScriptedSensor {
    pub readings: VecDeque<Reading>,
    pub reads: u32,
}

impl ScriptedSensor {
    pub fn new(readings: impl IntoIterator<Item = Reading>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            reads: 0,
        }
    }
}

impl Sensor for ScriptedSensor {
    fn read(&mut self) -> Reading {
        self.reads += 1;
        self.readings.pop_front().unwrap_or_else(Reading::failed)
    }
}

// EOF
