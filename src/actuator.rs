// actuator.rs

use embedded_hal::digital::OutputPin;
use log::*;

use crate::*;

const ON: &[u8] = b"ON";
const OFF: &[u8] = b"OFF";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    On,
    Off,
}

impl Command {
    /// Exactly `ON` on exactly the control topic means on, anything else
    /// means off.
    pub fn from_message(msg: &Message, control_topic: &str) -> Self {
        if msg.topic.as_bytes() == control_topic.as_bytes() && msg.payload == ON {
            Command::On
        } else {
            Command::Off
        }
    }
}

/// Drives one output pin from messages on the control topic.
pub struct LedHandler<P> {
    pin: P,
    topic: String,
    last: Option<Command>,
}

impl<P: OutputPin> LedHandler<P> {
    pub fn new(pin: P, topic: impl Into<String>) -> Self {
        Self {
            pin,
            topic: topic.into(),
            last: None,
        }
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    pub fn last_command(&self) -> Option<Command> {
        self.last
    }

    pub fn apply(&mut self, cmd: Command) {
        let res = match cmd {
            Command::On => self.pin.set_high(),
            Command::Off => self.pin.set_low(),
        };
        if let Err(e) = res {
            error!("LED pin error: {e:?}");
        }
        self.last = Some(cmd);
    }
}

impl<P: OutputPin> MessageHandler for LedHandler<P> {
    fn on_message(&mut self, msg: &Message) {
        let text = msg.text();
        info!("MQTT received on {}: {text:?}", msg.topic);

        if msg.topic != self.topic {
            warn!("Unexpected topic {}, switching LED off", msg.topic);
        } else if msg.payload != ON && msg.payload != OFF {
            warn!("Unknown command {text:?}, switching LED off");
        }

        let cmd = Command::from_message(msg, &self.topic);
        self.apply(cmd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_on_is_on() {
        let t = "led/actuate";
        assert_eq!(Command::from_message(&Message::new(t, "ON"), t), Command::On);
        for p in ["OFF", "on", "On", "ON ", " ON", "", "1", "ONN"] {
            assert_eq!(Command::from_message(&Message::new(t, p), t), Command::Off, "{p:?}");
        }
        assert_eq!(
            Command::from_message(&Message::new(t, vec![0x4f, 0x4e, 0x00]), t),
            Command::Off
        );
        assert_eq!(
            Command::from_message(&Message::new(t, vec![0xff, 0xfe]), t),
            Command::Off
        );
    }

    #[test]
    fn topic_must_match_exactly() {
        let t = "led/actuate";
        for topic in ["LED/actuate", "led/actuate/", "led/+", "sensor/temperature", ""] {
            assert_eq!(
                Command::from_message(&Message::new(topic, "ON"), t),
                Command::Off,
                "{topic:?}"
            );
        }
    }
}

// EOF
