// mqtt.rs

use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::*;

use crate::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// A broker connection as seen by the session. Implementations are expected
/// to be cheap to poll; only `connect` may block.
pub trait MqttTransport {
    fn connect(&mut self, client_id: &str) -> anyhow::Result<()>;
    fn is_connected(&mut self) -> bool;
    fn subscribe(&mut self, topic: &str) -> anyhow::Result<()>;
    fn publish(&mut self, topic: &str, payload: &[u8]) -> anyhow::Result<()>;
    /// Keep-alive and other housekeeping.
    fn service(&mut self) -> anyhow::Result<()>;
    fn try_recv(&mut self) -> Option<Message>;
}

/// Receives inbound messages from inside `MqttSession::pump()`.
/// Runs on the main loop, so it must return quickly.
pub trait MessageHandler {
    fn on_message(&mut self, msg: &Message);
}

impl<F: FnMut(&Message)> MessageHandler for F {
    fn on_message(&mut self, msg: &Message) {
        self(msg)
    }
}

/// Handler for nodes that subscribe but have nothing to do with the data.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogOnly;

impl MessageHandler for LogOnly {
    fn on_message(&mut self, msg: &Message) {
        info!("MQTT received on {}: {:?}", msg.topic, msg.text());
    }
}

pub struct MqttSession<T, H> {
    transport: T,
    handler: H,
    client_id: String,
    topic: String,
    retry: RetryPolicy,
    state: LinkState,
}

impl<T: MqttTransport, H: MessageHandler> MqttSession<T, H> {
    pub fn new(transport: T, config: &MyConfig, handler: H) -> Self {
        Self {
            transport,
            handler,
            client_id: config.mqtt_client_id.clone(),
            topic: config.mqtt_topic.clone(),
            retry: RetryPolicy::forever(config.mqtt_retry),
            state: LinkState::Disconnected,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry.interval
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn is_connected(&mut self) -> bool {
        let up = self.transport.is_connected();
        if !up && self.state == LinkState::Connected {
            warn!("MQTT connection lost.");
            self.state = LinkState::Disconnected;
        }
        up
    }

    /// No-op while connected. Otherwise blocks until a session is open and
    /// the node topic is subscribed again. Every attempt calls `connect`,
    /// and a failed subscribe counts as a failed attempt.
    pub fn connect_or_reconnect<D: DelayNs>(&mut self, delay: &mut D) -> anyhow::Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        self.state = LinkState::Connecting;
        let client_id = self.client_id.as_str();
        let topic = self.topic.as_str();
        let transport = &mut self.transport;

        let res = self.retry.run(delay, "MQTT connect", |n| {
            info!("MQTT connecting as {client_id} (attempt #{n})...");
            if let Err(e) = transport.connect(client_id) {
                error!("MQTT connection failed: {e:#}");
                return Err(e);
            }
            info!("MQTT connected.");
            if let Err(e) = transport.subscribe(topic) {
                error!("MQTT subscribe to {topic} failed: {e:#}");
                return Err(e);
            }
            info!("MQTT subscribed to {topic}");
            Ok(())
        });

        self.state = if res.is_ok() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        };
        res
    }

    /// Fire-and-forget. The error is returned for the caller to log.
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> anyhow::Result<()> {
        debug!("MQTT sending {topic}");
        self.transport.publish(topic, payload)
    }

    /// Must run every loop iteration, even when idle. Returns how many
    /// messages were handed to the handler.
    pub fn pump(&mut self) -> usize {
        if let Err(e) = self.transport.service() {
            warn!("MQTT service error: {e:#}");
        }

        let mut n = 0;
        while let Some(msg) = self.transport.try_recv() {
            self.handler.on_message(&msg);
            n += 1;
        }
        n
    }
}

#[cfg(target_os = "espidf")]
pub use esp::*;

#[cfg(target_os = "espidf")]
mod esp {
    use std::sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        mpsc::{self, Receiver, SyncSender, TrySendError},
        Arc,
    };
    use std::time::Duration;

    use anyhow::bail;
    use embedded_svc::mqtt::client::{Details, EventPayload, QoS};
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_svc::mqtt::client::{EspMqttClient, MqttClientConfiguration};
    use log::*;

    use super::{Message, MqttTransport};

    const INBOX_SIZE: usize = 8;
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    const CONNECT_POLL_MS: u32 = 50;

    /// `EspMqttClient` runs its own task and reconnects by itself once
    /// created; this wrapper only mirrors its state into the main loop.
    /// A session the client re-established on its own reads as not
    /// connected until the next `connect()`, so the topic gets subscribed
    /// again.
    pub struct EspMqttTransport {
        url: String,
        keep_alive: Duration,
        client: Option<EspMqttClient<'static>>,
        link: Arc<LinkFlags>,
        seen_sessions: u32,
        inbox: Option<Receiver<Message>>,
    }

    #[derive(Default)]
    struct LinkFlags {
        connected: AtomicBool,
        sessions: AtomicU32,
    }

    impl EspMqttTransport {
        pub fn new(url: impl Into<String>, keep_alive: Duration) -> Self {
            Self {
                url: url.into(),
                keep_alive,
                client: None,
                link: Arc::new(LinkFlags::default()),
                seen_sessions: 0,
                inbox: None,
            }
        }

        fn start(&mut self, client_id: &str) -> anyhow::Result<()> {
            let (tx, rx) = mpsc::sync_channel::<Message>(INBOX_SIZE);
            let link = self.link.clone();
            let conf = MqttClientConfiguration {
                client_id: Some(client_id),
                keep_alive_interval: Some(self.keep_alive),
                ..Default::default()
            };

            let client = EspMqttClient::new_cb(&self.url, &conf, move |event| {
                on_event(event.payload(), &link, &tx)
            })?;
            self.client = Some(client);
            self.inbox = Some(rx);
            Ok(())
        }
    }

    fn on_event<E: std::fmt::Debug>(payload: EventPayload<'_, E>, link: &LinkFlags, tx: &SyncSender<Message>) {
        match payload {
            EventPayload::Connected(_) => {
                link.sessions.fetch_add(1, Ordering::SeqCst);
                link.connected.store(true, Ordering::SeqCst);
            }
            EventPayload::Disconnected => link.connected.store(false, Ordering::SeqCst),
            EventPayload::Received {
                topic: Some(topic),
                data,
                details: Details::Complete,
                ..
            } => match tx.try_send(Message::new(topic, data)) {
                Ok(()) => {}
                Err(TrySendError::Full(m)) => warn!("MQTT inbox full, dropped message on {}", m.topic),
                Err(TrySendError::Disconnected(_)) => {}
            },
            EventPayload::Received { details, .. } => {
                warn!("MQTT ignoring fragmented message: {details:?}");
            }
            EventPayload::Error(e) => error!("MQTT error: {e:?}"),
            _ => {}
        }
    }

    impl MqttTransport for EspMqttTransport {
        fn connect(&mut self, client_id: &str) -> anyhow::Result<()> {
            if self.client.is_none() {
                info!("MQTT client for {} starting...", self.url);
                self.start(client_id)?;
            }

            let mut waited = Duration::ZERO;
            while !self.link.connected.load(Ordering::SeqCst) {
                if waited >= CONNECT_TIMEOUT {
                    bail!("no CONNACK from {} within {CONNECT_TIMEOUT:?}", self.url);
                }
                FreeRtos::delay_ms(CONNECT_POLL_MS);
                waited += Duration::from_millis(CONNECT_POLL_MS as u64);
            }
            self.seen_sessions = self.link.sessions.load(Ordering::SeqCst);
            Ok(())
        }

        fn is_connected(&mut self) -> bool {
            self.client.is_some()
                && self.link.connected.load(Ordering::SeqCst)
                && self.link.sessions.load(Ordering::SeqCst) == self.seen_sessions
        }

        fn subscribe(&mut self, topic: &str) -> anyhow::Result<()> {
            let Some(client) = self.client.as_mut() else {
                bail!("MQTT client not started");
            };
            client.subscribe(topic, QoS::AtMostOnce)?;
            Ok(())
        }

        fn publish(&mut self, topic: &str, payload: &[u8]) -> anyhow::Result<()> {
            let Some(client) = self.client.as_mut() else {
                bail!("MQTT client not started");
            };
            client.publish(topic, QoS::AtMostOnce, false, payload)?;
            Ok(())
        }

        // keep-alive is handled by the esp-mqtt task
        fn service(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn try_recv(&mut self) -> Option<Message> {
            self.inbox.as_ref()?.try_recv().ok()
        }
    }
}

// EOF
