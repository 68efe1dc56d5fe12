// wifi.rs

use std::time::Duration;

use anyhow::bail;
use embedded_hal::delay::DelayNs;
use log::*;

use crate::*;

/// The radio side of a station-mode network link.
pub trait NetworkLink {
    /// Configure credentials and kick off association. Must not block.
    fn begin(&mut self, creds: &Credentials) -> anyhow::Result<()>;
    /// Non-blocking status check, called once per poll.
    fn poll_associated(&mut self) -> anyhow::Result<bool>;
}

pub struct NetworkSession<L> {
    link: L,
    poll: RetryPolicy,
    state: LinkState,
}

impl<L: NetworkLink> NetworkSession<L> {
    pub fn new(link: L, poll_interval: Duration) -> Self {
        Self::with_policy(link, RetryPolicy::forever(poll_interval))
    }

    pub fn with_policy(link: L, poll: RetryPolicy) -> Self {
        Self {
            link,
            poll,
            state: LinkState::Disconnected,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Blocks until the link is associated. Errors from the link are only
    /// logged; with the default policy this returns `Ok` or never returns.
    pub fn associate<D: DelayNs>(&mut self, creds: &Credentials, delay: &mut D) -> anyhow::Result<()> {
        info!("WiFi connecting to {:?}...", creds.ssid);
        self.state = LinkState::Connecting;
        if let Err(e) = self.link.begin(creds) {
            error!("WiFi begin failed: {e:#}");
        }

        let link = &mut self.link;
        let res = self.poll.run(delay, "WiFi association", |n| {
            info!("WiFi waiting for association... ({n})");
            match link.poll_associated() {
                Ok(true) => Ok(()),
                Ok(false) => bail!("not associated yet"),
                Err(e) => {
                    warn!("WiFi status error: {e:#}");
                    Err(e)
                }
            }
        });

        match res {
            Ok(()) => {
                info!("WiFi connected.");
                self.state = LinkState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = LinkState::Disconnected;
                Err(e)
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::*;

#[cfg(target_os = "espidf")]
mod esp {
    use anyhow::anyhow;
    use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
    use esp_idf_svc::wifi::EspWifi;
    use log::*;

    use super::NetworkLink;
    use crate::Credentials;

    // polls between two connect() calls while not associated
    const RECONNECT_POLLS: u32 = 20;

    pub struct EspWifiLink<'a> {
        wifi: EspWifi<'a>,
        polls: u32,
    }

    impl<'a> EspWifiLink<'a> {
        pub fn new(wifi: EspWifi<'a>) -> Self {
            Self { wifi, polls: 0 }
        }

        pub fn wifi(&self) -> &EspWifi<'a> {
            &self.wifi
        }
    }

    impl NetworkLink for EspWifiLink<'_> {
        fn begin(&mut self, creds: &Credentials) -> anyhow::Result<()> {
            let auth_method = if creds.pass.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPAWPA2Personal
            };

            info!("WiFi setting credentials...");
            self.wifi.set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: creds
                    .ssid
                    .as_str()
                    .try_into()
                    .map_err(|_| anyhow!("wifi ssid too long"))?,
                password: creds
                    .pass
                    .as_str()
                    .try_into()
                    .map_err(|_| anyhow!("wifi password too long"))?,
                auth_method,
                ..Default::default()
            }))?;

            info!("WiFi driver starting...");
            self.wifi.start()?;
            self.polls = 0;
            self.wifi.connect()?;
            Ok(())
        }

        fn poll_associated(&mut self) -> anyhow::Result<bool> {
            if self.wifi.is_connected()? && self.wifi.is_up()? {
                return Ok(true);
            }

            // ESP-IDF does not retry a failed association on its own
            self.polls += 1;
            if self.polls >= RECONNECT_POLLS {
                self.polls = 0;
                info!("WiFi reissuing connect...");
                if let Err(e) = self.wifi.connect() {
                    warn!("WiFi connect error: {e:?}");
                }
            }
            Ok(false)
        }
    }
}


// EOF
