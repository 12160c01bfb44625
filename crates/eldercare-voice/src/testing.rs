//! Fake vendor client for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eldercare_core::config::VoiceConfig;

use crate::client::{ClientOptions, EventSender, VoiceClient, VoiceConnector, VoiceEvent};
use crate::error::{Result, VoiceError};

pub(crate) fn voice_config() -> VoiceConfig {
    VoiceConfig {
        endpoint: Some("wss://bot.test/ws".into()),
        ..VoiceConfig::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Stats {
    pub builds: usize,
    pub connects: usize,
    pub disconnects: usize,
}

#[derive(Debug, Default)]
struct Shared {
    stats: Stats,
    last_endpoint: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeConnector {
    fail_connect: bool,
    fail_disconnect: bool,
    shared: Arc<Mutex<Shared>>,
}

impl FakeConnector {
    /// Connector whose clients fail to connect.
    pub(crate) fn failing_connect() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    /// Connector whose clients fail to disconnect.
    pub(crate) fn failing_disconnect() -> Self {
        Self {
            fail_disconnect: true,
            ..Self::default()
        }
    }

    #[allow(clippy::unwrap_used)]
    pub(crate) fn stats(&self) -> Stats {
        self.shared.lock().unwrap().stats
    }

    #[allow(clippy::unwrap_used)]
    pub(crate) fn last_endpoint(&self) -> Option<String> {
        self.shared.lock().unwrap().last_endpoint.clone()
    }
}

struct FakeClient {
    fail_connect: bool,
    fail_disconnect: bool,
    events: EventSender,
    shared: Arc<Mutex<Shared>>,
}

#[async_trait]
impl VoiceConnector for FakeConnector {
    #[allow(clippy::unwrap_used)]
    async fn build(&self, _options: ClientOptions, events: EventSender) -> Result<Box<dyn VoiceClient>> {
        self.shared.lock().unwrap().stats.builds += 1;
        Ok(Box::new(FakeClient {
            fail_connect: self.fail_connect,
            fail_disconnect: self.fail_disconnect,
            events,
            shared: Arc::clone(&self.shared),
        }))
    }
}

#[async_trait]
impl VoiceClient for FakeClient {
    async fn init_devices(&mut self) -> Result<()> {
        Ok(())
    }

    #[allow(clippy::unwrap_used)]
    async fn connect(&mut self, endpoint: &str) -> Result<()> {
        {
            let mut shared = self.shared.lock().unwrap();
            shared.stats.connects += 1;
            shared.last_endpoint = Some(endpoint.to_string());
        }
        if self.fail_connect {
            let _ = self.events.send(VoiceEvent::Error {
                message: "bot unreachable".into(),
            });
            return Err(VoiceError::Vendor("bot unreachable".into()));
        }
        let _ = self.events.send(VoiceEvent::Connected);
        let _ = self.events.send(VoiceEvent::BotReady);
        Ok(())
    }

    #[allow(clippy::unwrap_used)]
    async fn disconnect(&mut self) -> Result<()> {
        self.shared.lock().unwrap().stats.disconnects += 1;
        if self.fail_disconnect {
            return Err(VoiceError::Vendor("already gone".into()));
        }
        let _ = self.events.send(VoiceEvent::Disconnected);
        Ok(())
    }
}
