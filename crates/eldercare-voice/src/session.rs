//! Voice session lifecycle.
//!
//! A [`VoiceSession`] owns at most one vendor client. The client is built on
//! `start` and torn down on `stop`, so two sessions never share a connection.

use std::sync::Arc;
use std::time::Duration;

use eldercare_core::config::VoiceConfig;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::client::{ClientOptions, VoiceClient, VoiceConnector, VoiceEvent};
use crate::error::{Result, VoiceError};
use crate::permission::MicrophonePermission;

/// How long `stop` waits for the event pump to drain after disconnecting.
const EVENT_DRAIN: Duration = Duration::from_millis(250);

const EVENT_BUFFER: usize = 64;

struct ActiveSession {
    id: Uuid,
    client: Box<dyn VoiceClient>,
    events: JoinHandle<()>,
}

pub struct VoiceSession {
    connector: Arc<dyn VoiceConnector>,
    permission: Arc<dyn MicrophonePermission>,
    config: VoiceConfig,
    active: Option<ActiveSession>,
    subscribers: broadcast::Sender<VoiceEvent>,
}

impl std::fmt::Debug for VoiceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceSession")
            .field("config", &self.config)
            .field("active", &self.active.as_ref().map(|a| a.id))
            .finish_non_exhaustive()
    }
}

impl VoiceSession {
    pub fn new(
        connector: Arc<dyn VoiceConnector>,
        permission: Arc<dyn MicrophonePermission>,
        config: VoiceConfig,
    ) -> Self {
        let (subscribers, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            connector,
            permission,
            config,
            active: None,
            subscribers,
        }
    }

    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Id of the current connection, if any. A new id is minted per start.
    pub fn session_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|a| a.id)
    }

    /// Receive client events (transcripts, connection changes) for this
    /// session and any later restarts.
    pub fn subscribe(&self) -> broadcast::Receiver<VoiceEvent> {
        self.subscribers.subscribe()
    }

    /// Build a client and connect it. No-op when already connected.
    ///
    /// On failure the partially built client is dropped and the session stays
    /// idle.
    pub async fn start(&mut self) -> Result<()> {
        if self.active.is_some() {
            debug!("Voice session already running");
            return Ok(());
        }

        let endpoint = self
            .config
            .endpoint
            .clone()
            .ok_or_else(|| VoiceError::Config("no voice endpoint configured".into()))?;

        if self.config.enable_mic && !self.permission.request().await.is_granted() {
            warn!("Microphone permission denied");
            return Err(VoiceError::PermissionDenied);
        }

        let options = ClientOptions {
            enable_mic: self.config.enable_mic,
            enable_cam: self.config.enable_cam,
        };
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut client = self.connector.build(options, tx).await?;
        let events = tokio::spawn(pump_events(id, rx, self.subscribers.clone()));

        info!(%id, "Initializing devices");
        if let Err(e) = client.init_devices().await {
            error!(%id, error = %e, "Failed to initialize devices");
            events.abort();
            return Err(e);
        }

        info!(%id, %endpoint, "Connecting to bot");
        if let Err(e) = client.connect(&endpoint).await {
            error!(%id, error = %e, "Failed to start streaming");
            if let Err(e) = client.disconnect().await {
                debug!(%id, error = %e, "Cleanup disconnect failed");
            }
            events.abort();
            return Err(e);
        }

        info!(%id, "Streaming started");
        self.active = Some(ActiveSession { id, client, events });
        Ok(())
    }

    /// Disconnect and tear down. No-op when not connected.
    ///
    /// The session is idle afterwards even if the vendor reports an error.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(ActiveSession {
            id,
            mut client,
            mut events,
        }) = self.active.take()
        else {
            return Ok(());
        };

        let result = client.disconnect().await;
        drop(client);
        if tokio::time::timeout(EVENT_DRAIN, &mut events).await.is_err() {
            events.abort();
        }

        match result {
            Ok(()) => {
                info!(%id, "Streaming stopped");
                Ok(())
            }
            Err(e) => {
                error!(%id, error = %e, "Error stopping streaming");
                Err(e)
            }
        }
    }
}

/// Log vendor callbacks and fan them out to subscribers.
async fn pump_events(
    id: Uuid,
    mut rx: mpsc::UnboundedReceiver<VoiceEvent>,
    subscribers: broadcast::Sender<VoiceEvent>,
) {
    while let Some(event) = rx.recv().await {
        match &event {
            VoiceEvent::Connected => info!(%id, "Connected to bot"),
            VoiceEvent::Disconnected => info!(%id, "Disconnected"),
            VoiceEvent::BotReady => info!(%id, "Bot ready"),
            VoiceEvent::UserTranscript { text, is_final } => {
                if *is_final {
                    info!(%id, user = %text, "User transcript");
                }
            }
            VoiceEvent::BotTranscript { text } => info!(%id, bot = %text, "Bot transcript"),
            VoiceEvent::Error { message } => error!(%id, %message, "Voice client error"),
        }
        // No receivers is fine.
        let _ = subscribers.send(event);
    }
}
