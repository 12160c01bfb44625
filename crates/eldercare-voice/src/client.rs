//! Vendor real-time voice client seam.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// Device options passed to the vendor client when it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Capture the microphone.
    pub enable_mic: bool,
    /// Capture the camera.
    pub enable_cam: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            enable_mic: true,
            enable_cam: false,
        }
    }
}

/// Callbacks from the vendor client, delivered as messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    Connected,
    Disconnected,
    BotReady,
    UserTranscript { text: String, is_final: bool },
    BotTranscript { text: String },
    Error { message: String },
}

/// Channel the vendor client reports [`VoiceEvent`]s on.
pub type EventSender = mpsc::UnboundedSender<VoiceEvent>;

/// A connected-or-connectable real-time voice client.
#[async_trait]
pub trait VoiceClient: Send {
    /// Acquire audio devices. May prompt for permission on some platforms.
    async fn init_devices(&mut self) -> Result<()>;

    /// Start the bot and connect to it at `endpoint`.
    async fn connect(&mut self, endpoint: &str) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;
}

/// Builds a fresh [`VoiceClient`] for each session start.
#[async_trait]
pub trait VoiceConnector: Send + Sync {
    async fn build(&self, options: ClientOptions, events: EventSender) -> Result<Box<dyn VoiceClient>>;
}
