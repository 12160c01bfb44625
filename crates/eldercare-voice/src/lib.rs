//! Eldercare voice session
//!
//! The microphone toggle and the session it drives:
//! - [`VoiceSession`] owns one real-time voice client between `start` and `stop`
//! - [`VoiceToggle`] is the button-level control that never fails on vendor errors
//! - [`MicrophonePermission`] and [`VoiceConnector`] are the platform/vendor seams
//! - [`meter`] provides level normalisation and the heartbeat fallback

pub mod client;
pub mod error;
pub mod meter;
pub mod permission;
pub mod session;
pub mod toggle;

pub use client::{ClientOptions, EventSender, VoiceClient, VoiceConnector, VoiceEvent};
pub use error::{Result, VoiceError};
pub use meter::{LevelMeter, LevelSink};
pub use permission::{MicrophonePermission, PermissionStatus, StaticPermission};
pub use session::VoiceSession;
pub use toggle::VoiceToggle;

#[cfg(test)]
pub(crate) mod testing;
