//! Microphone toggle control.
//!
//! Flips between listening and idle, starting or stopping the owned
//! [`VoiceSession`]. Vendor and permission failures are logged, never
//! returned, so a flaky connection cannot break the control.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::VoiceError;
use crate::meter::{LevelMeter, LevelSink};
use crate::session::VoiceSession;

type Callback = Box<dyn Fn() + Send + Sync>;

pub struct VoiceToggle {
    session: VoiceSession,
    listening: bool,
    /// Listening state supplied by the owner. When set, the toggle never
    /// changes its own state.
    controlled: Option<bool>,
    on_start: Option<Callback>,
    on_stop: Option<Callback>,
    level: Option<(Duration, LevelSink)>,
    meter: Option<LevelMeter>,
}

impl std::fmt::Debug for VoiceToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceToggle")
            .field("session", &self.session)
            .field("listening", &self.is_listening())
            .field("controlled", &self.controlled.is_some())
            .finish_non_exhaustive()
    }
}

impl VoiceToggle {
    pub fn new(session: VoiceSession) -> Self {
        Self {
            session,
            listening: false,
            controlled: None,
            on_start: None,
            on_stop: None,
            level: None,
            meter: None,
        }
    }

    /// Run `f` after every start attempt, successful or not.
    #[must_use]
    pub fn on_start(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Run `f` after every stop.
    #[must_use]
    pub fn on_stop(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_stop = Some(Box::new(f));
        self
    }

    /// Feed simulated input levels to `sink` while listening.
    #[must_use]
    pub fn with_level_meter(mut self, interval: Duration, sink: LevelSink) -> Self {
        self.level = Some((interval, sink));
        self
    }

    /// Hand control of the listening state to the owner, or take it back with
    /// `None`.
    pub fn set_listening_override(&mut self, listening: Option<bool>) {
        self.controlled = listening;
    }

    pub fn is_listening(&self) -> bool {
        self.controlled.unwrap_or(self.listening)
    }

    pub const fn session(&self) -> &VoiceSession {
        &self.session
    }

    pub fn accessibility_label(&self) -> &'static str {
        if self.is_listening() {
            "Stop streaming"
        } else {
            "Start streaming"
        }
    }

    /// Flip the control and return the new listening state.
    pub async fn toggle(&mut self) -> bool {
        if self.is_listening() {
            self.stop().await;
        } else {
            self.start().await;
        }
        self.is_listening()
    }

    /// Stop any running session before dropping the control.
    pub async fn shutdown(mut self) {
        if self.session.is_active() || self.meter.is_some() {
            self.stop().await;
        }
    }

    async fn start(&mut self) {
        if self.controlled.is_none() {
            self.listening = true;
        }
        match self.session.start().await {
            Ok(()) => {
                info!("VoiceToggle: started streaming");
                if let Some((interval, sink)) = &self.level {
                    if self.meter.is_none() {
                        self.meter = Some(LevelMeter::spawn(*interval, sink.clone()));
                    }
                }
            }
            Err(VoiceError::PermissionDenied) => warn!("VoiceToggle: microphone permission denied"),
            Err(e) => warn!(error = %e, "VoiceToggle: start streaming failed"),
        }
        if let Some(f) = &self.on_start {
            f();
        }
    }

    async fn stop(&mut self) {
        if self.controlled.is_none() {
            self.listening = false;
        }
        if let Err(e) = self.session.stop().await {
            debug!(error = %e, "VoiceToggle: ignoring stop failure");
        }
        if let Some(meter) = self.meter.take() {
            meter.stop().await;
        }
        if let Some(f) = &self.on_stop {
            f();
        }
        info!("VoiceToggle: stopped streaming");
    }
}
