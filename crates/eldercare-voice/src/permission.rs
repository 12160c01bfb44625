//! Platform microphone permission seam.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Asks the platform for recording permission.
#[async_trait]
pub trait MicrophonePermission: Send + Sync {
    async fn request(&self) -> PermissionStatus;
}

/// Fixed answer, for platforms without a runtime prompt.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission(pub PermissionStatus);

impl StaticPermission {
    pub const fn granted() -> Self {
        Self(PermissionStatus::Granted)
    }

    pub const fn denied() -> Self {
        Self(PermissionStatus::Denied)
    }
}

#[async_trait]
impl MicrophonePermission for StaticPermission {
    async fn request(&self) -> PermissionStatus {
        self.0
    }
}
