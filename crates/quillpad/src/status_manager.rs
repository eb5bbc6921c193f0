use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
}

impl MessageKind {
    fn display_duration(&self) -> Duration {
        match self {
            MessageKind::Info => Duration::from_secs(3),
            MessageKind::Success => Duration::from_secs(2),
            MessageKind::Warning => Duration::from_secs(5),
            MessageKind::Error => Duration::from_secs(7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub content: String,
    pub kind: MessageKind,
    created_at: Instant,
}

impl StatusMessage {
    fn new(content: String, kind: MessageKind) -> Self {
        Self {
            content,
            kind,
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.kind.display_duration()
    }
}

/// The one-line status feed: a single current message that expires on its
/// own after a kind-dependent delay.
#[derive(Debug, Clone, Default)]
pub struct StatusManager {
    current: Option<StatusMessage>,
}

impl StatusManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_info(&mut self, message: String) {
        self.current = Some(StatusMessage::new(message, MessageKind::Info));
    }

    pub fn set_success(&mut self, message: String) {
        self.current = Some(StatusMessage::new(message, MessageKind::Success));
    }

    pub fn set_warning(&mut self, message: String) {
        self.current = Some(StatusMessage::new(message, MessageKind::Warning));
    }

    pub fn set_error(&mut self, message: String) {
        self.current = Some(StatusMessage::new(message, MessageKind::Error));
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Drop the message once its display time has passed.
    pub fn update(&mut self) {
        if let Some(ref message) = self.current {
            if message.is_expired() {
                self.current = None;
            }
        }
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    pub fn has_message(&self) -> bool {
        self.current.is_some()
    }
}
