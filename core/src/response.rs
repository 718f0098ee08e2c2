//! Command results and transient user notices.

use serde::{Deserialize, Serialize};


/// Outcome of one `Sys::execute` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ok { output: String },
    Error { message: String },
}


impl Response {
    pub fn ok(output: impl Into<String>) -> Self {
        Response::Ok { output: output.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error { message: message.into() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }

    pub fn text(&self) -> &str {
        match self {
            Response::Ok { output } => output,
            Response::Error { message } => message,
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}


/// A toast the renderer shows until `expires_at_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub expires_at_ms: u64,
}


pub const NOTICE_LIFETIME_MS: u64 = 3000;


impl Notice {
    pub fn new(message: impl Into<String>, level: NoticeLevel, now_ms: u64) -> Self {
        Notice {
            message: message.into(),
            level,
            expires_at_ms: now_ms.saturating_add(NOTICE_LIFETIME_MS),
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_expires_after_lifetime() {
        let n = Notice::new("Configuration reloaded", NoticeLevel::Info, 1000);
        assert!(!n.is_expired(3999));
        assert!(n.is_expired(4000));
    }

    #[test]
    fn response_serializes_with_status_tag() {
        let yaml = serde_yaml::to_string(&Response::error("nope")).unwrap();
        assert!(yaml.contains("status: error"));
        assert!(yaml.contains("message: nope"));
    }
}
