//! Broadcast payloads
//!
//! A payload is classified once, when it is published. Every subscriber
//! then gets the same text or binary frame without rechecking the bytes.

use std::sync::Arc;

use bytes::Bytes;

/// One pre-serialized event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Valid UTF-8, delivered as a text frame
    Text(Arc<str>),
    /// Anything else, delivered as a binary frame
    Binary(Bytes),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        match std::str::from_utf8(&bytes) {
            Ok(text) => Self::Text(Arc::from(text)),
            Err(_) => Self::Binary(bytes),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(Arc::from(text)),
            Err(err) => Self::Binary(Bytes::from(err.into_bytes())),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(Arc::from(text))
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(Arc::from(text))
    }
}
