//! Live channel framing: one text message is `event\nJSON`.

use serde::Serialize;
use serde_json::Value;

use crate::library::SearchResults;

use super::error::DaemonError;

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub event: String,
    pub payload: Value,
}

impl Frame {
    pub fn new(event: impl Into<String>, payload: &impl Serialize) -> Result<Self, DaemonError> {
        Ok(Self {
            event: event.into(),
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Split a text message at its first newline. A message without one is
    /// a bare event with a `null` payload.
    pub fn parse(text: &str) -> Result<Self, DaemonError> {
        match text.split_once('\n') {
            Some((event, body)) => {
                let payload = if body.trim().is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(body)?
                };
                Ok(Self {
                    event: event.to_string(),
                    payload,
                })
            }
            None => Ok(Self {
                event: text.to_string(),
                payload: Value::Null,
            }),
        }
    }

    pub fn encode(&self) -> String {
        format!("{}\n{}", self.event, self.payload)
    }
}

/// What the daemon pushes at us.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// The library was re-indexed; `/media` is worth fetching again.
    LibraryChanged,
    SyncStart,
    SyncEnd,
    SearchResponse(SearchResults),
    LocalSearchResponse(SearchResults),
    Other(Frame),
}

impl From<Frame> for LiveEvent {
    fn from(frame: Frame) -> Self {
        match frame.event.as_str() {
            "libupdate" => LiveEvent::LibraryChanged,
            "syncstart" => LiveEvent::SyncStart,
            "syncend" | "synched" => LiveEvent::SyncEnd,
            "searchresponse" => match serde_json::from_value(frame.payload.clone()) {
                Ok(results) => LiveEvent::SearchResponse(results),
                Err(_) => LiveEvent::Other(frame),
            },
            "localsr" => match serde_json::from_value(frame.payload.clone()) {
                Ok(results) => LiveEvent::LocalSearchResponse(results),
                Err(_) => LiveEvent::Other(frame),
            },
            _ => LiveEvent::Other(frame),
        }
    }
}
