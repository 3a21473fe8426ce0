//! Transient user-visible notifications.

use std::time::{Duration, Instant};

use log::{debug, error, info};

use crate::observers::{Observers, SubscriptionId};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3500);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ToastKind {
    Error,
    Simple,
    Loading,
    Success,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub title: Option<String>,
    pub message: String,
    /// `None` for loading toasts, which stay until closed.
    pub expires_at: Option<Instant>,
}

/// Sink for user-facing failure and progress reports.
pub trait Notify {
    fn show(&mut self, kind: ToastKind, message: &str, title: Option<&str>) -> u64;
    fn close(&mut self, id: u64);
}

#[derive(Debug)]
pub struct ToastManager {
    toasts: Vec<Toast>,
    next_id: u64,
    timeout: Duration,
    on_close: Observers<u64>,
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ToastManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 0,
            timeout,
            on_close: Observers::new(),
        }
    }

    pub fn show_at(&mut self, kind: ToastKind, message: &str, title: Option<&str>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        match kind {
            ToastKind::Error => error!("{}", message),
            _ => info!("{}", message),
        }
        let expires_at = match kind {
            ToastKind::Loading => None,
            _ => Some(now + self.timeout),
        };
        self.toasts.push(Toast {
            id,
            kind,
            title: title.map(str::to_string),
            message: message.to_string(),
            expires_at,
        });
        id
    }

    /// Replace the text of a live toast, e.g. a loading notice making progress.
    pub fn update_message(&mut self, id: u64, message: &str) -> bool {
        match self.toasts.iter_mut().find(|t| t.id == id) {
            Some(t) => {
                t.message = message.to_string();
                true
            }
            None => false,
        }
    }

    /// Close every toast whose time is up.
    pub fn prune(&mut self, now: Instant) {
        let expired: Vec<u64> = self
            .toasts
            .iter()
            .filter(|t| t.expires_at.is_some_and(|at| at <= now))
            .map(|t| t.id)
            .collect();
        for id in expired {
            self.close(id);
        }
    }

    pub fn on_close<F>(&mut self, hook: F) -> SubscriptionId
    where
        F: FnMut(&u64) + 'static,
    {
        self.on_close.subscribe(hook)
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

impl Notify for ToastManager {
    fn show(&mut self, kind: ToastKind, message: &str, title: Option<&str>) -> u64 {
        self.show_at(kind, message, title, Instant::now())
    }

    fn close(&mut self, id: u64) {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        if self.toasts.len() != before {
            debug!("toast {id} closed");
            self.on_close.notify(&id);
        }
    }
}

/// Report the outcome of a daemon call started under loading toast `loading`.
///
/// The loading toast is closed whatever the outcome; a failure adds one error toast.
pub fn finish<T, E: std::fmt::Display>(
    notify: &mut dyn Notify,
    loading: u64,
    result: Result<T, E>,
    what: &str,
) -> Option<T> {
    notify.close(loading);
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            notify.show(ToastKind::Error, &format!("{what}: {e}"), Some("Error"));
            None
        }
    }
}
