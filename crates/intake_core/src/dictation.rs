//! Voice dictation on top of an injected, possibly absent, speech-to-text capability.
//!
//! The bridge owns a single capture slot. Providers report progress asynchronously
//! through the [`CaptureEventSender`] handed to them on `start`; the owner drains
//! those events (or forwards them by hand) and appends any transcript it gets back.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, info, warn};

pub const DEFAULT_DICTATION_LOCALE: &str = "en-US";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaptureTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub ticket: CaptureTicket,
    pub locale: String,
    pub continuous: bool,
    pub interim_results: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEventKind {
    Transcript(String),
    Error(String),
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent {
    pub ticket: CaptureTicket,
    pub kind: CaptureEventKind,
}

impl CaptureEvent {
    pub fn transcript(ticket: CaptureTicket, text: impl Into<String>) -> Self {
        Self {
            ticket,
            kind: CaptureEventKind::Transcript(text.into()),
        }
    }

    pub fn error(ticket: CaptureTicket, reason: impl Into<String>) -> Self {
        Self {
            ticket,
            kind: CaptureEventKind::Error(reason.into()),
        }
    }

    pub fn end(ticket: CaptureTicket) -> Self {
        Self {
            ticket,
            kind: CaptureEventKind::End,
        }
    }
}

pub type CaptureEventSender = mpsc::UnboundedSender<CaptureEvent>;

pub trait TextCaptureProvider: Send + Sync {
    fn is_supported(&self) -> bool;
    /// Begins one single-utterance capture. Must not block waiting for speech.
    fn start(&self, request: CaptureRequest, events: CaptureEventSender) -> Result<()>;
    /// Best-effort; callers do not wait for acknowledgement.
    fn cancel(&self, ticket: CaptureTicket);
}

/// Stand-in for hosts without speech recognition.
pub struct UnsupportedTextCapture;

impl TextCaptureProvider for UnsupportedTextCapture {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&self, _request: CaptureRequest, _events: CaptureEventSender) -> Result<()> {
        Err(anyhow::anyhow!("speech capture is unavailable"))
    }

    fn cancel(&self, _ticket: CaptureTicket) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationState {
    Idle,
    Listening(CaptureTicket),
}

pub struct DictationBridge {
    provider: Arc<dyn TextCaptureProvider>,
    supported: bool,
    locale: String,
    state: DictationState,
    next_ticket: u64,
    events_tx: CaptureEventSender,
    events_rx: mpsc::UnboundedReceiver<CaptureEvent>,
}

impl DictationBridge {
    pub fn new(provider: Arc<dyn TextCaptureProvider>, locale: impl Into<String>) -> Self {
        let supported = provider.is_supported();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            provider,
            supported,
            locale: locale.into(),
            state: DictationState::Idle,
            next_ticket: 1,
            events_tx,
            events_rx,
        }
    }

    pub fn unsupported() -> Self {
        Self::new(Arc::new(UnsupportedTextCapture), DEFAULT_DICTATION_LOCALE)
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, DictationState::Listening(_))
    }

    pub fn state(&self) -> DictationState {
        self.state
    }

    /// Returns the ticket of the new capture, or `None` when nothing was started.
    pub fn start_listening(&mut self) -> Option<CaptureTicket> {
        if !self.supported || self.is_listening() {
            return None;
        }

        let ticket = CaptureTicket(self.next_ticket);
        self.next_ticket += 1;
        let request = CaptureRequest {
            ticket,
            locale: self.locale.clone(),
            continuous: false,
            interim_results: false,
        };

        match self.provider.start(request, self.events_tx.clone()) {
            Ok(()) => {
                info!(capture = ticket.0, locale = %self.locale, "dictation listening");
                self.state = DictationState::Listening(ticket);
                Some(ticket)
            }
            Err(err) => {
                warn!(capture = ticket.0, %err, "speech capture failed to start");
                None
            }
        }
    }

    pub fn stop_listening(&mut self) {
        if let DictationState::Listening(ticket) = self.state {
            self.provider.cancel(ticket);
            debug!(capture = ticket.0, "dictation cancelled");
        }
        self.state = DictationState::Idle;
    }

    /// Applies one provider event. Returns the transcript to append, if any.
    pub fn handle_event(&mut self, event: CaptureEvent) -> Option<String> {
        let DictationState::Listening(active) = self.state else {
            debug!(capture = event.ticket.0, "ignoring capture event while idle");
            return None;
        };
        if event.ticket != active {
            debug!(
                capture = event.ticket.0,
                active = active.0,
                "ignoring event from stale capture"
            );
            return None;
        }

        self.state = DictationState::Idle;
        match event.kind {
            CaptureEventKind::Transcript(text) => {
                let text = text.trim();
                if text.is_empty() {
                    debug!(capture = active.0, "capture produced an empty transcript");
                    None
                } else {
                    Some(text.to_string())
                }
            }
            CaptureEventKind::Error(reason) => {
                warn!(capture = active.0, %reason, "speech capture failed");
                None
            }
            CaptureEventKind::End => None,
        }
    }

    /// Pulls every event already queued by the provider without blocking.
    pub fn drain_events(&mut self) -> Vec<CaptureEvent> {
        let mut drained = Vec::new();
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => drained.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        drained
    }

    /// Cancels any capture and discards queued events.
    pub fn reset(&mut self) {
        self.stop_listening();
        let discarded = self.drain_events().len();
        if discarded > 0 {
            debug!(discarded, "discarded pending capture events");
        }
    }
}

/// Joins dictated text onto what the user already typed, separated by one space.
pub fn append_transcript(existing: &str, transcript: &str) -> String {
    if existing.is_empty() {
        transcript.to_string()
    } else if existing.ends_with(char::is_whitespace) {
        format!("{existing}{transcript}")
    } else {
        format!("{existing} {transcript}")
    }
}

#[cfg(test)]
#[path = "tests/dictation_tests.rs"]
mod tests;
