//! Tool State
//!
//! Lifecycle of one on-demand result tool. A slot moves
//! `Idle -> Loading -> Ready | Failed` and back to `Idle` on dismiss or
//! cancel. Each `begin` issues a ticket; only the completion carrying the
//! current ticket is applied.

use std::fmt;

/// Identifies one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of a result tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolState<T> {
    /// Not invoked, or dismissed
    Idle,
    /// Request in flight
    Loading,
    /// Payload available until dismissed
    Ready(T),
    /// Last attempt failed; user-facing reason
    Failed(String),
}

impl<T> ToolState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, ToolState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ToolState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ToolState::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ToolState::Failed(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            ToolState::Ready(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ToolState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToolState::Idle => "idle",
            ToolState::Loading => "loading",
            ToolState::Ready(_) => "ready",
            ToolState::Failed(_) => "failed",
        }
    }
}

impl<T> Default for ToolState<T> {
    fn default() -> Self {
        ToolState::Idle
    }
}

/// A tool's state plus the ticket of its in-flight invocation.
#[derive(Debug)]
pub(crate) struct ToolSlot<T> {
    state: ToolState<T>,
    pending: Option<Ticket>,
    issued: u64,
}

impl<T> ToolSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: ToolState::Idle,
            pending: None,
            issued: 0,
        }
    }

    pub(crate) fn state(&self) -> &ToolState<T> {
        &self.state
    }

    /// Enter `Loading`; `None` if already loading.
    ///
    /// A previous payload or failure is discarded.
    pub(crate) fn begin(&mut self) -> Option<Ticket> {
        if self.state.is_loading() {
            return None;
        }
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.state = ToolState::Loading;
        self.pending = Some(ticket);
        Some(ticket)
    }

    /// Apply a result; `false` if `ticket` is not the pending one.
    pub(crate) fn complete(&mut self, ticket: Ticket, result: Result<T, String>) -> bool {
        if self.pending != Some(ticket) {
            return false;
        }
        self.pending = None;
        self.state = match result {
            Ok(payload) => ToolState::Ready(payload),
            Err(reason) => ToolState::Failed(reason),
        };
        true
    }

    /// `Ready` or `Failed` back to `Idle`.
    pub(crate) fn dismiss(&mut self) -> bool {
        match self.state {
            ToolState::Ready(_) | ToolState::Failed(_) => {
                self.state = ToolState::Idle;
                true
            }
            ToolState::Idle | ToolState::Loading => false,
        }
    }

    /// `Loading` back to `Idle`; the pending completion becomes stale.
    pub(crate) fn cancel(&mut self) -> bool {
        if !self.state.is_loading() {
            return false;
        }
        self.pending = None;
        self.state = ToolState::Idle;
        true
    }
}
