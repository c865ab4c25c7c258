//! Conversation Session
//!
//! Chat with the health assistant. History is append-only and starts with
//! a seeded greeting. At most one turn is in flight; every sent message
//! gets exactly one reply, either the assistant's or the failure sentinel.

use std::fmt;
use std::sync::Arc;

use clinical_intake_core::{
    ApiGateway, AppointmentConfirmation, AppointmentRequest, ChatHistoryEntry, ChatReply,
    ChatRequest, ConversationMessage, CoreResult,
};

/// First assistant message of every session.
pub const GREETING: &str = "Hello! I am Kira, your AI health assistant. I can help you with health questions or book an appointment. How can I assist you today?";

/// Reply appended when a turn fails.
pub const FAILURE_SENTINEL: &str = "I'm having trouble connecting right now. Please try again.";

/// In-flight chat turn.
pub struct ChatTurn {
    turn: u64,
    gateway: Arc<dyn ApiGateway>,
    request: ChatRequest,
}

impl fmt::Debug for ChatTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatTurn")
            .field("turn", &self.turn)
            .field("history_len", &self.request.history.len())
            .finish_non_exhaustive()
    }
}

impl ChatTurn {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    pub async fn run(self) -> ChatOutcome {
        let result = self.gateway.chat(&self.request).await;
        ChatOutcome {
            turn: self.turn,
            result,
        }
    }
}

/// Result of a `ChatTurn`, applied with `ConversationSession::complete`.
#[derive(Debug)]
pub struct ChatOutcome {
    turn: u64,
    pub result: CoreResult<ChatReply>,
}

/// One chat session.
pub struct ConversationSession {
    id: String,
    gateway: Arc<dyn ApiGateway>,
    history: Vec<ConversationMessage>,
    pending: Option<u64>,
    turns: u64,
}

impl fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationSession")
            .field("id", &self.id)
            .field("messages", &self.history.len())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

/// Replies with the failure sentinel if a send is abandoned before its
/// outcome is applied.
struct PendingTurn<'a> {
    session: Option<&'a mut ConversationSession>,
}

impl<'a> PendingTurn<'a> {
    fn finish(mut self, outcome: ChatOutcome) -> Option<&'a ConversationMessage> {
        let session = self.session.take()?;
        session.complete(outcome)
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel_pending();
        }
    }
}

impl ConversationSession {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("[ConversationSession] Started session {}", id);
        Self {
            id,
            gateway,
            history: vec![ConversationMessage::bot(GREETING)],
            pending: None,
            turns: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &[ConversationMessage] {
        &self.history
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// History in the transport's role vocabulary.
    pub fn serialize_history(&self) -> Vec<ChatHistoryEntry> {
        self.history.iter().map(ChatHistoryEntry::from).collect()
    }

    /// Append the user's message and start a turn.
    ///
    /// `None` when the text is blank or a turn is already in flight. The
    /// request carries the history as it was before this message.
    pub fn begin_send(&mut self, text: &str) -> Option<ChatTurn> {
        if text.trim().is_empty() {
            return None;
        }
        if self.pending.is_some() {
            tracing::debug!("[ConversationSession] Ignoring send while a reply is pending");
            return None;
        }

        let request = ChatRequest {
            message: text.to_string(),
            history: self.serialize_history(),
        };
        self.history.push(ConversationMessage::user(text));
        self.turns += 1;
        self.pending = Some(self.turns);

        tracing::debug!(
            "[ConversationSession] Turn {} sent with {} prior messages",
            self.turns,
            request.history.len()
        );
        Some(ChatTurn {
            turn: self.turns,
            gateway: Arc::clone(&self.gateway),
            request,
        })
    }

    /// Append the reply for the pending turn.
    ///
    /// Returns the appended message, or `None` if `outcome` is not for the
    /// pending turn.
    pub fn complete(&mut self, outcome: ChatOutcome) -> Option<&ConversationMessage> {
        if self.pending != Some(outcome.turn) {
            return None;
        }
        self.pending = None;

        let reply = match outcome.result {
            Ok(reply) if !reply.response.trim().is_empty() => reply.response,
            Ok(_) => {
                tracing::warn!("[ConversationSession] Turn {} got an empty reply", outcome.turn);
                FAILURE_SENTINEL.to_string()
            }
            Err(err) => {
                tracing::warn!("[ConversationSession] Turn {} failed: {}", outcome.turn, err);
                FAILURE_SENTINEL.to_string()
            }
        };
        self.history.push(ConversationMessage::bot(reply));
        self.history.last()
    }

    /// Abandon the in-flight turn and reply with the failure sentinel.
    ///
    /// `None` if no turn was pending. The abandoned turn's outcome is ignored
    /// if it arrives later.
    pub fn cancel_pending(&mut self) -> Option<&ConversationMessage> {
        let turn = self.pending.take()?;
        tracing::info!("[ConversationSession] Turn {} abandoned", turn);
        self.history.push(ConversationMessage::bot(FAILURE_SENTINEL));
        self.history.last()
    }

    /// Send a message and wait for the reply.
    ///
    /// Dropping the returned future mid-flight cancels the turn.
    pub async fn send_user_message(&mut self, text: &str) -> Option<&ConversationMessage> {
        let turn = self.begin_send(text)?;
        let guard = PendingTurn {
            session: Some(self),
        };
        let outcome = turn.run().await;
        guard.finish(outcome)
    }

    /// Book an appointment; chat history is not touched.
    pub async fn book_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> CoreResult<AppointmentConfirmation> {
        request.validate()?;
        let confirmation = self.gateway.book_appointment(request).await?;
        tracing::info!(
            "[ConversationSession] Appointment {} booked with {}",
            confirmation.id,
            request.department
        );
        Ok(confirmation)
    }
}
