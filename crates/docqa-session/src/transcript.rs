//! Chat transcript and the Idle / AwaitingResponse turn state machine.

use docqa_chat::{ChatMessage, Role};
use docqa_core::{Error, Result};
use serde::Serialize;

/// First message of every transcript.
pub const GREETING: &str = "Please upload documents and ask questions!";

/// Indicator attached to a user message whose stream was abandoned.
pub const ABORTED: &str = "aborted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    AwaitingResponse,
}

/// Ordered transcript of user and assistant messages.
///
/// At most one turn is in flight. A completed turn appends exactly one user
/// and one assistant message; a failed turn leaves the user message marked
/// with the failure reason and no assistant reply.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    state: TurnState,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            state: TurnState::Idle,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == TurnState::Idle
    }

    /// Start a turn with `query`. Rejections leave the transcript untouched.
    pub fn begin_turn(&mut self, query: &str, documents_present: bool) -> Result<()> {
        if self.state != TurnState::Idle {
            return Err(Error::Rejected("a query is already in progress".into()));
        }
        if !documents_present {
            return Err(Error::Rejected(
                "upload at least one document before asking".into(),
            ));
        }
        if query.trim().is_empty() {
            return Err(Error::Rejected("query is empty".into()));
        }

        self.messages.push(ChatMessage::user(query));
        self.state = TurnState::AwaitingResponse;
        Ok(())
    }

    pub fn complete_turn(&mut self, response: impl Into<String>) -> Result<()> {
        self.expect_awaiting()?;
        self.messages.push(ChatMessage::assistant(response));
        self.state = TurnState::Idle;
        Ok(())
    }

    pub fn fail_turn(&mut self, reason: impl Into<String>) -> Result<()> {
        self.expect_awaiting()?;
        if let Some(pending) = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == Role::User)
        {
            pending.error = Some(reason.into());
        }
        self.state = TurnState::Idle;
        Ok(())
    }

    fn expect_awaiting(&self) -> Result<()> {
        match self.state {
            TurnState::AwaitingResponse => Ok(()),
            TurnState::Idle => Err(Error::Internal("no turn in progress".into())),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_transcript_is_greeting() {
        let chat = ChatSession::new();
        assert_eq!(chat.messages(), &[ChatMessage::assistant(GREETING)]);
        assert!(chat.is_idle());
    }

    #[test]
    fn test_completed_turn_appends_pair() {
        let mut chat = ChatSession::new();
        chat.begin_turn("What color is the sky?", true).unwrap();
        assert_eq!(chat.state(), TurnState::AwaitingResponse);
        chat.complete_turn("Blue.").unwrap();

        let roles: Vec<Role> = chat.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
        assert!(chat.is_idle());
    }

    #[test]
    fn test_rejections_leave_transcript_unchanged() {
        let mut chat = ChatSession::new();

        let err = chat.begin_turn("anything?", false).unwrap_err();
        assert_eq!(err.kind(), "rejected");
        assert!(chat.begin_turn("   ", true).is_err());
        assert_eq!(chat.messages().len(), 1);

        chat.begin_turn("first", true).unwrap();
        assert!(chat.begin_turn("second", true).is_err());
        assert_eq!(chat.messages().len(), 2);
    }

    #[test]
    fn test_failed_turn_marks_user_message() {
        let mut chat = ChatSession::new();
        chat.begin_turn("Summarize", true).unwrap();
        chat.fail_turn("Rate limited: slow down").unwrap();

        let last = chat.messages().last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.error.as_deref(), Some("Rate limited: slow down"));
        assert!(chat.is_idle());

        // The user may resubmit.
        chat.begin_turn("Summarize", true).unwrap();
    }

    #[test]
    fn test_settling_without_turn_is_an_error() {
        let mut chat = ChatSession::new();
        assert!(chat.complete_turn("orphan").is_err());
        assert!(chat.fail_turn("orphan").is_err());
        assert_eq!(chat.messages().len(), 1);
    }
}
