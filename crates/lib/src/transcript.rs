//! Transcript of rendered chat turns.
//!
//! Turns are immutable once pushed and the list is append-only; the only way
//! to remove anything is a full reset. The transcript also owns the two
//! placeholder states: the one-time welcome message and the pending
//! ("assistant is answering") indicator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog;

/// Shown until the first turn arrives, and again after a reset.
pub const WELCOME_MESSAGE: &str = "Welcome! Compare AI with and without memory.\n\
Try this:\n\
  1. With memory ON, tell me \"My name is Alex\"\n\
  2. Then ask \"What's my name?\" - I'll remember!\n\
  3. Turn memory OFF and ask again - I won't remember";

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// Backend-echoed metadata attached to assistant turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMeta {
    pub memory_enabled: bool,
    pub provider: String,
    pub model: String,
}

/// One rendered message. Ordering in the transcript is append order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    /// Present on assistant turns only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<AssistantMeta>,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            meta: None,
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>, meta: AssistantMeta) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            meta: Some(meta),
            at: Utc::now(),
        }
    }

    /// Label line shown above the message body, e.g.
    /// `AI (OpenAI/gpt-4o - With Memory)`.
    pub fn label(&self) -> String {
        match (self.speaker, &self.meta) {
            (Speaker::User, _) => "You".to_string(),
            (Speaker::Assistant, Some(meta)) => {
                let provider = catalog::provider_display_name(&meta.provider);
                let model = if meta.model.is_empty() {
                    String::new()
                } else {
                    format!("/{}", meta.model)
                };
                let memory = if meta.memory_enabled {
                    "With Memory"
                } else {
                    "Without Memory"
                };
                format!("AI ({}{} - {})", provider, model, memory)
            }
            (Speaker::Assistant, None) => "AI".to_string(),
        }
    }
}

/// Ordered turn list plus placeholder state.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    welcome_removed: bool,
    pending: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. The first append removes the one-time welcome
    /// placeholder; it stays removed until `reset`.
    pub fn push(&mut self, turn: Turn) {
        self.welcome_removed = true;
        self.turns.push(turn);
    }

    /// Show the pending-assistant placeholder (also removes the welcome).
    pub fn begin_pending(&mut self) {
        self.welcome_removed = true;
        self.pending = true;
    }

    /// Remove the pending placeholder if present. There is at most one, so
    /// calling this twice removes nothing extra and never fails.
    pub fn clear_pending(&mut self) {
        self.pending = false;
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn welcome_visible(&self) -> bool {
        !self.welcome_removed
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Clear all turns, drop any pending placeholder, and re-arm the welcome
    /// placeholder.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.pending = false;
        self.welcome_removed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> AssistantMeta {
        AssistantMeta {
            memory_enabled: true,
            provider: "openai".to_string(),
            model: "gpt-4.1-mini".to_string(),
        }
    }

    #[test]
    fn first_push_removes_welcome_once() {
        let mut t = Transcript::new();
        assert!(t.welcome_visible());
        t.push(Turn::user("hello"));
        assert!(!t.welcome_visible());
        t.push(Turn::assistant("hi", meta()));
        assert!(!t.welcome_visible());
    }

    #[test]
    fn reset_rearms_welcome_and_clears_turns() {
        let mut t = Transcript::new();
        t.push(Turn::user("hello"));
        t.begin_pending();
        t.reset();
        assert!(t.is_empty());
        assert!(t.welcome_visible());
        assert!(!t.has_pending());
        // the "first push removes the welcome" behavior is re-armed
        t.push(Turn::user("again"));
        assert!(!t.welcome_visible());
    }

    #[test]
    fn clear_pending_is_idempotent() {
        let mut t = Transcript::new();
        t.begin_pending();
        assert!(t.has_pending());
        t.clear_pending();
        assert!(!t.has_pending());
        t.clear_pending();
        assert!(!t.has_pending());
    }

    #[test]
    fn turns_keep_append_order() {
        let mut t = Transcript::new();
        t.push(Turn::user("one"));
        t.push(Turn::assistant("two", meta()));
        t.push(Turn::user("three"));
        let texts: Vec<&str> = t.turns().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn assistant_label_reflects_meta() {
        let turn = Turn::assistant("hi", meta());
        assert_eq!(turn.label(), "AI (OpenAI/gpt-4.1-mini - With Memory)");

        let turn = Turn::assistant(
            "hi",
            AssistantMeta {
                memory_enabled: false,
                provider: "gemini".to_string(),
                model: String::new(),
            },
        );
        assert_eq!(turn.label(), "AI (Gemini - Without Memory)");
    }

    #[test]
    fn user_label() {
        assert_eq!(Turn::user("x").label(), "You");
    }
}
