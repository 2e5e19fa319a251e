//! Session controller: the Idle/InFlight request lifecycle around a single
//! chat call.
//!
//! One controller instance owns the transcript, the provider/model/memory
//! selection, and the single-flight guard. At most one request is
//! outstanding at a time; there is no queuing and no cancellation. Every
//! accepted submit appends exactly one user turn and, whatever the network
//! outcome, exactly one assistant turn, and ends with the controller Idle.

use crate::api::{ChatApiError, ChatBackend, ChatReply, ChatRequest};
use crate::catalog;
use crate::transcript::{AssistantMeta, Transcript, Turn};

/// Current provider/model/memory selection. Mutated only by the setters on
/// [`SessionController`]; read (not mutated) when a request is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub provider: String,
    pub model: String,
    pub memory_enabled: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let provider = catalog::DEFAULT_PROVIDER.to_string();
        let model = catalog::default_model(&provider).unwrap_or_default().to_string();
        Self {
            provider,
            model,
            memory_enabled: true,
        }
    }
}

/// Whether a chat request is outstanding. One tagged state instead of a set
/// of per-control disabled flags, so the controls can never desynchronize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    InFlight,
}

/// What `submit` did with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A request was issued and exactly one assistant turn was appended.
    Completed,
    /// Empty input or a request already in flight; nothing happened.
    Ignored,
}

/// Result of a reset attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Server confirmed; transcript cleared back to the welcome placeholder.
    Done,
    /// Confirmation declined; no network call was made.
    Declined,
    /// Reset call failed; transcript left untouched, no automatic retry.
    Failed(String),
}

/// Owns the transcript, the selection state, and the single-flight guard.
pub struct SessionController<B: ChatBackend> {
    backend: B,
    settings: SessionSettings,
    transcript: Transcript,
    state: RequestState,
}

impl<B: ChatBackend> SessionController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_settings(backend, SessionSettings::default())
    }

    pub fn with_settings(backend: B, settings: SessionSettings) -> Self {
        Self {
            backend,
            settings,
            transcript: Transcript::new(),
            state: RequestState::Idle,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// All interactive controls share one enabled flag, derived from the
    /// request state.
    pub fn controls_enabled(&self) -> bool {
        self.state == RequestState::Idle
    }

    /// Switch provider. The model selection is reset to the head of the new
    /// provider's list; it is never carried across providers. An unknown
    /// provider leaves the model selection empty.
    pub fn select_provider(&mut self, provider: impl Into<String>) {
        self.settings.provider = provider.into();
        self.settings.model = catalog::default_model(&self.settings.provider)
            .unwrap_or_default()
            .to_string();
    }

    pub fn select_model(&mut self, model: impl Into<String>) {
        self.settings.model = model.into();
    }

    pub fn set_memory_enabled(&mut self, enabled: bool) {
        self.settings.memory_enabled = enabled;
    }

    /// Cosmetic text mirroring the memory toggle.
    pub fn memory_label(&self) -> &'static str {
        if self.settings.memory_enabled {
            "With Memory"
        } else {
            "Without Memory"
        }
    }

    /// Submit one user message and drive the request to completion.
    ///
    /// Empty (after trimming) input, or a submit while a request is already
    /// in flight, is silently dropped — a deliberate guard, not an error.
    /// Otherwise: the user turn is appended, the pending placeholder shown,
    /// and the call issued with the settings snapshot taken here; edits to
    /// the settings during the flight only affect the next submit. On
    /// completion an assistant turn is appended: the server echo on success,
    /// an inline `Error: …` turn on server or transport failure (falling
    /// back to the snapshot for its metadata). The controller always ends
    /// Idle.
    pub async fn submit(&mut self, raw: &str) -> SubmitOutcome {
        let Some(request) = self.begin(raw) else {
            return SubmitOutcome::Ignored;
        };
        let result = self.backend.send_chat(&request).await;
        self.finish(request, result);
        SubmitOutcome::Completed
    }

    /// Guard and entry: append the user turn, show the pending placeholder,
    /// go InFlight, and snapshot the settings into the outbound request.
    fn begin(&mut self, raw: &str) -> Option<ChatRequest> {
        if self.state != RequestState::Idle {
            log::debug!("submit ignored: request already in flight");
            return None;
        }
        let message = raw.trim();
        if message.is_empty() {
            log::debug!("submit ignored: empty message");
            return None;
        }
        self.transcript.push(Turn::user(message));
        self.transcript.begin_pending();
        self.state = RequestState::InFlight;
        Some(ChatRequest {
            message: message.to_string(),
            use_memori: self.settings.memory_enabled,
            provider: self.settings.provider.clone(),
            model: self.settings.model.clone(),
        })
    }

    /// Exit: clear the pending placeholder exactly once, append the one
    /// assistant turn for this request, and return to Idle. Every branch
    /// runs the same tail, so the controls can never stay disabled.
    fn finish(&mut self, request: ChatRequest, result: Result<ChatReply, ChatApiError>) {
        self.transcript.clear_pending();
        let turn = match result {
            Ok(reply) => Turn::assistant(
                reply.response,
                AssistantMeta {
                    memory_enabled: reply.use_memori,
                    provider: reply.provider,
                    model: reply.model,
                },
            ),
            Err(e) => Turn::assistant(
                format!("Error: {}", e),
                AssistantMeta {
                    memory_enabled: request.use_memori,
                    provider: request.provider,
                    model: request.model,
                },
            ),
        };
        self.transcript.push(turn);
        self.state = RequestState::Idle;
    }

    /// Reset the server-side session and mirror it locally. `confirm` is the
    /// modal prompt seam: when it returns false the reset is abandoned
    /// before any network call. On failure the transcript is left untouched
    /// and the error handed back to the caller.
    pub async fn reset(&mut self, confirm: impl FnOnce() -> bool) -> ResetOutcome {
        if !confirm() {
            return ResetOutcome::Declined;
        }
        match self.backend.reset_session().await {
            Ok(()) => {
                self.transcript.reset();
                ResetOutcome::Done
            }
            Err(e) => {
                log::warn!("session reset failed: {}", e);
                ResetOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Speaker;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<ChatReply, ChatApiError>>>,
        fail_reset: bool,
        chat_calls: AtomicUsize,
        reset_calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn with_reply(reply: ChatReply) -> Self {
            let backend = Self::default();
            backend.replies.lock().unwrap().push_back(Ok(reply));
            backend
        }

        fn with_error(message: &str) -> Self {
            let backend = Self::default();
            backend
                .replies
                .lock()
                .unwrap()
                .push_back(Err(ChatApiError::Api(message.to_string())));
            backend
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send_chat(&self, _request: &ChatRequest) -> Result<ChatReply, ChatApiError> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ChatApiError::Api("no scripted reply".to_string())))
        }

        async fn reset_session(&self) -> Result<(), ChatApiError> {
            self.reset_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reset {
                Err(ChatApiError::Api("reset refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn reply(text: &str, memory: bool, provider: &str, model: &str) -> ChatReply {
        ChatReply {
            response: text.to_string(),
            use_memori: memory,
            provider: provider.to_string(),
            model: model.to_string(),
        }
    }

    #[tokio::test]
    async fn accepted_submit_appends_user_then_assistant() {
        let backend = ScriptedBackend::with_reply(reply("hi!", true, "openai", "gpt-4.1-mini"));
        let mut c = SessionController::new(backend);

        let outcome = c.submit("  hello there  ").await;
        assert_eq!(outcome, SubmitOutcome::Completed);

        let turns = c.transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker, Speaker::User);
        assert_eq!(turns[0].text, "hello there");
        assert_eq!(turns[1].speaker, Speaker::Assistant);
        assert_eq!(turns[1].text, "hi!");
        assert!(!c.transcript().has_pending());
        assert!(c.controls_enabled());
        assert_eq!(c.backend().chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_submit_is_dropped_without_network_call() {
        let mut c = SessionController::new(ScriptedBackend::default());
        assert_eq!(c.submit("").await, SubmitOutcome::Ignored);
        assert_eq!(c.submit("   \t\n").await, SubmitOutcome::Ignored);
        assert!(c.transcript().is_empty());
        assert!(c.transcript().welcome_visible());
        assert_eq!(c.backend().chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn submit_while_in_flight_is_ignored() {
        let mut c = SessionController::new(ScriptedBackend::default());

        let first = c.begin("first message").expect("accepted");
        assert_eq!(c.state(), RequestState::InFlight);
        assert!(!c.controls_enabled());

        // a second submission arrives while the first is still outstanding
        assert_eq!(c.submit("second message").await, SubmitOutcome::Ignored);
        assert_eq!(c.backend().chat_calls.load(Ordering::SeqCst), 0);

        c.finish(first, Ok(reply("done", true, "openai", "gpt-4.1-mini")));
        assert!(c.controls_enabled());
        // only the accepted submit produced a turn pair
        assert_eq!(c.transcript().len(), 2);
    }

    #[tokio::test]
    async fn server_echo_is_authoritative_for_assistant_meta() {
        // requested openai, but the server fell back to gemini
        let backend =
            ScriptedBackend::with_reply(reply("ok", false, "gemini", "gemini-2.5-flash"));
        let mut c = SessionController::new(backend);

        c.submit("hello").await;
        let meta = c.transcript().turns()[1].meta.as_ref().expect("meta");
        assert_eq!(meta.provider, "gemini");
        assert_eq!(meta.model, "gemini-2.5-flash");
        assert!(!meta.memory_enabled);
    }

    #[tokio::test]
    async fn failure_turn_uses_submit_time_snapshot() {
        let mut c = SessionController::new(ScriptedBackend::default());
        let request = c.begin("hello").expect("accepted");

        // settings edited while the request is in flight; the snapshot wins
        c.select_provider("gemini");
        c.set_memory_enabled(false);

        c.finish(request, Err(ChatApiError::Api("rate limited".to_string())));

        let turn = &c.transcript().turns()[1];
        assert!(turn.text.contains("rate limited"));
        let meta = turn.meta.as_ref().expect("meta");
        assert_eq!(meta.provider, "openai");
        assert!(meta.memory_enabled);
        assert!(!c.transcript().has_pending());
        assert!(c.controls_enabled());
    }

    #[tokio::test]
    async fn error_reply_still_produces_exactly_one_assistant_turn() {
        let backend = ScriptedBackend::with_error("backend unavailable");
        let mut c = SessionController::new(backend);

        assert_eq!(c.submit("hello").await, SubmitOutcome::Completed);
        let turns = c.transcript().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].text, "Error: backend unavailable");
        assert!(c.controls_enabled());
    }

    #[test]
    fn select_provider_resets_model_to_list_head() {
        let backend = ScriptedBackend::default();
        let mut c = SessionController::new(backend);
        assert_eq!(c.settings().model, "gpt-4.1-mini");

        c.select_model("gpt-4o");
        c.select_provider("gemini");
        assert_eq!(c.settings().model, "gemini-2.5-flash");

        c.select_provider("unknown");
        assert_eq!(c.settings().model, "");
    }

    #[test]
    fn memory_label_tracks_toggle() {
        let mut c = SessionController::new(ScriptedBackend::default());
        assert_eq!(c.memory_label(), "With Memory");
        c.set_memory_enabled(false);
        assert_eq!(c.memory_label(), "Without Memory");
        c.set_memory_enabled(true);
        assert_eq!(c.memory_label(), "With Memory");
    }

    #[tokio::test]
    async fn declined_reset_makes_no_network_call() {
        let backend = ScriptedBackend::with_reply(reply("hi", true, "openai", "gpt-4.1-mini"));
        let mut c = SessionController::new(backend);
        c.submit("hello").await;

        assert_eq!(c.reset(|| false).await, ResetOutcome::Declined);
        assert_eq!(c.backend().reset_calls.load(Ordering::SeqCst), 0);
        assert_eq!(c.transcript().len(), 2);
    }

    #[tokio::test]
    async fn confirmed_reset_clears_transcript() {
        let backend = ScriptedBackend::with_reply(reply("hi", true, "openai", "gpt-4.1-mini"));
        let mut c = SessionController::new(backend);
        c.submit("hello").await;

        assert_eq!(c.reset(|| true).await, ResetOutcome::Done);
        assert_eq!(c.backend().reset_calls.load(Ordering::SeqCst), 1);
        assert!(c.transcript().is_empty());
        assert!(c.transcript().welcome_visible());
    }

    #[tokio::test]
    async fn failed_reset_leaves_transcript_untouched() {
        let backend = ScriptedBackend {
            fail_reset: true,
            ..ScriptedBackend::with_reply(reply("hi", true, "openai", "gpt-4.1-mini"))
        };
        let mut c = SessionController::new(backend);
        c.submit("hello").await;

        match c.reset(|| true).await {
            ResetOutcome::Failed(message) => assert!(message.contains("reset refused")),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(c.transcript().len(), 2);
        assert!(!c.transcript().welcome_visible());
    }
}
