//! Streaming chat with per-request cancellation.
//!
//! Each stream owns a [`CancellationToken`]. The token is checked whenever the
//! stream waits for the next fragment, so a cancel issued after fragment N is
//! observed before fragment N+1 is handed out. Tokens are never shared
//! between streams.

use futures::stream::{self, BoxStream, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use providers::{FragmentStream, ModelRequest, RemoteModel};
use shared::conversation::ConversationMessage;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::assistant::MedicalAssistant;
use crate::error::{AssistError, AssistResult, Operation};

/// Text fragments of one chat reply. Ends after the last fragment, or after
/// a single `Err` item.
pub type ChatStream = BoxStream<'static, AssistResult<String>>;

enum Phase {
    Pending {
        model: Arc<dyn RemoteModel>,
        request: ModelRequest,
    },
    Streaming(FragmentStream),
    Done,
}

struct StreamState {
    phase: Phase,
    cancel: CancellationToken,
}

/// Open the remote stream on first poll and relay fragments until it ends,
/// fails or `cancel` fires.
pub(crate) fn cancellable_stream(
    model: Arc<dyn RemoteModel>,
    request: ModelRequest,
    cancel: CancellationToken,
) -> ChatStream {
    let state = StreamState {
        phase: Phase::Pending { model, request },
        cancel,
    };
    stream::unfold(state, |mut state| async move {
        let (item, phase) = advance(state.phase, &state.cancel).await?;
        state.phase = phase;
        Some((item, state))
    })
    .boxed()
}

async fn advance(
    phase: Phase,
    cancel: &CancellationToken,
) -> Option<(AssistResult<String>, Phase)> {
    let mut fragments = match phase {
        Phase::Done => return None,
        Phase::Streaming(fragments) => fragments,
        Phase::Pending { model, request } => {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Some(cancelled()),
                opened = model.generate_stream(request) => match opened {
                    Ok(fragments) => fragments,
                    Err(e) => {
                        return Some((Err(AssistError::remote(Operation::StreamChat, &e)), Phase::Done))
                    }
                },
            }
        }
    };

    tokio::select! {
        biased;
        // A reply that has already ended is complete; only a pending one is cut off
        _ = cancel.cancelled() => match fragments.next().now_or_never() {
            Some(None) => None,
            _ => Some(cancelled()),
        },
        next = fragments.next() => match next {
            None => None,
            Some(Ok(fragment)) => Some((Ok(fragment), Phase::Streaming(fragments))),
            Some(Err(e)) => Some((Err(AssistError::remote(Operation::StreamChat, &e)), Phase::Done)),
        },
    }
}

fn cancelled() -> (AssistResult<String>, Phase) {
    tracing::debug!("chat stream cancelled by caller");
    (Err(AssistError::Cancelled), Phase::Done)
}

/// One conversation: keeps the history and the token of the latest stream.
#[derive(Clone)]
pub struct ChatSession {
    assistant: MedicalAssistant,
    history: Arc<Mutex<Vec<ConversationMessage>>>,
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl ChatSession {
    pub fn new(assistant: MedicalAssistant) -> Self {
        Self {
            assistant,
            history: Arc::new(Mutex::new(Vec::new())),
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// Stream a reply to `message`. The exchange is appended to the history
    /// only if the stream runs to completion.
    pub fn send(&self, message: &str) -> AssistResult<ChatStream> {
        let token = CancellationToken::new();
        let history = self.history.lock().clone();
        let inner = self
            .assistant
            .stream_chat(message, &history, token.clone())?;
        *self.current.lock() = Some(token);

        let recorder = Recorder {
            inner,
            reply: String::new(),
            failed: false,
            message: message.to_string(),
            history: Arc::clone(&self.history),
        };
        Ok(stream::unfold(recorder, |mut rec| async move {
            match rec.inner.next().await {
                Some(Ok(fragment)) => {
                    rec.reply.push_str(&fragment);
                    Some((Ok(fragment), rec))
                }
                Some(Err(e)) => {
                    rec.failed = true;
                    Some((Err(e), rec))
                }
                None => {
                    if !rec.failed {
                        rec.commit();
                    }
                    None
                }
            }
        })
        .boxed())
    }

    /// Cancel the most recent stream. Does nothing if none was started; a
    /// finished stream's token is inert.
    pub fn cancel_current(&self) {
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
    }

    pub fn history(&self) -> Vec<ConversationMessage> {
        self.history.lock().clone()
    }

    pub fn clear(&self) {
        self.history.lock().clear();
    }
}

struct Recorder {
    inner: ChatStream,
    reply: String,
    failed: bool,
    message: String,
    history: Arc<Mutex<Vec<ConversationMessage>>>,
}

impl Recorder {
    fn commit(&mut self) {
        let mut history = self.history.lock();
        history.push(ConversationMessage::user(std::mem::take(&mut self.message)));
        history.push(ConversationMessage::assistant(std::mem::take(&mut self.reply)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;
    use shared::settings::AssistantSettings;

    fn assistant(model: ScriptedModel) -> MedicalAssistant {
        MedicalAssistant::new(Arc::new(model), AssistantSettings::default())
    }

    #[tokio::test]
    async fn test_stream_yields_all_fragments() {
        let model = ScriptedModel::new().stream(&["Rest ", "and ", "hydrate."]);
        let assistant = assistant(model);
        let fragments: Vec<String> = assistant
            .stream_chat("I have a cold", &[], CancellationToken::new())
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(fragments.concat(), "Rest and hydrate.");
    }

    #[tokio::test]
    async fn test_cancel_between_fragments_stops_stream() {
        let model = ScriptedModel::new().stream(&["one", "two", "three"]);
        let assistant = assistant(model);
        let token = CancellationToken::new();
        let mut stream = assistant.stream_chat("hi", &[], token.clone()).unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), "one");
        token.cancel();
        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "Request cancelled by user");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_before_open_never_calls_model() {
        let model = ScriptedModel::new().stream(&["never"]);
        let calls = model.calls();
        let assistant = assistant(model);
        let token = CancellationToken::new();
        token.cancel();
        let items: Vec<_> = assistant
            .stream_chat("hi", &[], token)
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().is_cancelled());
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_mid_stream_failure_is_generic() {
        let model = ScriptedModel::new().stream_then_fail(&["partial"], "socket closed");
        let assistant = assistant(model);
        let items: Vec<_> = assistant
            .stream_chat("hi", &[], CancellationToken::new())
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        let err = items[1].as_ref().unwrap_err();
        assert!(!err.is_cancelled());
        assert_eq!(err.to_string(), "Failed to stream response from AI");
    }

    #[tokio::test]
    async fn test_open_failure_is_generic() {
        let assistant = assistant(ScriptedModel::new().fail("503"));
        let items: Vec<_> = assistant
            .stream_chat("hi", &[], CancellationToken::new())
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(AssistError::Remote {
                operation: Operation::StreamChat,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_session_records_completed_turns() {
        let model = ScriptedModel::new()
            .stream(&["Flu is ", "viral."])
            .stream(&["Yes."]);
        let calls = model.calls();
        let session = ChatSession::new(assistant(model));

        let first: Vec<_> = session.send("What is flu?").unwrap().collect().await;
        assert_eq!(first.len(), 2);
        let _: Vec<_> = session.send("Is it contagious?").unwrap().collect().await;

        let history = session.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[1], ConversationMessage::assistant("Flu is viral."));
        assert!(calls.lock()[1]
            .prompt
            .contains("Conversation History:\nUser: What is flu?\nAssistant: Flu is viral."));
    }

    #[tokio::test]
    async fn test_stale_cancel_does_not_affect_fresh_stream() {
        let model = ScriptedModel::new().stream(&["a"]).stream(&["b", "c"]);
        let session = ChatSession::new(assistant(model));

        // Nothing running yet
        session.cancel_current();
        let _: Vec<_> = session.send("first").unwrap().collect().await;
        // Cancels only the finished stream's token
        session.cancel_current();

        let items: Vec<String> = session
            .send("second")
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(items, vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_after_last_fragment_keeps_turn() {
        let model = ScriptedModel::new().stream(&["only"]);
        let session = ChatSession::new(assistant(model));
        let mut stream = session.send("hello").unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "only");
        session.cancel_current();
        assert!(stream.next().await.is_none());
        assert_eq!(
            session.history(),
            vec![
                ConversationMessage::user("hello"),
                ConversationMessage::assistant("only")
            ]
        );
    }

    #[tokio::test]
    async fn test_session_cancel_skips_history() {
        let model = ScriptedModel::new().stream(&["x", "y"]);
        let session = ChatSession::new(assistant(model));
        let mut stream = session.send("hello").unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "x");
        session.cancel_current();
        assert!(stream.next().await.unwrap().unwrap_err().is_cancelled());
        assert!(stream.next().await.is_none());
        assert!(session.history().is_empty());
    }
}
