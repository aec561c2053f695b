use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::{ClientError, Operation, PredictionApi};
use crate::models::{PredictionResult, StudentMetrics};
use crate::render::narrative::{self, Block};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    /// Bot replies use the same markdown subset as the analysis.
    pub blocks: Vec<Block>,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn user(text: &str) -> Self {
        Self {
            sender: Sender::User,
            text: text.to_string(),
            blocks: Vec::new(),
            sent_at: Utc::now(),
        }
    }

    fn bot(text: String) -> Self {
        Self {
            sender: Sender::Bot,
            blocks: narrative::parse(&text),
            text,
            sent_at: Utc::now(),
        }
    }

    pub fn to_plain(&self) -> String {
        let time = self.sent_at.format("%H:%M");
        match self.sender {
            Sender::User => format!("[{time}] you> {}", self.text),
            Sender::Bot => format!(
                "[{time}] assistant>\n{}",
                narrative::to_plain(&self.blocks).trim_end()
            ),
        }
    }
}

/// The prediction a chat question is scoped to.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub result: PredictionResult,
    pub metrics: StudentMetrics,
}

/// A question accepted by the session and awaiting its answer.
#[derive(Debug, Clone)]
pub struct PendingQuestion {
    pub question: String,
    pub context: ChatContext,
}

impl PendingQuestion {
    pub async fn send<A: PredictionApi>(&self, api: &A) -> Result<String, ClientError> {
        api.chat(&self.question, &self.context.metrics, &self.context.result)
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    context: Option<ChatContext>,
    log: Vec<ChatMessage>,
    visibility: Visibility,
    pending: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            context: None,
            log: Vec::new(),
            visibility: Visibility::Hidden,
            pending: false,
        }
    }
}

impl ChatSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn set_context(&mut self, result: PredictionResult, metrics: StudentMetrics) {
        self.context = Some(ChatContext { result, metrics });
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.log
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn open(&mut self) {
        self.visibility = Visibility::Visible;
    }

    pub fn close(&mut self) {
        self.visibility = Visibility::Hidden;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Accepts a question and logs it, or returns `None` when chat is unavailable.
    pub fn prepare(&mut self, question: &str) -> Option<PendingQuestion> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }
        let Some(context) = self.context.clone() else {
            debug!(session = %self.id, "chat without a prediction, ignoring");
            return None;
        };
        if self.pending {
            debug!(session = %self.id, "chat request already in flight, ignoring");
            return None;
        }

        self.log.push(ChatMessage::user(question));
        self.pending = true;
        Some(PendingQuestion {
            question: question.to_string(),
            context,
        })
    }

    /// Logs the answer, or the user-facing error text in its place.
    pub fn complete(&mut self, outcome: Result<String, ClientError>) {
        self.pending = false;
        let text = match outcome {
            Ok(answer) => answer,
            Err(err) => {
                info!(session = %self.id, error = %err, "chat request failed");
                err.user_message(Operation::Chat)
            }
        };
        self.log.push(ChatMessage::bot(text));
    }

    /// Full question/answer round trip. Returns whether a request was sent.
    pub async fn ask<A: PredictionApi>(&mut self, question: &str, api: &A) -> bool {
        let Some(pending) = self.prepare(question) else {
            return false;
        };
        let outcome = pending.send(api).await;
        self.complete(outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeApi;
    use crate::models::fixtures;

    fn session_with_context() -> ChatSession {
        let mut session = ChatSession::default();
        session.set_context(fixtures::result(), fixtures::metrics());
        session
    }

    #[tokio::test]
    async fn blank_question_is_a_silent_no_op() {
        let api = FakeApi::answering(Ok("unused".to_string()));
        let mut session = session_with_context();

        assert!(!session.ask("   ", &api).await);
        assert_eq!(api.chat_calls.get(), 0);
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn missing_context_is_a_silent_no_op() {
        let api = FakeApi::answering(Ok("unused".to_string()));
        let mut session = ChatSession::default();

        assert!(!session.ask("How am I doing?", &api).await);
        assert_eq!(api.chat_calls.get(), 0);
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn answer_follows_question_in_log() {
        let api = FakeApi::answering(Ok("**Study** more".to_string()));
        let mut session = session_with_context();

        assert!(session.ask("  What should I do?  ", &api).await);
        assert_eq!(api.last_question.borrow().as_deref(), Some("What should I do?"));

        let log = session.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].sender, Sender::User);
        assert_eq!(log[0].text, "What should I do?");
        assert_eq!(log[1].sender, Sender::Bot);
        assert_eq!(
            log[1].blocks,
            vec![Block::Paragraph(vec![
                narrative::Span::Bold("Study".to_string()),
                narrative::Span::Text(" more".to_string()),
            ])]
        );
    }

    #[tokio::test]
    async fn failures_become_bot_messages() {
        let api = FakeApi::answering(Err(ClientError::Timeout {
            hint: "The request took too long. The server may be asleep.".to_string(),
        }));
        let mut session = session_with_context();

        assert!(session.ask("Hello", &api).await);
        let log = session.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].sender, Sender::Bot);
        assert_eq!(log[1].text, "The request took too long. The server may be asleep.");
        assert!(!session.is_pending());
    }

    #[test]
    fn second_question_is_ignored_while_one_is_pending() {
        let mut session = session_with_context();
        assert!(session.prepare("first").is_some());
        assert!(session.prepare("second").is_none());
        assert_eq!(session.messages().len(), 1);

        session.complete(Ok("done".to_string()));
        assert!(session.prepare("third").is_some());
    }

    #[test]
    fn visibility_is_independent_of_context() {
        let mut session = ChatSession::default();
        session.open();
        assert_eq!(session.visibility(), Visibility::Visible);
        assert!(!session.has_context());

        session.set_context(fixtures::result(), fixtures::metrics());
        session.close();
        assert_eq!(session.visibility(), Visibility::Hidden);
        assert!(session.has_context());
    }

    #[test]
    fn set_context_replaces_previous_prediction() {
        let mut session = session_with_context();
        let mut newer = fixtures::result();
        newer.risk_percentage = 12.0;
        session.set_context(newer, fixtures::metrics());

        let pending = session.prepare("ok?").unwrap();
        assert_eq!(pending.context.result.risk_percentage, 12.0);
    }
}
