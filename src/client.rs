use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{ApiConfig, CHAT_PATH, PREDICT_PATH};
use crate::models::{ChatReply, ChatRequest, PredictionResult, StudentMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Predict,
    Chat,
}

impl Operation {
    fn path(&self) -> &'static str {
        match self {
            Operation::Predict => PREDICT_PATH,
            Operation::Chat => CHAT_PATH,
        }
    }

    fn timeout_hint(&self) -> &'static str {
        match self {
            Operation::Predict => {
                "The request took too long. The server may be asleep (free hosting plan). \
                 Wait 30 seconds and try again."
            }
            Operation::Chat => {
                "The request took too long. The server may be asleep (free hosting plan); \
                 try again in 30 seconds."
            }
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            Operation::Predict => "Could not connect to the server",
            Operation::Chat => "Could not process your question",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request timed out: {hint}")]
    Timeout { hint: String },

    #[error("HTTP error! status: {status}")]
    RequestFailed { status: u16 },

    #[error("transport error: {message}")]
    Transport { message: String },
}

impl ClientError {
    /// Plain text suitable for an alert or a chat bubble.
    pub fn user_message(&self, operation: Operation) -> String {
        match self {
            ClientError::Timeout { hint } => hint.clone(),
            ClientError::RequestFailed { .. } => {
                format!("{}: {self}", operation.failure_prefix())
            }
            ClientError::Transport { message } => {
                format!("{}: {message}", operation.failure_prefix())
            }
        }
    }
}

fn transport(err: impl std::fmt::Display) -> ClientError {
    ClientError::Transport {
        message: err.to_string(),
    }
}

/// The remote collaborator as seen by the orchestration layer.
#[allow(async_fn_in_trait)]
pub trait PredictionApi {
    async fn predict(&self, metrics: &StudentMetrics) -> Result<PredictionResult, ClientError>;

    async fn chat(
        &self,
        question: &str,
        metrics: &StudentMetrics,
        context: &PredictionResult,
    ) -> Result<String, ClientError>;
}

#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl PredictionClient {
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build().map_err(transport)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        operation: Operation,
        body: &Req,
    ) -> Result<Resp, ClientError> {
        let url = self.config.endpoint(operation.path());
        let request_id = Uuid::new_v4();
        info!(%request_id, %url, "sending request");

        let exchange = async {
            let response = self
                .http
                .post(&url)
                .header("X-Request-Id", request_id.to_string())
                .json(body)
                .send()
                .await
                .map_err(transport)?;

            let status = response.status();
            if !status.is_success() {
                return Err(ClientError::RequestFailed {
                    status: status.as_u16(),
                });
            }

            response
                .json::<Resp>()
                .await
                .map_err(|err| transport(format!("invalid response body: {err}")))
        };

        let outcome = match tokio::time::timeout(self.config.timeout, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ClientError::Timeout {
                hint: operation.timeout_hint().to_string(),
            }),
        };

        debug!(%request_id, ok = outcome.is_ok(), "request finished");
        outcome
    }
}

impl PredictionApi for PredictionClient {
    async fn predict(&self, metrics: &StudentMetrics) -> Result<PredictionResult, ClientError> {
        self.post(Operation::Predict, metrics).await
    }

    async fn chat(
        &self,
        question: &str,
        metrics: &StudentMetrics,
        context: &PredictionResult,
    ) -> Result<String, ClientError> {
        let request = ChatRequest {
            question,
            metrics,
            prediction: context,
        };
        let reply: ChatReply = self.post(Operation::Chat, &request).await?;
        Ok(reply.answer)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::{Cell, RefCell};

    use super::*;

    /// Scripted stand-in for the remote API.
    #[derive(Default)]
    pub struct FakeApi {
        pub prediction: RefCell<Option<Result<PredictionResult, ClientError>>>,
        pub answer: RefCell<Option<Result<String, ClientError>>>,
        pub predict_calls: Cell<usize>,
        pub chat_calls: Cell<usize>,
        pub last_question: RefCell<Option<String>>,
    }

    impl FakeApi {
        pub fn predicting(result: Result<PredictionResult, ClientError>) -> Self {
            let api = Self::default();
            *api.prediction.borrow_mut() = Some(result);
            api
        }

        pub fn answering(answer: Result<String, ClientError>) -> Self {
            let api = Self::default();
            *api.answer.borrow_mut() = Some(answer);
            api
        }
    }

    impl PredictionApi for FakeApi {
        async fn predict(
            &self,
            _metrics: &StudentMetrics,
        ) -> Result<PredictionResult, ClientError> {
            self.predict_calls.set(self.predict_calls.get() + 1);
            self.prediction
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Err(transport("no scripted prediction")))
        }

        async fn chat(
            &self,
            question: &str,
            _metrics: &StudentMetrics,
            _context: &PredictionResult,
        ) -> Result<String, ClientError> {
            self.chat_calls.set(self.chat_calls.get() + 1);
            *self.last_question.borrow_mut() = Some(question.to_string());
            self.answer
                .borrow_mut()
                .take()
                .unwrap_or_else(|| Err(transport("no scripted answer")))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;
    use crate::models::fixtures;

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(split) = text.find("\r\n\r\n") {
                let length = text[..split]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|value| value.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if buf.len() >= split + 4 + length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Serves one canned response and hands back the raw request it received.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            request
        });
        (base, handle)
    }

    fn client(base: String, timeout: Duration) -> PredictionClient {
        PredictionClient::new(ApiConfig {
            base_url: base,
            timeout,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn predict_posts_metrics_and_parses_result() {
        let body = serde_json::to_string(&fixtures::result()).unwrap();
        let (base, server) = serve_once("200 OK", body).await;

        let result = client(base, Duration::from_secs(5))
            .predict(&fixtures::metrics())
            .await
            .unwrap();
        assert_eq!(result, fixtures::result());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /predict "));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.contains("\"uso_tutorias\":1"));
    }

    #[tokio::test]
    async fn chat_returns_answer_text() {
        let (base, server) =
            serve_once("200 OK", r#"{"respuesta":"Attend every class."}"#.to_string()).await;

        let answer = client(base, Duration::from_secs(5))
            .chat("How?", &fixtures::metrics(), &fixtures::result())
            .await
            .unwrap();
        assert_eq!(answer, "Attend every class.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /chat "));
        assert!(request.contains("\"pregunta\":\"How?\""));
    }

    #[tokio::test]
    async fn non_success_status_is_request_failed() {
        let (base, _server) = serve_once("503 Service Unavailable", "{}".to_string()).await;

        let err = client(base, Duration::from_secs(5))
            .predict(&fixtures::metrics())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::RequestFailed { status: 503 }));
        assert_eq!(
            err.user_message(Operation::Predict),
            "Could not connect to the server: HTTP error! status: 503"
        );
    }

    #[tokio::test]
    async fn malformed_body_is_transport_error() {
        let (base, _server) = serve_once("200 OK", "not json".to_string()).await;

        let err = client(base, Duration::from_secs(5))
            .predict(&fixtures::metrics())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
    }

    #[tokio::test]
    async fn silent_server_surfaces_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(stream);
        });

        let err = client(base, Duration::from_millis(200))
            .predict(&fixtures::metrics())
            .await
            .unwrap_err();
        match err {
            ClientError::Timeout { ref hint } => assert!(hint.contains("asleep")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn silent_server_surfaces_timeout_for_chat() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(stream);
        });

        let err = client(base, Duration::from_millis(200))
            .chat("hi", &fixtures::metrics(), &fixtures::result())
            .await
            .unwrap_err();
        match err {
            ClientError::Timeout { ref hint } => {
                assert!(hint.contains("asleep"));
                assert_eq!(err.user_message(Operation::Chat), *hint);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn every_timeout_hint_mentions_a_sleeping_server() {
        for operation in [Operation::Predict, Operation::Chat] {
            assert!(operation.timeout_hint().contains("asleep"));
        }
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = client(base, Duration::from_secs(5))
            .chat("hi", &fixtures::metrics(), &fixtures::result())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
        assert!(err
            .user_message(Operation::Chat)
            .starts_with("Could not process your question: "));
    }
}
