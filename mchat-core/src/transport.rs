use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::error::{MchatError, Result};

const FALLBACK_SERVER_ERROR: &str = "Failed to send message";

/// Something that turns a user query into an assistant message body.
pub trait ChatTransport {
    fn send_chat(&self, query: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// `POST <endpoint>/chat` over a blocking HTTP client.
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: Client,
    chat_url: String,
}

impl HttpChatTransport {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| MchatError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            chat_url: format!("{}/chat", config.endpoint),
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }
}

impl ChatTransport for HttpChatTransport {
    fn send_chat(&self, query: &str) -> Result<String> {
        debug!(url = %self.chat_url, "sending chat query");

        let response = self
            .client
            .post(&self.chat_url)
            .json(&ChatRequest { query })
            .send()
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(%status, "chat endpoint returned an error status");
            return Err(MchatError::Server(server_detail(&body)));
        }

        let payload = response
            .json::<ChatResponse>()
            .map_err(|err| MchatError::Transport(err.to_string()))?;

        match payload.response {
            Value::String(text) => Ok(text),
            other => serde_json::to_string(&other)
                .map_err(|err| MchatError::Serialization(err.to_string())),
        }
    }
}

fn classify_send_error(err: reqwest::Error) -> MchatError {
    if err.is_connect() || err.is_timeout() {
        MchatError::NoResponse
    } else {
        MchatError::Transport(err.to_string())
    }
}

fn server_detail(body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.detail);

    match detail {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        Some(value @ (Value::Array(_) | Value::Object(_))) => value.to_string(),
        _ => FALLBACK_SERVER_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::{ChatTransport, HttpChatTransport, server_detail};
    use crate::config::ChatConfig;
    use crate::error::MchatError;

    fn transport_for(endpoint: &str) -> HttpChatTransport {
        let config = ChatConfig {
            endpoint: endpoint.to_string(),
            timeout: Duration::from_secs(5),
        };
        HttpChatTransport::new(&config).expect("transport")
    }

    #[test]
    fn posts_query_and_returns_string_response() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/chat")
            .match_body(Matcher::Json(json!({"query": "hello"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"hi [Calling tool ls with args .]"}"#)
            .create();

        let transport = transport_for(&server.url());
        assert_eq!(transport.chat_url(), format!("{}/chat", server.url()));

        let reply = transport.send_chat("hello").expect("reply");
        assert_eq!(reply, "hi [Calling tool ls with args .]");
        mock.assert();
    }

    #[test]
    fn stringifies_structured_response() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":{"answer":42}}"#)
            .create();

        let reply = transport_for(&server.url())
            .send_chat("question")
            .expect("reply");

        assert_eq!(reply, r#"{"answer":42}"#);
    }

    #[test]
    fn server_error_uses_detail() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/chat")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"model overloaded"}"#)
            .create();

        let err = transport_for(&server.url())
            .send_chat("hello")
            .expect_err("must fail");

        assert!(matches!(err, MchatError::Server(ref detail) if detail == "model overloaded"));
    }

    #[test]
    fn server_error_without_detail_uses_fallback() {
        assert_eq!(server_detail("<html>bad gateway</html>"), "Failed to send message");
        assert_eq!(server_detail(r#"{"detail":""}"#), "Failed to send message");
        assert_eq!(
            server_detail(r#"{"detail":[{"msg":"field required"}]}"#),
            r#"[{"msg":"field required"}]"#
        );
    }

    #[test]
    fn unreachable_server_reports_no_response() {
        let err = transport_for("http://127.0.0.1:9")
            .send_chat("hello")
            .expect_err("must fail");

        assert!(matches!(err, MchatError::NoResponse));
    }

    #[test]
    fn malformed_success_body_is_a_transport_error() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body("not json")
            .create();

        let err = transport_for(&server.url())
            .send_chat("hello")
            .expect_err("must fail");

        assert!(matches!(err, MchatError::Transport(_)));
    }
}
