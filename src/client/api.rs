// Proxy API client
// Sends chat requests to the backend and reads JSON or streamed text replies

use super::attachments::PendingAttachment;
use super::ClientError;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Prompt used to ask the model for a conversation title
const TITLE_PROMPT: &str = "Write one short title (at most 5 words, no explanation, no list) for a \
conversation that starts with the following message:\n\"{message}\"\nAnswer with the title only.";

/// One prior message sent as context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub sender: String,
    pub text: String,
}

/// Everything needed for one `POST /api/chat`
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
    pub attachments: Vec<PendingAttachment>,
    pub stream: bool,
}

#[derive(Serialize)]
struct JsonChatBody<'a> {
    message: &'a str,
    history: &'a [HistoryEntry],
    stream: bool,
}

#[derive(Deserialize)]
struct ReplyBody {
    reply: String,
}

/// Client for the chat proxy
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    chat_url: String,
}

impl ProxyClient {
    pub fn new(server_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            chat_url: format!("{}/api/chat", server_url.trim_end_matches('/')),
        }
    }

    /// Send a chat request and return the complete reply
    ///
    /// `on_chunk` sees the reply text as it arrives: once for a JSON reply,
    /// many times for a streamed one. The returned string is the
    /// concatenation of every chunk.
    pub async fn chat<F>(&self, request: &ChatRequest, mut on_chunk: F) -> Result<String, ClientError>
    where
        F: FnMut(&str) + Send,
    {
        let builder = self.http.post(&self.chat_url);
        let builder = if request.attachments.is_empty() {
            builder.json(&JsonChatBody {
                message: &request.message,
                history: &request.history,
                stream: request.stream,
            })
        } else {
            builder.multipart(multipart_form(request)?)
        };

        debug!(
            history_len = request.history.len(),
            attachments = request.attachments.len(),
            stream = request.stream,
            "Sending chat request"
        );
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ReplyBody>(&body)
                .map(|b| b.reply)
                .unwrap_or_else(|_| body.trim().to_string());
            warn!(status = status.as_u16(), "Chat request failed: {}", message);
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);

        let reply = if is_json {
            let body: ReplyBody = response.json().await?;
            on_chunk(&body.reply);
            body.reply
        } else {
            let mut decoder = Utf8Chunks::default();
            let mut reply = String::new();
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let text = decoder.push(&chunk?);
                if !text.is_empty() {
                    on_chunk(&text);
                    reply.push_str(&text);
                }
            }
            let rest = decoder.finish();
            if !rest.is_empty() {
                on_chunk(&rest);
                reply.push_str(&rest);
            }
            reply
        };

        if reply.trim().is_empty() {
            return Err(ClientError::EmptyReply);
        }
        Ok(reply)
    }

    /// Ask the model for a short title for a conversation's first message
    ///
    /// Returns `None` when the reply is blank once cleaned up.
    pub async fn generate_title(&self, first_message: &str) -> Result<Option<String>, ClientError> {
        let request = ChatRequest {
            message: TITLE_PROMPT.replace("{message}", first_message),
            stream: false,
            ..Default::default()
        };
        let reply = self.chat(&request, |_| {}).await?;
        Ok(sanitize_title(&reply))
    }
}

fn multipart_form(request: &ChatRequest) -> Result<Form, ClientError> {
    let mut form = Form::new()
        .text("message", request.message.clone())
        .text("history", serde_json::to_string(&request.history)?)
        .text("stream", request.stream.to_string());

    for attachment in &request.attachments {
        let part = Part::bytes(attachment.data.clone())
            .file_name(attachment.name.clone())
            .mime_str(&attachment.mime_type)?;
        form = form.part("files", part);
    }
    Ok(form)
}

/// Strip quotes and line breaks from a generated title
pub fn sanitize_title(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '"' | '\n' | '\r'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Decodes UTF-8 across chunk boundaries
///
/// A multi-byte character split between two network chunks is held back
/// until the rest of it arrives.
#[derive(Default)]
struct Utf8Chunks {
    pending: Vec<u8>,
}

impl Utf8Chunks {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut text = String::new();
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Incomplete character at the end: keep it for the next chunk
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        let consumed = self.pending.len() - rest.len();
        self.pending.drain(..consumed);
        text
    }

    fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn hello_request(stream: bool) -> ChatRequest {
        ChatRequest {
            message: "hello".to_string(),
            history: vec![HistoryEntry {
                sender: "user".to_string(),
                text: "hi".to_string(),
            }],
            attachments: Vec::new(),
            stream,
        }
    }

    #[tokio::test]
    async fn test_chat_json_reply() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "message": "hello",
                "history": [{"sender": "user", "text": "hi"}],
                "stream": false
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply": "Halo! Ada yang bisa saya bantu?"}"#)
            .create_async()
            .await;

        let client = ProxyClient::new(&server.url());
        let mut chunks = Vec::new();
        let reply = client
            .chat(&hello_request(false), |c| chunks.push(c.to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "Halo! Ada yang bisa saya bantu?");
        assert_eq!(chunks, vec![reply]);
    }

    #[tokio::test]
    async fn test_chat_streamed_reply_concatenates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body("Halo, apa kabar? ✨")
            .create_async()
            .await;

        let client = ProxyClient::new(&format!("{}/", server.url()));
        let mut streamed = String::new();
        let reply = client
            .chat(&hello_request(true), |c| streamed.push_str(c))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "Halo, apa kabar? ✨");
        assert_eq!(streamed, reply);
    }

    #[tokio::test]
    async fn test_chat_error_uses_reply_field() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chat")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply": "Something went wrong"}"#)
            .create_async()
            .await;

        let client = ProxyClient::new(&server.url());
        let result = client.chat(&hello_request(false), |_| {}).await;

        match result {
            Err(ClientError::Server { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Something went wrong");
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_empty_stream_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body("")
            .create_async()
            .await;

        let client = ProxyClient::new(&server.url());
        let result = client.chat(&hello_request(true), |_| {}).await;
        assert!(matches!(result, Err(ClientError::EmptyReply)));
    }

    #[tokio::test]
    async fn test_chat_with_attachments_uses_multipart() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="message""#.to_string()),
                Matcher::Regex(r#"filename="note.txt""#.to_string()),
                Matcher::Regex("remember the milk".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply": "Noted."}"#)
            .create_async()
            .await;

        let mut request = hello_request(false);
        request.attachments.push(PendingAttachment {
            name: "note.txt".to_string(),
            mime_type: "text/plain".to_string(),
            data: b"remember the milk".to_vec(),
        });

        let client = ProxyClient::new(&server.url());
        let reply = client.chat(&request, |_| {}).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "Noted.");
    }

    #[tokio::test]
    async fn test_generate_title_sanitizes_reply() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": false})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reply": "\"Trip to Bali\"\n"}"#)
            .create_async()
            .await;

        let client = ProxyClient::new(&server.url());
        let title = client.generate_title("Plan a trip to Bali").await.unwrap();

        mock.assert_async().await;
        assert_eq!(title.as_deref(), Some("Trip to Bali"));
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("  \"Hello\"  ").as_deref(), Some("Hello"));
        assert_eq!(sanitize_title("Two\nlines").as_deref(), Some("Twolines"));
        assert_eq!(sanitize_title("\"\"\n"), None);
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let bytes = "é✨".as_bytes();
        let mut decoder = Utf8Chunks::default();

        let mut text = decoder.push(&bytes[..1]);
        assert_eq!(text, "");
        text.push_str(&decoder.push(&bytes[1..3]));
        assert_eq!(text, "é");
        text.push_str(&decoder.push(&bytes[3..]));
        text.push_str(&decoder.finish());
        assert_eq!(text, "é✨");
    }

    #[test]
    fn test_invalid_byte_keeps_split_character_intact() {
        let sparkle = "✨".as_bytes();
        let mut chunk = b"a\xffb".to_vec();
        chunk.extend_from_slice(&sparkle[..2]);
        let mut decoder = Utf8Chunks::default();

        let mut text = decoder.push(&chunk);
        assert_eq!(text, "a\u{FFFD}b");
        text.push_str(&decoder.push(&sparkle[2..]));
        text.push_str(&decoder.finish());
        assert_eq!(text, "a\u{FFFD}b✨");
    }
}
