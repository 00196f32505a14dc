use std::future::Future;
use std::time::Duration;

use futures_util::stream::BoxStream;
use reqwest::Client;
use serde::Deserialize;
use tokio_stream::StreamExt;
use tracing::{debug, info};

use crate::error::{Result, StreamError};
use crate::form::FormSubmission;

/// Response body as a sequence of byte chunks, pulled one at a time.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>>>;

/// The game server as seen by the renderer.
pub trait GameEndpoint {
    /// Submit the form and hand back the streamed, newline-delimited body.
    fn start_game(&self, form: &FormSubmission) -> impl Future<Output = Result<ChunkStream>> + Send;

    /// Ask the server to persist the current conversation.
    fn save_conversation(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Acknowledgement body of the save endpoint.
#[derive(Debug, Deserialize)]
pub struct SaveAck {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

// -- HTTP implementation ----------------------------------------------------

pub struct HttpEndpoint {
    client: Client,
    base_url: String,
    start_path: String,
    save_path: String,
}

impl HttpEndpoint {
    pub fn new(
        base_url: impl Into<String>,
        start_path: impl Into<String>,
        save_path: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        // No overall request timeout: a game stream legitimately runs for minutes.
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(HttpEndpoint {
            client,
            base_url: base_url.into(),
            start_path: start_path.into(),
            save_path: save_path.into(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl GameEndpoint for HttpEndpoint {
    async fn start_game(&self, form: &FormSubmission) -> Result<ChunkStream> {
        let url = self.url(&self.start_path);
        info!(%url, fields = form.len(), "submitting game form");

        let response = self.client.post(&url).json(form).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::Status { status, body });
        }

        debug!(status = response.status().as_u16(), "response headers received");
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(StreamError::from));
        Ok(Box::pin(chunks))
    }

    async fn save_conversation(&self) -> Result<()> {
        let url = self.url(&self.save_path);
        info!(%url, "saving conversation");

        let response = self.client.post(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let ack = serde_json::from_str::<SaveAck>(&body).ok();

        if !status.is_success() {
            return Err(match ack {
                Some(SaveAck { message: Some(message), .. }) => StreamError::SaveRejected(message),
                _ => StreamError::Status { status: status.as_u16(), body },
            });
        }
        if let Some(ack) = ack {
            if ack.status == "error" {
                return Err(StreamError::SaveRejected(
                    ack.message.unwrap_or_else(|| "unknown error".to_string()),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(base: &str) -> HttpEndpoint {
        HttpEndpoint::new(base, "/start_game", "save_conversation", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_url_joins_single_slash() {
        assert_eq!(endpoint("http://localhost:5000/").url("/start_game"), "http://localhost:5000/start_game");
        assert_eq!(endpoint("http://localhost:5000").url("start_game"), "http://localhost:5000/start_game");
    }

    #[test]
    fn test_save_ack_parses_error_message() {
        let ack: SaveAck =
            serde_json::from_str(r#"{"status":"error","message":"Game not started"}"#).unwrap();
        assert_eq!(ack.status, "error");
        assert_eq!(ack.message.as_deref(), Some("Game not started"));
    }

    #[test]
    fn test_save_ack_message_optional() {
        let ack: SaveAck = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(ack.message.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let ep = endpoint(&format!("http://127.0.0.1:{}", port));
        let result = ep.start_game(&FormSubmission::default()).await;
        assert!(matches!(result, Err(StreamError::Transport(_))));
    }
}
