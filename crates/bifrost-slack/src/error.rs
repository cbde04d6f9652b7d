/// Errors produced by the Slack adapter.
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The Web API answered `ok: false`.
    #[error("slack api error: {0}")]
    Api(String),
}
