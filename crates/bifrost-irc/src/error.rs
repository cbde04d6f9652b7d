/// Errors produced by the IRC adapter.
#[derive(Debug, thiserror::Error)]
pub enum IrcError {
    #[error("irc error: {0}")]
    Client(#[from] irc::error::Error),
}
