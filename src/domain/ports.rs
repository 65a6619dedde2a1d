use async_trait::async_trait;

/// Text frames received from a match channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Text(String),
    // Nothing arrived within the receive window.
    Idle,
    Closed,
}

// Port for the bidirectional text channel to the match server.
// The session loop depends on this trait, not on a concrete socket.
#[async_trait]
pub trait MatchChannel: Send {
    async fn recv(&mut self) -> Result<Incoming, String>;
    async fn send(&mut self, text: String) -> Result<(), String>;
}
