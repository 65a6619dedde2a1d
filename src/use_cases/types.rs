// Use-case level inputs/outputs for the decision engine.

use crate::domain::match_state::{self, extract_clock, extract_field};
use crate::domain::{ClientAction, ClockTick, Coordinate, DataItem, FieldSnapshot};

/// State carried by a possession or react notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchUpdate {
    pub recipient: String,
    pub snapshot: Option<FieldSnapshot>,
    pub clock: Option<ClockTick>,
}

impl MatchUpdate {
    /// Folds the server's mixed `datos` list into explicit fields.
    pub fn from_items(recipient: impl Into<String>, items: &[DataItem]) -> Self {
        Self {
            recipient: recipient.into(),
            snapshot: extract_field(items),
            clock: extract_clock(items),
        }
    }

    pub fn goal_center(&self, team_id: &str, opponents: bool) -> Option<Coordinate> {
        self.snapshot
            .as_ref()
            .map(|snapshot| match_state::goal_center(snapshot, team_id, opponents))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNotice {
    pub description: String,
    // Any other fields the server attached next to the description.
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// A structurally valid payload whose `mensaje_id` is not one we handle.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownMessage {
    pub tag: Option<String>,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    // Registration accepted; the token authenticates every later action.
    Registered {
        token: String,
        recipient: String,
    },
    // Our team holds the ball and must attack.
    BallPossession(MatchUpdate),
    // Something happened that needs a defensive or positional answer.
    React(MatchUpdate),
    ServerError(ErrorNotice),
    Unknown(UnknownMessage),
}

impl InboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Registered { .. } => "registered",
            InboundMessage::BallPossession(_) => "ball_possession",
            InboundMessage::React(_) => "react",
            InboundMessage::ServerError(_) => "server_error",
            InboundMessage::Unknown(_) => "unknown",
        }
    }
}

/// Identity the decision engine acts on behalf of. Owned by the connection.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub team_id: &'a str,
    pub token: &'a str,
}

/// An action ready to be put in the wire envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub token: String,
    pub action: ClientAction,
}

/// Anomalies recorded while deciding; none of them aborts a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    MissingSnapshot,
    NoOwnPlayers,
    MarkTargetNotFound { holder: u32 },
    ServerError { description: String },
    UnknownMessage { tag: Option<String>, payload: serde_json::Value },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decision {
    pub action: Option<OutboundMessage>,
    pub diagnostic: Option<Diagnostic>,
}

impl Decision {
    pub fn act(action: OutboundMessage) -> Self {
        Self {
            action: Some(action),
            diagnostic: None,
        }
    }

    pub fn fallback(action: OutboundMessage, diagnostic: Diagnostic) -> Self {
        Self {
            action: Some(action),
            diagnostic: Some(diagnostic),
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }

    pub fn report(diagnostic: Diagnostic) -> Self {
        Self {
            action: None,
            diagnostic: Some(diagnostic),
        }
    }
}
