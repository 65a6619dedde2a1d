// Registration handshake and the half-duplex decision loop over a match channel.

use crate::domain::TeamRoster;
use crate::domain::ports::{Incoming, MatchChannel};
use crate::interface_adapters::protocol::{
    decode_server_message, encode_client_message, encode_registration,
};
use crate::use_cases::decide::decide;
use crate::use_cases::{Diagnostic, InboundMessage, MatchContext};
use tracing::{debug, error, info, warn};

// Consecutive undecodable messages tolerated before giving up on the server.
pub const MAX_INVALID_MESSAGES: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("match channel error: {0}")]
    Channel(String),
    #[error("registration rejected: {0}")]
    RegistrationRejected(String),
    #[error("channel closed before registration completed")]
    ClosedBeforeRegistration,
    #[error("too many invalid server messages")]
    TooManyInvalid,
}

/// A server error notice paired with the action it most likely refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerErrorRecord {
    pub description: String,
    pub last_sent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub msgs_in: u64,
    pub msgs_out: u64,
    pub invalid: u64,
    pub unknown: u64,
    pub server_errors: Vec<ServerErrorRecord>,
}

enum LoopControl {
    Continue,
    Disconnect,
}

/// Announces the roster and waits for the session token.
pub async fn register<C: MatchChannel>(
    channel: &mut C,
    roster: &TeamRoster,
) -> Result<String, SessionError> {
    channel
        .send(encode_registration(roster))
        .await
        .map_err(SessionError::Channel)?;
    info!(team = %roster.name, players = roster.players.len(), "registration sent");

    loop {
        let raw = match channel.recv().await.map_err(SessionError::Channel)? {
            Incoming::Text(raw) => raw,
            Incoming::Idle => {
                warn!("no registration response yet; still waiting");
                continue;
            }
            Incoming::Closed => return Err(SessionError::ClosedBeforeRegistration),
        };

        match decode_server_message(&raw) {
            Ok(InboundMessage::Registered { token, .. }) => {
                info!("registration accepted");
                return Ok(token);
            }
            Ok(InboundMessage::ServerError(notice)) => {
                return Err(SessionError::RegistrationRejected(notice.description));
            }
            Ok(other) => {
                warn!(kind = other.kind(), "unexpected message while registering");
            }
            Err(e) => {
                warn!(error = %e, "undecodable message while registering");
            }
        }
    }
}

/// Runs the decision loop until the server closes the channel.
///
/// Each inbound message is decided and its action sent before the next one
/// is read.
pub async fn run_session<C: MatchChannel>(
    channel: &mut C,
    ctx: &MatchContext<'_>,
) -> Result<SessionReport, SessionError> {
    let mut report = SessionReport::default();
    let mut last_sent: Option<String> = None;
    let mut invalid_streak: u32 = 0;

    loop {
        let incoming = channel.recv().await.map_err(SessionError::Channel)?;
        let control = handle_incoming(
            channel,
            incoming,
            ctx,
            &mut report,
            &mut last_sent,
            &mut invalid_streak,
        )
        .await?;
        if let LoopControl::Disconnect = control {
            break;
        }
    }

    debug!(
        msgs_in = report.msgs_in,
        msgs_out = report.msgs_out,
        invalid = report.invalid,
        unknown = report.unknown,
        server_errors = report.server_errors.len(),
        "session stats"
    );
    Ok(report)
}

async fn handle_incoming<C: MatchChannel>(
    channel: &mut C,
    incoming: Incoming,
    ctx: &MatchContext<'_>,
    report: &mut SessionReport,
    last_sent: &mut Option<String>,
    invalid_streak: &mut u32,
) -> Result<LoopControl, SessionError> {
    let raw = match incoming {
        Incoming::Text(raw) => raw,
        Incoming::Idle => return Ok(LoopControl::Continue),
        Incoming::Closed => {
            info!("match channel closed");
            return Ok(LoopControl::Disconnect);
        }
    };
    report.msgs_in += 1;

    let message = match decode_server_message(&raw) {
        Ok(message) => message,
        Err(_) => {
            // Already logged by the decoder.
            report.invalid += 1;
            *invalid_streak += 1;
            if *invalid_streak > MAX_INVALID_MESSAGES {
                return Err(SessionError::TooManyInvalid);
            }
            return Ok(LoopControl::Continue);
        }
    };
    *invalid_streak = 0;

    let decision = decide(&message, ctx);
    match decision.diagnostic {
        Some(Diagnostic::ServerError { description }) => {
            error!(
                %description,
                last_sent = last_sent.as_deref().unwrap_or("<none>"),
                "server rejected a message"
            );
            report.server_errors.push(ServerErrorRecord {
                description,
                last_sent: last_sent.clone(),
            });
        }
        Some(Diagnostic::UnknownMessage { .. }) => report.unknown += 1,
        Some(other) => debug!(diagnostic = ?other, "decision used a fallback"),
        None => {}
    }

    if let Some(action) = decision.action {
        let text = encode_client_message(&action);
        channel
            .send(text.clone())
            .await
            .map_err(SessionError::Channel)?;
        report.msgs_out += 1;
        *last_sent = Some(text);
    }

    Ok(LoopControl::Continue)
}
