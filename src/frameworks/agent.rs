use crate::domain::TeamRoster;
use crate::domain::ports::{Incoming, MatchChannel};
use crate::frameworks::config;
use crate::frameworks::roster::{RosterError, load_roster};
use crate::interface_adapters::session::{self, SessionError, SessionReport};
use crate::use_cases::MatchContext;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{Instrument, debug, info, info_span, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
    #[error("invalid TLS client configuration: {0}")]
    Tls(String),
    #[error("no registration response within {0:?}")]
    RegistrationTimeout(Duration),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Per-run log files: everything at the active level, plus errors alone.
struct LogFiles {
    all: File,
    errors: File,
}

fn open_log_files(dir: &Path) -> std::io::Result<LogFiles> {
    std::fs::create_dir_all(dir)?;
    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    Ok(LogFiles {
        all: File::create(dir.join(format!("agent_{started}.log")))?,
        errors: File::create(dir.join(format!("agent_error_{started}.log")))?,
    })
}

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let console = if matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json")) {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .json()
            .with_current_span(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .compact()
            .boxed()
    };

    let (files, files_failed) = match config::log_dir() {
        Some(dir) => match open_log_files(&dir) {
            Ok(files) => (Some(files), None),
            Err(e) => (None, Some((dir, e))),
        },
        None => (None, None),
    };
    let (all_layer, error_layer) = match files {
        Some(LogFiles { all, errors }) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(all)),
            ),
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(Arc::new(errors))
                    .with_filter(LevelFilter::ERROR),
            ),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(all_layer)
        .with(error_layer)
        .init();

    if let Some((dir, e)) = files_failed {
        warn!(dir = %dir.display(), error = %e, "log files unavailable; logging to console only");
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "agent panicked");
    }));
}

/// Reads configuration from the environment and plays one match.
pub async fn run_with_config() -> Result<(), AgentError> {
    init_runtime();

    let url = config::server_url();
    let roster = load_roster(&config::roster_path())?;
    let span = info_span!("agent", team = %roster.name, team_id = %roster.id);
    let report = run(
        &url,
        &roster,
        config::register_timeout(),
        config::recv_timeout(),
        config::tls_insecure(),
    )
    .instrument(span.clone())
    .await?;

    span.in_scope(|| {
        info!(
            msgs_in = report.msgs_in,
            msgs_out = report.msgs_out,
            invalid = report.invalid,
            unknown = report.unknown,
            server_errors = report.server_errors.len(),
            "match finished"
        );
    });
    Ok(())
}

pub async fn run(
    url: &str,
    roster: &TeamRoster,
    register_timeout: Duration,
    recv_timeout: Duration,
    tls_insecure: bool,
) -> Result<SessionReport, AgentError> {
    let socket = connect(url, tls_insecure).await?;
    info!(%url, "connected");

    let mut channel = WsChannel::new(socket, recv_timeout);

    let token = match timeout(register_timeout, session::register(&mut channel, roster)).await {
        Ok(result) => result?,
        Err(_) => {
            channel.close().await;
            return Err(AgentError::RegistrationTimeout(register_timeout));
        }
    };

    // The server labels our side of the field with the session token.
    let ctx = MatchContext {
        team_id: &token,
        token: &token,
    };
    let report = session::run_session(&mut channel, &ctx).await?;
    channel.close().await;
    Ok(report)
}

#[cfg(feature = "tls")]
async fn connect(url: &str, tls_insecure: bool) -> Result<Socket, AgentError> {
    let connector = if url.starts_with("wss://") {
        crate::frameworks::tls::connector(tls_insecure)
            .map_err(|e| AgentError::Tls(e.to_string()))?
    } else {
        None
    };
    if connector.is_some() {
        warn!(%url, "server certificate will not be verified");
    }

    tokio_tungstenite::connect_async_tls_with_config(url, None, false, connector)
        .await
        .map(|(socket, _response)| socket)
        .map_err(|e| AgentError::Connect {
            url: url.to_string(),
            source: Box::new(e),
        })
}

#[cfg(not(feature = "tls"))]
async fn connect(url: &str, tls_insecure: bool) -> Result<Socket, AgentError> {
    if tls_insecure && url.starts_with("wss://") {
        warn!(%url, "built without tls; secure endpoints cannot be reached");
    }

    tokio_tungstenite::connect_async(url)
        .await
        .map(|(socket, _response)| socket)
        .map_err(|e| AgentError::Connect {
            url: url.to_string(),
            source: Box::new(e),
        })
}

/// WebSocket transport behind the match channel port.
pub struct WsChannel {
    socket: Socket,
    recv_timeout: Duration,
}

impl WsChannel {
    pub fn new(socket: Socket, recv_timeout: Duration) -> Self {
        Self {
            socket,
            recv_timeout,
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.socket.close(None).await {
            debug!(error = %e, "close handshake failed");
        }
    }
}

#[async_trait]
impl MatchChannel for WsChannel {
    async fn recv(&mut self) -> Result<Incoming, String> {
        loop {
            let next = match timeout(self.recv_timeout, self.socket.next()).await {
                Ok(next) => next,
                Err(_) => return Ok(Incoming::Idle),
            };

            match next {
                None => return Ok(Incoming::Closed),
                Some(Err(e)) => return Err(e.to_string()),
                Some(Ok(Message::Text(text))) => return Ok(Incoming::Text(text.as_str().to_owned())),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "server closed the connection");
                    return Ok(Incoming::Closed);
                }
                Some(Ok(Message::Binary(bytes))) => {
                    warn!(len = bytes.len(), "binary frame ignored");
                }
                // Ping/pong are answered by tungstenite itself.
                Some(Ok(_)) => {}
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<(), String> {
        self.socket
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| e.to_string())
    }
}
