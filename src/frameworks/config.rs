use std::{env, path::PathBuf, time::Duration};

// Runtime/agent constants (not tactics).

pub fn server_url() -> String {
    env::var("AGENT_SERVER_URL").unwrap_or_else(|_| "wss://machuca.com.ar:4000".to_string())
}

pub fn roster_path() -> PathBuf {
    env::var("AGENT_ROSTER_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("rosters/pineyro.toml"))
}

// Receive window before the transport reports an idle tick.
pub fn recv_timeout() -> Duration {
    let millis = env::var("AGENT_RECV_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(5000);
    Duration::from_millis(millis)
}

pub fn register_timeout() -> Duration {
    let millis = env::var("AGENT_REGISTER_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(5000);
    Duration::from_millis(millis)
}

// Certificate checks on wss:// stay off unless explicitly switched on.
pub fn tls_insecure() -> bool {
    env::var("AGENT_TLS_INSECURE")
        .map(|value| parse_flag(&value))
        .unwrap_or(true)
}

// An empty AGENT_LOG_DIR disables the log files.
pub fn log_dir() -> Option<PathBuf> {
    match env::var("AGENT_LOG_DIR") {
        Ok(dir) if dir.trim().is_empty() => None,
        Ok(dir) => Some(PathBuf::from(dir)),
        Err(_) => Some(PathBuf::from("logs")),
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
