// Loads the team roster announced on registration from a TOML file.

use crate::domain::{RosterPlayer, TeamRoster};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid roster {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("roster {path} has no players")]
    Empty { path: String },
    #[error("roster {path} lists player number {number} twice")]
    DuplicateNumber { path: String, number: u32 },
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    id: String,
    name: String,
    formation: String,
    #[serde(default)]
    players: Vec<PlayerEntry>,
}

#[derive(Debug, Deserialize)]
struct PlayerEntry {
    number: u32,
    name: String,
    star: Option<bool>,
    starts_with_ball: Option<bool>,
}

impl From<PlayerEntry> for RosterPlayer {
    fn from(entry: PlayerEntry) -> Self {
        Self {
            number: entry.number,
            name: entry.name,
            is_star: entry.star,
            has_ball: entry.starts_with_ball,
        }
    }
}

pub fn load_roster(path: &Path) -> Result<TeamRoster, RosterError> {
    let origin = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| RosterError::Read {
        path: origin.clone(),
        source,
    })?;
    parse_roster(&text, &origin)
}

/// Parses roster TOML; `origin` only labels errors.
pub fn parse_roster(text: &str, origin: &str) -> Result<TeamRoster, RosterError> {
    let file: RosterFile = toml::from_str(text).map_err(|source| RosterError::Parse {
        path: origin.to_string(),
        source,
    })?;

    if file.players.is_empty() {
        return Err(RosterError::Empty {
            path: origin.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for player in &file.players {
        if !seen.insert(player.number) {
            return Err(RosterError::DuplicateNumber {
                path: origin.to_string(),
                number: player.number,
            });
        }
    }

    Ok(TeamRoster {
        id: file.id,
        name: file.name,
        formation: file.formation,
        players: file.players.into_iter().map(RosterPlayer::from).collect(),
    })
}
