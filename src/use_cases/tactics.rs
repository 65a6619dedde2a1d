// Nearest-player queries over a field snapshot.

use crate::domain::match_state::{position_of, positions_of};
use crate::domain::{Coordinate, FieldSnapshot, distance};
use tracing::{debug, error};

/// Own player closest to `target`.
///
/// Ties go to the player met first in sector order.
pub fn nearest_player_to(snapshot: &FieldSnapshot, team_id: &str, target: Coordinate) -> Option<u32> {
    let players = positions_of(snapshot, team_id, false);
    if players.is_empty() {
        error!(team_id, "no own players on the field");
        return None;
    }

    let mut best: Option<(u32, f64)> = None;
    for player in players {
        let d = distance(player.coordinate, target);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((player.number, d)),
        }
    }

    best.map(|(number, d)| {
        debug!(number, distance = d, x = target.x, y = target.y, "nearest player");
        number
    })
}

/// Own player closest to the rival wearing `opponent`.
pub fn nearest_player_to_opponent(
    snapshot: &FieldSnapshot,
    team_id: &str,
    opponent: u32,
) -> Option<u32> {
    let target = position_of(snapshot, team_id, opponent, true)?;
    nearest_player_to(snapshot, team_id, target)
}
