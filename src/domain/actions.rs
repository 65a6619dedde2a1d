// Tactical actions the agent can send back to the server.

use super::geometry::Coordinate;

/// One player run: `player` heads to `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub player: u32,
    pub destination: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    // One or more players run to a destination cell.
    Move(Vec<Movement>),
    // The ball carrier kicks towards a cell.
    Kick(Coordinate),
    // The ball carrier passes to a teammate.
    Pass { player: u32 },
    // Own `player` marks the rival wearing `opponent`.
    MarkOpponent { player: u32, opponent: u32 },
}

impl ClientAction {
    pub fn run(player: u32, destination: Coordinate) -> Self {
        ClientAction::Move(vec![Movement {
            player,
            destination,
        }])
    }
}
