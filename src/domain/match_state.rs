// Field snapshot types and the read-only accessors the tactics are built on.

use super::geometry::Coordinate;
use tracing::{info, warn};

/// Literal prefix the server puts in front of every team identifier.
pub const TEAM_ID_PREFIX: &str = "equipo:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub number: u32,
    pub name: String,
    // Prefixed owning-team identifier, e.g. "equipo:TOKEN-...".
    pub team_id: String,
    pub sector_id: u32,
    pub is_star: Option<bool>,
    pub has_ball: Option<bool>,
}

impl Occupant {
    /// True when the occupant belongs to the team with the given unprefixed id.
    pub fn plays_for(&self, team_id: &str) -> bool {
        self.team_id.strip_prefix(TEAM_ID_PREFIX) == Some(team_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sector {
    pub id: u32,
    pub coordinate: Coordinate,
    // Players from both teams can share a cell during a tackle.
    pub occupants: Vec<Occupant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub formation: String,
    pub role: i32,
    pub goals: u32,
    /// Left post, centre, right post.
    pub goal: [Coordinate; 3],
}

impl Team {
    pub fn goal_center(&self) -> Coordinate {
        self.goal[1]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallLocation {
    pub sector_id: u32,
    pub coordinate: Coordinate,
    pub lying_free: Option<bool>,
}

/// One server picture of the whole pitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSnapshot {
    pub id: String,
    pub team1: Team,
    pub team2: Team,
    pub sectors: Vec<Sector>,
    pub ball: BallLocation,
    pub timestamp: String,
}

impl FieldSnapshot {
    /// Occupants whose team id matches neither team of the snapshot.
    pub fn orphan_occupants(&self) -> impl Iterator<Item = &Occupant> {
        self.sectors
            .iter()
            .flat_map(|sector| sector.occupants.iter())
            .filter(|o| o.team_id != self.team1.id && o.team_id != self.team2.id)
    }
}

/// Remaining match time as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub remaining: i64,
}

/// One element of the heterogeneous `datos` list of a match update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataItem {
    Field(FieldSnapshot),
    Clock(ClockTick),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerPosition {
    pub number: u32,
    pub coordinate: Coordinate,
}

/// Resolved ball position and, when someone carries it, the carrier's number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallState {
    pub coordinate: Coordinate,
    pub holder: Option<u32>,
}

/// Returns the first field snapshot in the list, if any.
pub fn extract_field(items: &[DataItem]) -> Option<FieldSnapshot> {
    let field = items.iter().find_map(|item| match item {
        DataItem::Field(snapshot) => Some(snapshot.clone()),
        DataItem::Clock(_) => None,
    });
    if field.is_none() {
        warn!(items = items.len(), "match update carries no field snapshot");
    }
    field
}

/// Returns the first clock tick in the list, if any.
pub fn extract_clock(items: &[DataItem]) -> Option<ClockTick> {
    items.iter().find_map(|item| match item {
        DataItem::Clock(clock) => Some(*clock),
        DataItem::Field(_) => None,
    })
}

/// Positions of one side of the pitch, in sector order.
///
/// With `opponents == false` these are the players of `team_id`; otherwise
/// every occupant not on that team. Occupants have no sub-cell offset, so each
/// one takes its sector's coordinate.
pub fn positions_of(snapshot: &FieldSnapshot, team_id: &str, opponents: bool) -> Vec<PlayerPosition> {
    snapshot
        .sectors
        .iter()
        .flat_map(|sector| {
            sector
                .occupants
                .iter()
                .filter(move |o| o.plays_for(team_id) != opponents)
                .map(move |o| PlayerPosition {
                    number: o.number,
                    coordinate: sector.coordinate,
                })
        })
        .collect()
}

pub fn position_of(
    snapshot: &FieldSnapshot,
    team_id: &str,
    number: u32,
    opponents: bool,
) -> Option<Coordinate> {
    positions_of(snapshot, team_id, opponents)
        .into_iter()
        .find(|p| p.number == number)
        .map(|p| p.coordinate)
}

/// Centre of a goal, following the server's fixed two-team layout.
///
/// Team 1's goal is only returned when `opponents` is set and the caller is
/// not team 1; every other combination yields team 2's goal.
pub fn goal_center(snapshot: &FieldSnapshot, team_id: &str, opponents: bool) -> Coordinate {
    let caller_is_team1 = snapshot.team1.id.strip_prefix(TEAM_ID_PREFIX) == Some(team_id);
    if opponents && !caller_is_team1 {
        snapshot.team1.goal_center()
    } else {
        snapshot.team2.goal_center()
    }
}

/// Where the ball is and who, if anyone, carries it.
///
/// A ball that is neither lying free nor carried is in the air; it resolves to
/// the last reported ball location.
pub fn ball_location(snapshot: &FieldSnapshot) -> BallState {
    if snapshot.ball.lying_free == Some(true) {
        return BallState {
            coordinate: snapshot.ball.coordinate,
            holder: None,
        };
    }

    let carrier = snapshot.sectors.iter().find_map(|sector| {
        sector
            .occupants
            .iter()
            .find(|o| o.has_ball == Some(true))
            .map(|o| (sector.coordinate, o.number))
    });
    if let Some((coordinate, number)) = carrier {
        return BallState {
            coordinate,
            holder: Some(number),
        };
    }

    info!(
        x = snapshot.ball.coordinate.x,
        y = snapshot.ball.coordinate.y,
        "ball in the air"
    );
    BallState {
        coordinate: snapshot.ball.coordinate,
        holder: None,
    }
}
