// Domain layer: field geometry, match state and tactical actions.

pub mod actions;
pub mod geometry;
pub mod match_state;
pub mod ports;
pub mod roster;

pub use actions::{ClientAction, Movement};
pub use geometry::{Coordinate, distance};
pub use match_state::{
    BallLocation, BallState, ClockTick, DataItem, FieldSnapshot, Occupant, PlayerPosition, Sector,
    Team,
};
pub use roster::{RosterPlayer, TeamRoster};
