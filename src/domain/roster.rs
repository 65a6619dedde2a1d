// Team roster announced to the server on registration.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterPlayer {
    pub number: u32,
    pub name: String,
    pub is_star: Option<bool>,
    pub has_ball: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRoster {
    pub id: String,
    pub name: String,
    pub formation: String,
    pub players: Vec<RosterPlayer>,
}
