use crate::domain::match_state::TEAM_ID_PREFIX;
use crate::domain::{BallLocation, Coordinate, FieldSnapshot, Occupant, Sector, Team};

// Shared snapshot builder for deterministic use-case tests.
pub(crate) struct FieldBuilder {
    snapshot: FieldSnapshot,
}

impl FieldBuilder {
    // Two teams on the standard 12x20 grid: "T1" defends y = 0, "T2" defends y = 19.
    pub(crate) fn new() -> Self {
        Self {
            snapshot: FieldSnapshot {
                id: "cancha".to_string(),
                team1: team("T1", 1, 0),
                team2: team("T2", 2, 19),
                sectors: Vec::new(),
                ball: BallLocation {
                    sector_id: 0,
                    coordinate: Coordinate::new(6, 10),
                    lying_free: None,
                },
                timestamp: "1746583658540".to_string(),
            },
        }
    }

    pub(crate) fn player(mut self, team: &str, number: u32, x: i32, y: i32) -> Self {
        self.push(team, number, x, y, None);
        self
    }

    pub(crate) fn carrier(mut self, team: &str, number: u32, x: i32, y: i32) -> Self {
        self.push(team, number, x, y, Some(true));
        self
    }

    pub(crate) fn free_ball(mut self, x: i32, y: i32) -> Self {
        self.snapshot.ball.coordinate = Coordinate::new(x, y);
        self.snapshot.ball.lying_free = Some(true);
        self
    }

    pub(crate) fn ball_in_air(mut self, x: i32, y: i32) -> Self {
        self.snapshot.ball.coordinate = Coordinate::new(x, y);
        self.snapshot.ball.lying_free = Some(false);
        self
    }

    pub(crate) fn build(self) -> FieldSnapshot {
        self.snapshot
    }

    fn push(&mut self, team: &str, number: u32, x: i32, y: i32, has_ball: Option<bool>) {
        let coordinate = Coordinate::new(x, y);
        let sector_id = (y * 12 + x) as u32;
        let occupant = Occupant {
            number,
            name: format!("{team}-{number}"),
            team_id: format!("{TEAM_ID_PREFIX}{team}"),
            sector_id,
            is_star: None,
            has_ball,
        };
        // Players sharing a cell go into the same sector, like a tackle.
        match self
            .snapshot
            .sectors
            .iter_mut()
            .find(|s| s.coordinate == coordinate)
        {
            Some(sector) => sector.occupants.push(occupant),
            None => self.snapshot.sectors.push(Sector {
                id: sector_id,
                coordinate,
                occupants: vec![occupant],
            }),
        }
    }
}

fn team(id: &str, role: i32, goal_y: i32) -> Team {
    Team {
        id: format!("{TEAM_ID_PREFIX}{id}"),
        name: id.to_string(),
        formation: "4-4-2".to_string(),
        role,
        goals: 0,
        goal: [
            Coordinate::new(5, goal_y),
            Coordinate::new(6, goal_y),
            Coordinate::new(7, goal_y),
        ],
    }
}
