// Wire protocol DTOs and conversions for the match server's JSON messages.
// Inbound payloads are validated into use-case types; outbound actions are
// written into the shared `{mensaje_id, token, datos}` envelope.

use crate::domain::{
    BallLocation, ClientAction, ClockTick, Coordinate, DataItem, FieldSnapshot, Occupant, Sector,
    Team, TeamRoster,
};
use crate::use_cases::{ErrorNotice, InboundMessage, MatchUpdate, OutboundMessage, UnknownMessage};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{error, warn};

pub const TAG_REGISTERED: &str = "OK";
pub const TAG_BALL_POSSESSION: &str = "TIENES_LA_PELOTA";
pub const TAG_REACT: &str = "REACCIONAR";
pub const TAG_ERROR: &str = "ERROR";

pub const TAG_REGISTER: &str = "REGISTRAR";
pub const TAG_RUN: &str = "CORRER";
pub const TAG_KICK: &str = "PATEAR";
pub const TAG_PASS: &str = "PASAR_PELOTA";
pub const TAG_MARK: &str = "MARCAR_ADVERSARIO";

/// Reasons a server payload could not be turned into a message.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("invalid {tag} message: {source}")]
    Validation {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct CoordinateDto {
    x: i32,
    y: i32,
}

impl From<CoordinateDto> for Coordinate {
    fn from(c: CoordinateDto) -> Self {
        Coordinate::new(c.x, c.y)
    }
}

#[derive(Debug, Deserialize)]
struct OccupantDto {
    #[serde(rename = "numero")]
    number: u32,
    #[serde(rename = "nombre")]
    name: String,
    #[serde(rename = "equipo_id")]
    team_id: String,
    sector_id: u32,
    #[serde(rename = "es_el_crack", default)]
    is_star: Option<bool>,
    #[serde(rename = "tiene_la_pelota", default)]
    has_ball: Option<bool>,
}

impl From<OccupantDto> for Occupant {
    fn from(o: OccupantDto) -> Self {
        Self {
            number: o.number,
            name: o.name,
            team_id: o.team_id,
            sector_id: o.sector_id,
            is_star: o.is_star,
            has_ball: o.has_ball,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SectorDto {
    id: u32,
    x: i32,
    y: i32,
    #[serde(rename = "ocupantes")]
    occupants: Vec<OccupantDto>,
}

impl From<SectorDto> for Sector {
    fn from(s: SectorDto) -> Self {
        Self {
            id: s.id,
            coordinate: Coordinate::new(s.x, s.y),
            occupants: s.occupants.into_iter().map(Occupant::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TeamDto {
    id: String,
    #[serde(rename = "nombre")]
    name: String,
    #[serde(rename = "formacion")]
    formation: String,
    #[serde(rename = "rol")]
    role: i32,
    #[serde(rename = "goles")]
    goals: u32,
    // Exactly three posts; any other length fails validation.
    #[serde(rename = "arco")]
    goal: [CoordinateDto; 3],
}

impl From<TeamDto> for Team {
    fn from(t: TeamDto) -> Self {
        let [left, center, right] = t.goal;
        Self {
            id: t.id,
            name: t.name,
            formation: t.formation,
            role: t.role,
            goals: t.goals,
            goal: [left.into(), center.into(), right.into()],
        }
    }
}

#[derive(Debug, Deserialize)]
struct BallLocationDto {
    id: u32,
    x: i32,
    y: i32,
    #[serde(rename = "esta_la_pelota", default)]
    lying_free: Option<bool>,
}

impl From<BallLocationDto> for BallLocation {
    fn from(b: BallLocationDto) -> Self {
        Self {
            sector_id: b.id,
            coordinate: Coordinate::new(b.x, b.y),
            lying_free: b.lying_free,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FieldSnapshotDto {
    id: String,
    #[serde(rename = "equipo1")]
    team1: TeamDto,
    #[serde(rename = "equipo2")]
    team2: TeamDto,
    #[serde(rename = "sectores")]
    sectors: Vec<SectorDto>,
    #[serde(rename = "ubicacion_pelota")]
    ball: BallLocationDto,
    #[serde(rename = "time_stamp")]
    timestamp: String,
}

impl From<FieldSnapshotDto> for FieldSnapshot {
    fn from(f: FieldSnapshotDto) -> Self {
        Self {
            id: f.id,
            team1: f.team1.into(),
            team2: f.team2.into(),
            sectors: f.sectors.into_iter().map(Sector::from).collect(),
            ball: f.ball.into(),
            timestamp: f.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClockTickDto {
    #[serde(rename = "reloj")]
    remaining: i64,
}

/// Elements of `datos`, discriminated by their literal `tipo`.
#[derive(Debug, Deserialize)]
#[serde(tag = "tipo")]
enum DataItemDto {
    #[serde(rename = "cancha")]
    Field(FieldSnapshotDto),
    #[serde(rename = "reloj")]
    Clock(ClockTickDto),
}

impl From<DataItemDto> for DataItem {
    fn from(item: DataItemDto) -> Self {
        match item {
            DataItemDto::Field(field) => DataItem::Field(field.into()),
            DataItemDto::Clock(clock) => DataItem::Clock(ClockTick {
                remaining: clock.remaining,
            }),
        }
    }
}

/// Shared body of possession and react notices.
#[derive(Debug, Deserialize)]
struct MatchNoticeDto {
    #[serde(rename = "destinatario")]
    recipient: String,
    #[serde(rename = "datos")]
    items: Vec<DataItemDto>,
}

impl From<MatchNoticeDto> for MatchUpdate {
    fn from(notice: MatchNoticeDto) -> Self {
        let items: Vec<DataItem> = notice.items.into_iter().map(DataItem::from).collect();
        let update = MatchUpdate::from_items(notice.recipient, &items);
        if let Some(snapshot) = &update.snapshot {
            for orphan in snapshot.orphan_occupants() {
                warn!(
                    number = orphan.number,
                    team_id = %orphan.team_id,
                    "occupant belongs to neither team"
                );
            }
        }
        update
    }
}

#[derive(Debug, Deserialize)]
struct RegisteredDto {
    token: String,
    #[serde(rename = "destinatario")]
    recipient: String,
}

#[derive(Debug, Deserialize)]
struct ErrorDetailsDto {
    #[serde(rename = "descripcion")]
    description: String,
    #[serde(flatten)]
    details: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorDto {
    datos: ErrorDetailsDto,
}

type Validator = fn(&Value) -> Result<InboundMessage, serde_json::Error>;

// Dispatch table: one validator per known `mensaje_id`.
const VALIDATORS: &[(&str, Validator)] = &[
    (TAG_REGISTERED, validate_registered),
    (TAG_BALL_POSSESSION, validate_ball_possession),
    (TAG_REACT, validate_react),
    (TAG_ERROR, validate_error),
];

fn validator_for(tag: &str) -> Option<Validator> {
    VALIDATORS
        .iter()
        .find(|(known, _)| *known == tag)
        .map(|(_, validator)| *validator)
}

fn validate_registered(value: &Value) -> Result<InboundMessage, serde_json::Error> {
    let dto = RegisteredDto::deserialize(value)?;
    Ok(InboundMessage::Registered {
        token: dto.token,
        recipient: dto.recipient,
    })
}

fn validate_ball_possession(value: &Value) -> Result<InboundMessage, serde_json::Error> {
    let dto = MatchNoticeDto::deserialize(value)?;
    Ok(InboundMessage::BallPossession(dto.into()))
}

fn validate_react(value: &Value) -> Result<InboundMessage, serde_json::Error> {
    let dto = MatchNoticeDto::deserialize(value)?;
    Ok(InboundMessage::React(dto.into()))
}

fn validate_error(value: &Value) -> Result<InboundMessage, serde_json::Error> {
    let dto = ErrorDto::deserialize(value)?;
    Ok(InboundMessage::ServerError(ErrorNotice {
        description: dto.datos.description,
        details: dto.datos.details,
    }))
}

/// Retries a react notice whose `datos` starts with an echo of a client action.
///
/// The server has been seen to prepend the last `PATEAR` it received to the
/// list; the state data then sits at index 1. Only that single element is
/// kept, so a one-item list comes back empty. This shape is only known for
/// `REACCIONAR`.
fn repair_react(value: &Value) -> Option<InboundMessage> {
    let items = value.get("datos")?.as_array()?;
    let kept: Vec<Value> = items.iter().skip(1).take(1).cloned().collect();
    let mut repaired = value.clone();
    repaired
        .as_object_mut()?
        .insert("datos".to_string(), Value::Array(kept));
    validate_react(&repaired).ok()
}

/// Classifies and validates one raw server payload.
///
/// Unknown or missing `mensaje_id` values are not errors: they decode to
/// [`InboundMessage::Unknown`] so the caller can log and carry on.
pub fn decode_server_message(raw: &str) -> Result<InboundMessage, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        error!(error = %e, bytes = raw.len(), "server message is not valid JSON");
        DecodeError::Syntax(e)
    })?;

    if !value.is_object() {
        error!(payload = %value, "server message is not an object");
        return Err(DecodeError::NotAnObject);
    }

    let tag = value
        .get("mensaje_id")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let Some((tag, validator)) = tag
        .as_deref()
        .and_then(|t| validator_for(t).map(|v| (t.to_owned(), v)))
    else {
        warn!(tag = ?tag, "unrecognised server message");
        return Ok(InboundMessage::Unknown(UnknownMessage { tag, payload: value }));
    };

    match validator(&value) {
        Ok(message) => Ok(message),
        Err(source) => {
            if tag == TAG_REACT {
                if let Some(message) = repair_react(&value) {
                    warn!(%source, "react notice repaired by keeping only its second data item");
                    return Ok(message);
                }
            }
            error!(%tag, error = %source, payload = %value, "invalid server message");
            Err(DecodeError::Validation { tag, source })
        }
    }
}

/// Writes an action into the wire envelope. Total: every field is already valid.
pub fn encode_client_message(message: &OutboundMessage) -> String {
    let (tag, datos) = match &message.action {
        ClientAction::Move(movements) => {
            let movements: Vec<Value> = movements
                .iter()
                .map(|m| {
                    json!({
                        "jugador_numero": m.player,
                        "x": m.destination.x,
                        "y": m.destination.y,
                    })
                })
                .collect();
            (TAG_RUN, json!({ "movimientos": movements }))
        }
        ClientAction::Kick(target) => (TAG_KICK, json!({ "x": target.x, "y": target.y })),
        ClientAction::Pass { player } => (TAG_PASS, json!({ "jugador_numero": player })),
        ClientAction::MarkOpponent { player, opponent } => (
            TAG_MARK,
            json!({ "jugador_numero": player, "adversario_numero": opponent }),
        ),
    };

    json!({
        "mensaje_id": tag,
        "token": message.token,
        "datos": datos,
    })
    .to_string()
}

/// Builds the `REGISTRAR` payload announcing a roster.
pub fn encode_registration(roster: &TeamRoster) -> String {
    let players: Vec<Value> = roster
        .players
        .iter()
        .map(|p| {
            let mut player = json!({
                "numero": p.number,
                "nombre": p.name,
                "equipo_id": roster.id,
            });
            if let Some(is_star) = p.is_star {
                player["es_el_crack"] = Value::Bool(is_star);
            }
            if let Some(has_ball) = p.has_ball {
                player["tiene_la_pelota"] = Value::Bool(has_ball);
            }
            player
        })
        .collect();

    json!({
        "mensaje_id": TAG_REGISTER,
        "datos": {
            "equipo": {
                "id": roster.id,
                "nombre": roster.name,
                "jugadores": players,
                "formacion": roster.formation,
            }
        }
    })
    .to_string()
}
