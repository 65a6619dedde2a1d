// Shared wire fixtures and a loopback match server for integration tests.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

pub const TEAM_PREFIX: &str = "equipo:";

fn team_json(id: &str, role: i32, goal_y: i32) -> Value {
    json!({
        "id": format!("{TEAM_PREFIX}{id}"),
        "nombre": id,
        "formacion": "4-4-2",
        "rol": role,
        "goles": 0,
        "arco": [{"x": 5, "y": goal_y}, {"x": 6, "y": goal_y}, {"x": 7, "y": goal_y}]
    })
}

/// Builds a `cancha` data item: `home` defends y = 0, `away` defends y = 19.
pub struct Field {
    home: String,
    away: String,
    sectors: Vec<Value>,
    ball: Value,
}

impl Field {
    pub fn new(home: &str, away: &str) -> Self {
        Self {
            home: home.to_string(),
            away: away.to_string(),
            sectors: Vec::new(),
            ball: json!({"id": 126, "x": 6, "y": 10, "ocupantes": []}),
        }
    }

    pub fn player(self, team: &str, number: u32, x: i32, y: i32) -> Self {
        self.occupant(team, number, x, y, false)
    }

    pub fn carrier(self, team: &str, number: u32, x: i32, y: i32) -> Self {
        self.occupant(team, number, x, y, true)
    }

    pub fn free_ball(mut self, x: i32, y: i32) -> Self {
        self.ball = json!({"id": y * 12 + x, "x": x, "y": y, "ocupantes": [], "esta_la_pelota": true});
        self
    }

    fn occupant(mut self, team: &str, number: u32, x: i32, y: i32, has_ball: bool) -> Self {
        let id = y * 12 + x;
        self.sectors.push(json!({
            "id": id,
            "x": x,
            "y": y,
            "ocupantes": [{
                "numero": number,
                "nombre": format!("{team}-{number}"),
                "equipo_id": format!("{TEAM_PREFIX}{team}"),
                "sector_id": id,
                "tiene_la_pelota": has_ball
            }]
        }));
        self
    }

    pub fn json(&self) -> Value {
        json!({
            "tipo": "cancha",
            "id": "cancha",
            "equipo1": team_json(&self.home, 1, 0),
            "equipo2": team_json(&self.away, 2, 19),
            "sectores": self.sectors,
            "ubicacion_pelota": self.ball,
            "time_stamp": "1746583658540"
        })
    }
}

pub fn clock(remaining: i64) -> Value {
    json!({"tipo": "reloj", "reloj": remaining})
}

pub fn notice(tag: &str, recipient: &str, datos: Vec<Value>) -> String {
    json!({"mensaje_id": tag, "destinatario": recipient, "datos": datos}).to_string()
}

pub fn registered(token: &str) -> String {
    json!({"mensaje_id": "OK", "destinatario": token, "token": token}).to_string()
}

pub fn server_error(description: &str) -> String {
    json!({"mensaje_id": "ERROR", "datos": {"descripcion": description}}).to_string()
}

/// What the loopback server saw from the agent.
#[derive(Debug)]
pub struct ServerLog {
    pub registration: Value,
    pub actions: Vec<Value>,
}

// Serves exactly one agent: answers its registration with `token`, plays the
// script, collects up to `expected_actions` replies and then closes.
pub async fn spawn_match_server(
    token: &str,
    script: Vec<String>,
    expected_actions: usize,
) -> (String, JoinHandle<ServerLog>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    let token = token.to_string();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("agent connects");
        let mut socket = tokio_tungstenite::accept_async(stream)
            .await
            .expect("websocket handshake");

        let registration = next_json(&mut socket).await.expect("registration frame");
        socket
            .send(Message::Text(registered(&token).into()))
            .await
            .expect("send OK");

        for text in script {
            socket
                .send(Message::Text(text.into()))
                .await
                .expect("send scripted message");
        }

        let mut actions = Vec::new();
        while actions.len() < expected_actions {
            match tokio::time::timeout(Duration::from_secs(2), next_json(&mut socket)).await {
                Ok(Some(action)) => actions.push(action),
                _ => break,
            }
        }

        let _ = socket.close(None).await;
        ServerLog {
            registration,
            actions,
        }
    });

    (format!("ws://{addr}"), handle)
}

async fn next_json<S>(socket: &mut tokio_tungstenite::WebSocketStream<S>) -> Option<Value>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    while let Some(frame) = socket.next().await {
        match frame.ok()? {
            Message::Text(text) => return serde_json::from_str(text.as_str()).ok(),
            Message::Close(_) => return None,
            _ => {}
        }
    }
    None
}
