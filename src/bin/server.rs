use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use maze_arcade_server::constants::TICK_MS;
use maze_arcade_server::engine::GameSession;
use maze_arcade_server::score_ledger::LedgerStore;
use maze_arcade_server::server_protocol::{parse_client_message, ParsedClientMessage};
use maze_arcade_server::types::{
    Difficulty, Direction, Phase, RuntimeEvent, SessionCommand, TickInput,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
    name: Option<String>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    pilot_id: Option<String>,
    session: GameSession,
    held_dir: Direction,
    pending_commands: Vec<SessionCommand>,
    ledger_store: LedgerStore,
    last_tick_at: Instant,
}

impl ServerState {
    fn new(session: GameSession, ledger_store: LedgerStore) -> Self {
        Self {
            clients: HashMap::new(),
            pilot_id: None,
            session,
            held_dir: Direction::None,
            pending_commands: Vec::new(),
            ledger_store,
            last_tick_at: Instant::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScoresQuery {
    tier: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let ledger_path = std::env::var("LEDGER_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/scores.json"));

    let ledger_store = LedgerStore::new(ledger_path);
    let ledgers = ledger_store.load();
    let session = GameSession::new(seed_from_clock(), ledgers);

    let state = Arc::new(Mutex::new(ServerState::new(session, ledger_store)));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/scores", get(scores_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        log::info!("static file root: {}", static_dir.to_string_lossy());
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        log::warn!("static file root not found; serving the API only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    log::info!("listening on :{port}");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn seed_from_clock() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u32
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("../client/dist")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn scores_handler(
    State(state): State<SharedState>,
    Query(query): Query<ScoresQuery>,
) -> impl IntoResponse {
    let tier = query
        .tier
        .as_deref()
        .and_then(Difficulty::parse)
        .unwrap_or(Difficulty::Easy);
    let guard = state.lock().await;
    Json(guard.session.ledgers().build_response(tier))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard.clients.insert(
            client_id.clone(),
            ClientContext {
                tx: tx.clone(),
                name: None,
            },
        );
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(state.clone(), &client_id, raw.to_string()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(state.clone(), &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    handle_disconnect(state, &client_id).await;
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: SharedState, client_id: &str, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_error_to_client(&state, client_id, "invalid message").await;
        return;
    };

    match message {
        ParsedClientMessage::Hello { name } => {
            handle_hello(state, client_id, name).await;
        }
        ParsedClientMessage::Ping { t } => {
            let mut guard = state.lock().await;
            send_to_client(
                &mut guard,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
        ParsedClientMessage::Input { dir } => {
            let mut guard = state.lock().await;
            if guard.pilot_id.as_deref() == Some(client_id) {
                guard.held_dir = dir;
            }
        }
        ParsedClientMessage::Command { command } => {
            let mut guard = state.lock().await;
            if guard.pilot_id.as_deref() == Some(client_id) {
                guard.pending_commands.push(command);
            } else {
                send_to_client(
                    &mut guard,
                    client_id,
                    &json!({
                        "type": "error",
                        "message": "spectators cannot send commands",
                    }),
                    QueuePolicy::DropOnFull,
                );
            }
        }
    }
}

async fn handle_hello(state: SharedState, client_id: &str, name: String) {
    let mut guard = state.lock().await;
    let Some(client) = guard.clients.get_mut(client_id) else {
        return;
    };
    client.name = Some(normalize_name(&name));

    if guard.pilot_id.is_none() {
        guard.pilot_id = Some(client_id.to_string());
        log::info!("client {client_id} pilots the session");
    }
    let role = if guard.pilot_id.as_deref() == Some(client_id) {
        "pilot"
    } else {
        "spectator"
    };

    let world = guard.session.world_init();
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "welcome",
            "role": role,
        }),
        QueuePolicy::DisconnectOnFull,
    );
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "world",
            "init": world,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn normalize_name(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "Player".to_string();
    }
    trimmed.chars().take(16).collect()
}

async fn handle_disconnect(state: SharedState, client_id: &str) {
    let mut guard = state.lock().await;
    guard.clients.remove(client_id);

    if guard.pilot_id.as_deref() == Some(client_id) {
        guard.held_dir = Direction::None;
        guard.pending_commands.clear();
        // Hand the controls to the oldest named client, if any.
        let next_pilot = guard
            .clients
            .iter()
            .filter(|(_, client)| client.name.is_some())
            .map(|(id, _)| id.clone())
            .min();
        guard.pilot_id = next_pilot;
        match &guard.pilot_id {
            Some(next) => log::info!("pilot disconnected, promoting {next}"),
            None => log::info!("pilot disconnected, session idles"),
        }
        if let Some(next) = guard.pilot_id.clone() {
            send_to_client(
                &mut guard,
                &next,
                &json!({
                    "type": "welcome",
                    "role": "pilot",
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_session(&mut guard);
        }
    });
}

fn tick_session(state: &mut ServerState) {
    // Movement advances per tick; only the win timer consumes wall-clock
    // time, so it stays frame-rate independent.
    let dt_ms = state.last_tick_at.elapsed().as_millis() as u64;
    state.last_tick_at = Instant::now();

    let commands = std::mem::take(&mut state.pending_commands);
    state.session.step(TickInput {
        dir: state.held_dir,
        commands,
        dt_ms,
    });

    let snapshot = state.session.build_snapshot(true);
    let mut entered_playing = false;
    let mut score_committed = false;
    for event in &snapshot.events {
        match event {
            RuntimeEvent::PhaseChanged {
                phase: Phase::Playing,
            } => entered_playing = true,
            RuntimeEvent::ScoreCommitted { name, score, .. } => {
                log::info!("score committed: {name} {score}");
                score_committed = true;
            }
            _ => {}
        }
    }

    if score_committed {
        state.ledger_store.save(state.session.ledgers());
    }

    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );

    if entered_playing {
        let world = state.session.world_init();
        broadcast(
            state,
            &json!({
                "type": "world",
                "init": world,
            }),
            QueuePolicy::DisconnectOnFull,
        );
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        close_client(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let client_ids: Vec<String> = state.clients.keys().cloned().collect();
    let mut failed_clients = Vec::new();
    for client_id in client_ids {
        let Some(client) = state.clients.get(&client_id) else {
            continue;
        };
        if client.name.is_none() {
            continue;
        }
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id);
        }
    }
    if policy == QueuePolicy::DisconnectOnFull {
        for client_id in failed_clients {
            close_client(state, &client_id);
        }
    }
}

fn close_client(state: &mut ServerState, client_id: &str) {
    if let Some(client) = state.clients.remove(client_id) {
        let _ = client.tx.try_send(OutboundMessage::Close {
            code: 1011,
            reason: "send queue overflow".to_string(),
        });
    }
    if state.pilot_id.as_deref() == Some(client_id) {
        state.pilot_id = None;
        state.held_dir = Direction::None;
        state.pending_commands.clear();
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{id}")
}
