use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use pacmaze::config::GameOptions;
use pacmaze::constants::TICK_MS;
use pacmaze::engine::GameEngine;
use pacmaze::error::HighScoreError;
use pacmaze::high_scores::HighScoreStore;
use pacmaze::runner::{Runner, RunnerOptions};
use pacmaze::server_protocol::{parse_client_message, ParsedClientMessage};
use pacmaze::server_utils::{normalize_board_side, parse_highscore_limit, sanitize_name};
use pacmaze::types::{GamePhase, GameSummary, HighScoreEntry, MazeType, Snapshot};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Serves one maze-chase game over HTTP and WebSocket")]
struct Cli {
    #[arg(long, env = "PACMAZE_PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "PACMAZE_HIGHSCORES", default_value = ".data/highscores.json")]
    highscores: PathBuf,
    #[arg(long, default_value_t = 20)]
    rows: i32,
    #[arg(long, default_value_t = 20)]
    cols: i32,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value = "hybrid", value_parser = parse_maze_type)]
    maze_type: MazeType,
    /// How long a death waits for a client's `death_done` before the server
    /// resumes play itself.
    #[arg(long, default_value_t = 1_500)]
    death_pause_ms: u64,
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

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    runner: Option<Runner>,
    game_id: u64,
    finished: Option<GameSummary>,
    score_submitted: bool,
    high_scores: HighScoreStore,
    maze_type: MazeType,
    death_pause_ms: u64,
}

impl ServerState {
    fn new(high_scores: HighScoreStore, maze_type: MazeType, death_pause_ms: u64) -> Self {
        Self {
            clients: HashMap::new(),
            runner: None,
            game_id: 0,
            finished: None,
            score_submitted: false,
            high_scores,
            maze_type,
            death_pause_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HighScoreQuery {
    limit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitScoreBody {
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let high_scores = HighScoreStore::open(cli.highscores.clone());
    tracing::info!(
        path = %cli.highscores.display(),
        entries = high_scores.len(),
        "high score table loaded"
    );

    let state = Arc::new(Mutex::new(ServerState::new(
        high_scores,
        cli.maze_type,
        cli.death_pause_ms,
    )));
    let seed = cli.seed.unwrap_or_else(now_ms);
    let options = GameOptions::new(cli.rows, cli.cols, seed).with_maze_type(cli.maze_type);
    start_game(&state, options)
        .await
        .context("invalid board options")?;

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/snapshot", get(snapshot_handler))
        .route(
            "/api/highscores",
            get(highscores_handler).post(submit_score_handler),
        )
        .route("/ws", get(ws_handler))
        .with_state(state.clone());

    let bind_addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(port = cli.port, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server runtime failed")?;

    let mut guard = state.lock().await;
    if let Some(mut runner) = guard.runner.take() {
        runner.stop().await;
    }
    tracing::info!("server stopped");
    Ok(())
}

fn parse_maze_type(raw: &str) -> Result<MazeType, String> {
    MazeType::parse(raw).ok_or_else(|| format!("unknown maze type: {raw}"))
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for ctrl-c");
    }
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn snapshot_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    match guard.runner.as_ref() {
        Some(runner) => Json(runner.latest().as_ref().clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "no game" }))).into_response(),
    }
}

async fn highscores_handler(
    State(state): State<SharedState>,
    Query(query): Query<HighScoreQuery>,
) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(
        guard
            .high_scores
            .build_response(parse_highscore_limit(query.limit.as_deref())),
    )
}

async fn submit_score_handler(
    State(state): State<SharedState>,
    Json(body): Json<SubmitScoreBody>,
) -> impl IntoResponse {
    let mut guard = state.lock().await;
    match submit_score(&mut guard, &body.name) {
        Ok(entry) => (StatusCode::CREATED, Json(json!({ "entry": entry }))),
        Err((status, message)) => (status, Json(json!({ "error": message }))),
    }
}

/// Records the last finished game under `name`, once per game.
fn submit_score(
    state: &mut ServerState,
    name: &str,
) -> Result<HighScoreEntry, (StatusCode, String)> {
    let Some(summary) = state.finished.as_ref() else {
        return Err((StatusCode::CONFLICT, "no finished game to record".to_string()));
    };
    if state.score_submitted {
        return Err((StatusCode::CONFLICT, "score already submitted".to_string()));
    }
    let (score, level) = (summary.score, summary.level);
    match state.high_scores.record(&sanitize_name(name), score, level) {
        Ok(entry) => {
            state.score_submitted = true;
            Ok(entry)
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to record high score");
            let status = match &err {
                HighScoreError::EmptyName => StatusCode::BAD_REQUEST,
                HighScoreError::NameTaken { .. } => StatusCode::CONFLICT,
                HighScoreError::Io(_) | HighScoreError::Serialize(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            Err((status, err.to_string()))
        }
    }
}

async fn start_game(
    state: &SharedState,
    options: GameOptions,
) -> Result<(), pacmaze::error::ConfigError> {
    let engine = GameEngine::new(options)?;
    let mut guard = state.lock().await;
    if let Some(mut previous) = guard.runner.take() {
        previous.stop().await;
    }
    let runner = Runner::start(
        engine,
        RunnerOptions {
            tick_ms: TICK_MS,
            death_pause_ms: Some(guard.death_pause_ms),
        },
    );
    guard.game_id += 1;
    guard.finished = None;
    guard.score_submitted = false;
    let game_id = guard.game_id;
    let snapshots = runner.subscribe();
    guard.runner = Some(runner);
    drop(guard);

    tracing::info!(
        game_id,
        seed = options.seed,
        rows = options.rows,
        cols = options.cols,
        "game started"
    );
    tokio::spawn(forward_snapshots(state.clone(), game_id, snapshots));
    Ok(())
}

/// Streams one game's snapshots to every client and announces its end.
async fn forward_snapshots(
    state: SharedState,
    game_id: u64,
    mut snapshots: tokio::sync::watch::Receiver<Arc<Snapshot>>,
) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        let mut guard = state.lock().await;
        if guard.game_id != game_id {
            return;
        }
        broadcast(
            &mut guard,
            &json!({
                "type": "state",
                "snapshot": snapshot.as_ref(),
            }),
            QueuePolicy::DropOnFull,
        );
        if snapshot.phase == GamePhase::GameOver {
            break;
        }
    }

    let mut guard = state.lock().await;
    if guard.game_id != game_id {
        return;
    }
    let Some(runner) = guard.runner.as_ref() else {
        return;
    };
    let summary = runner.summary().await;
    tracing::info!(game_id, score = summary.score, level = summary.level, "game finished");
    broadcast(
        &mut guard,
        &json!({
            "type": "game_over",
            "summary": summary,
        }),
        QueuePolicy::DisconnectOnFull,
    );
    guard.finished = Some(summary);
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        send_initial_state(&mut guard, &client_id);
    }
    tracing::debug!(client_id = %client_id, "client connected");

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

    state.lock().await.clients.remove(&client_id);
    tracing::debug!(client_id = %client_id, "client disconnected");
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: SharedState, client_id: &str, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_error_to_client(&state, client_id, "invalid message").await;
        return;
    };

    match message {
        ParsedClientMessage::NewGame {
            rows,
            cols,
            seed,
            maze_type,
        } => {
            let default_maze = state.lock().await.maze_type;
            let options = GameOptions::new(
                normalize_board_side(rows),
                normalize_board_side(cols),
                seed.unwrap_or_else(now_ms),
            )
            .with_maze_type(maze_type.unwrap_or(default_maze));
            if let Err(err) = start_game(&state, options).await {
                send_error_to_client(&state, client_id, &err.to_string()).await;
            }
        }
        ParsedClientMessage::Input { dir } => {
            let guard = state.lock().await;
            if let Some(runner) = guard.runner.as_ref() {
                runner.set_direction(dir).await;
            }
        }
        ParsedClientMessage::DeathDone => {
            let guard = state.lock().await;
            if let Some(runner) = guard.runner.as_ref() {
                runner.complete_death_animation().await;
            }
        }
        ParsedClientMessage::SubmitScore { name } => {
            let mut guard = state.lock().await;
            let reply = match submit_score(&mut guard, &name) {
                Ok(entry) => json!({ "type": "score_recorded", "entry": entry }),
                Err((_, message)) => json!({ "type": "error", "message": message }),
            };
            send_to_client(&mut guard, client_id, &reply, QueuePolicy::DisconnectOnFull);
        }
    }
}

fn send_initial_state(state: &mut ServerState, client_id: &str) {
    let mut messages = Vec::new();
    if let Some(runner) = state.runner.as_ref() {
        messages.push(json!({
            "type": "state",
            "snapshot": runner.latest().as_ref(),
        }));
    }
    if let Some(summary) = state.finished.as_ref() {
        messages.push(json!({
            "type": "game_over",
            "summary": summary,
        }));
    }
    for message in messages {
        send_to_client(state, client_id, &message, QueuePolicy::DisconnectOnFull);
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
        disconnect_client(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client(state, &client_id);
    }
}

fn disconnect_client(state: &mut ServerState, client_id: &str) {
    let Some(context) = state.clients.remove(client_id) else {
        return;
    };
    tracing::warn!(client_id, "dropping slow client");
    let _ = context.tx.try_send(OutboundMessage::Close {
        code: 1013,
        reason: "client too slow".to_string(),
    });
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
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
