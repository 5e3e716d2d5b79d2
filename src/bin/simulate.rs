use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use pacmaze::autopilot::Autopilot;
use pacmaze::config::GameOptions;
use pacmaze::constants::{MAX_GHOST_MULTIPLIER, TICK_MS};
use pacmaze::engine::GameEngine;
use pacmaze::types::{GamePhase, MazeType, RuntimeEvent, Snapshot};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs autopiloted maze-chase games headless")]
struct Cli {
    #[arg(long, default_value_t = 20)]
    rows: i32,
    #[arg(long, default_value_t = 20)]
    cols: i32,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 1)]
    games: u32,
    #[arg(long, default_value_t = 20_000)]
    max_ticks: u64,
    #[arg(long, default_value = "hybrid", value_parser = parse_maze_type)]
    maze_type: MazeType,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    game: u32,
    seed: u64,
    rows: i32,
    cols: i32,
    score: i32,
    level: i32,
    lives: i32,
    ticks: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(rename = "dotsEaten")]
    dots_eaten: i32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: i32,
    #[serde(rename = "fruitsEaten")]
    fruits_eaten: i32,
    #[serde(rename = "powerUpsCollected")]
    power_ups_collected: i32,
    deaths: i32,
    #[serde(rename = "levelsCompleted")]
    levels_completed: i32,
    #[serde(rename = "gameOver")]
    game_over: bool,
    #[serde(rename = "hitTickLimit")]
    hit_tick_limit: bool,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "gameCount")]
    game_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: i64,
    #[serde(rename = "bestScore")]
    best_score: i32,
    games: Vec<GameResultLine>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base_seed = cli.seed.unwrap_or_else(now_ms);
    let run_started_at_ms = now_ms();
    let run_id = default_run_id(base_seed, run_started_at_ms);
    let mut results = Vec::new();
    let mut total_anomalies = 0usize;

    for game in 0..cli.games {
        let seed = base_seed.wrapping_add(game as u64);
        let options = GameOptions::new(cli.rows, cli.cols, seed).with_maze_type(cli.maze_type);
        tracing::info!(run_id = %run_id, game, seed, "game started");
        let (result, records) = run_game(game, options, cli.max_ticks)
            .with_context(|| format!("game {game} could not start"))?;

        for record in &records {
            tracing::warn!(game, tick = record.tick, message = %record.message, "anomaly detected");
        }
        total_anomalies += records.len();
        tracing::info!(
            game,
            score = result.score,
            level = result.level,
            ticks = result.ticks,
            "game finished"
        );

        println!("{}", serde_json::to_string(&result)?);
        results.push(result);
    }

    let summary = build_run_summary(run_id, run_started_at_ms, now_ms(), results, total_anomalies);
    if let Some(path) = cli.summary_out.as_ref() {
        write_summary(path, &summary)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        tracing::info!(path = %path.display(), "summary written");
    }

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn run_game(
    game: u32,
    options: GameOptions,
    max_ticks: u64,
) -> Result<(GameResultLine, Vec<AnomalyRecord>), pacmaze::error::ConfigError> {
    let mut engine = GameEngine::new(options)?;
    let mut pilot = Autopilot::new();
    let mut anomalies = Vec::new();
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut levels_completed = 0;

    while !engine.is_over() && engine.tick() < max_ticks {
        let dir = pilot.choose(&engine);
        engine.set_direction(dir);
        engine.step(TICK_MS);
        if engine.phase() == GamePhase::PlayerDied {
            engine.complete_death_animation();
        }

        let snapshot = engine.build_snapshot(true);
        for message in collect_snapshot_anomalies(&snapshot) {
            push_anomaly(&mut anomalies, &mut records, &mut seen, snapshot.tick, message);
        }
        levels_completed += snapshot
            .events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::LevelCompleted { .. }))
            .count() as i32;
    }

    let summary = engine.build_summary();
    Ok((
        GameResultLine {
            game,
            seed: summary.seed,
            rows: summary.rows,
            cols: summary.cols,
            score: summary.score,
            level: summary.level,
            lives: summary.lives,
            ticks: summary.ticks,
            duration_ms: summary.duration_ms,
            dots_eaten: summary.dots_eaten,
            ghosts_eaten: summary.ghosts_eaten,
            fruits_eaten: summary.fruits_eaten,
            power_ups_collected: summary.power_ups_collected,
            deaths: summary.deaths,
            levels_completed,
            game_over: summary.game_over,
            hit_tick_limit: !summary.game_over,
            anomalies,
        },
        records,
    ))
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.ghost_multiplier < 1 || snapshot.ghost_multiplier > MAX_GHOST_MULTIPLIER {
        anomalies.push(format!(
            "ghost multiplier out of range: {}",
            snapshot.ghost_multiplier
        ));
    }
    if snapshot.lives < 0 {
        anomalies.push(format!("negative lives: {}", snapshot.lives));
    }
    if snapshot.remaining_dots < 0 {
        anomalies.push(format!("negative dot count: {}", snapshot.remaining_dots));
    }
    if is_wall(snapshot, snapshot.player.x, snapshot.player.y) {
        anomalies.push(format!(
            "player inside wall at ({}, {})",
            snapshot.player.x, snapshot.player.y
        ));
    }
    for ghost in &snapshot.ghosts {
        if ghost.visible && is_wall(snapshot, ghost.x, ghost.y) {
            anomalies.push(format!("ghost {} inside wall", ghost.id));
        }
    }
    anomalies
}

fn is_wall(snapshot: &Snapshot, x: i32, y: i32) -> bool {
    if x < 0 || y < 0 {
        return true;
    }
    snapshot
        .tiles
        .get(y as usize)
        .and_then(|row| row.chars().nth(x as usize))
        .map_or(true, |tile| tile == '#')
}

fn parse_maze_type(raw: &str) -> Result<MazeType, String> {
    MazeType::parse(raw).ok_or_else(|| format!("unknown maze type: {raw}"))
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    games: Vec<GameResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let game_count = games.len();
    let total_score: i64 = games.iter().map(|game| game.score as i64).sum();
    let average_score = if game_count == 0 {
        0
    } else {
        total_score / game_count as i64
    };
    let best_score = games.iter().map(|game| game.score).max().unwrap_or(0);
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        game_count,
        anomaly_count,
        average_score,
        best_score,
        games,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)?;
    Ok(())
}
