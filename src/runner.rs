//! Paces a [`GameEngine`] on a tokio interval and publishes snapshots.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::constants::TICK_MS;
use crate::engine::GameEngine;
use crate::types::{Direction, GamePhase, GameSummary, Snapshot};

const STOP_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug)]
pub struct RunnerOptions {
    pub tick_ms: u64,
    /// Completes a pending death by itself after this long. `None` waits for
    /// [`Runner::complete_death_animation`].
    pub death_pause_ms: Option<u64>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            death_pause_ms: None,
        }
    }
}

pub struct Runner {
    engine: Arc<Mutex<GameEngine>>,
    snapshots: watch::Receiver<Arc<Snapshot>>,
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<GameSummary>>,
}

impl Runner {
    pub fn start(mut engine: GameEngine, options: RunnerOptions) -> Self {
        let first = Arc::new(engine.build_snapshot(true));
        let (snapshot_tx, snapshots) = watch::channel(first);
        let (stop_tx, stop_rx) = watch::channel(false);
        let engine = Arc::new(Mutex::new(engine));
        let handle = tokio::spawn(run_loop(engine.clone(), snapshot_tx, stop_rx, options));
        Self {
            engine,
            snapshots,
            stop_tx,
            handle: Some(handle),
        }
    }

    pub async fn set_direction(&self, dir: Direction) {
        self.engine.lock().await.set_direction(dir);
    }

    pub async fn complete_death_animation(&self) -> bool {
        self.engine.lock().await.complete_death_animation()
    }

    pub async fn summary(&self) -> GameSummary {
        self.engine.lock().await.build_summary()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.clone()
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Asks the loop to exit and waits briefly for it. Returns `None` when
    /// the task did not join in time and had to be aborted.
    pub async fn stop(&mut self) -> Option<GameSummary> {
        self.stop_tx.send_replace(true);
        let mut handle = self.handle.take()?;
        match tokio::time::timeout(STOP_TIMEOUT, &mut handle).await {
            Ok(Ok(summary)) => Some(summary),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "runner task failed");
                None
            }
            Err(_) => {
                tracing::warn!("runner did not stop in time, aborting");
                handle.abort();
                None
            }
        }
    }

    /// Waits for the game to end on its own.
    pub async fn wait(mut self) -> Option<GameSummary> {
        let handle = self.handle.take()?;
        handle.await.ok()
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn run_loop(
    engine: Arc<Mutex<GameEngine>>,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    mut stop_rx: watch::Receiver<bool>,
    options: RunnerOptions,
) -> GameSummary {
    let mut interval = tokio::time::interval(Duration::from_millis(options.tick_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut died_at: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
                continue;
            }
        }

        let mut guard = engine.lock().await;
        guard.step(options.tick_ms);

        if guard.phase() == GamePhase::PlayerDied {
            let since = *died_at.get_or_insert_with(Instant::now);
            if let Some(pause_ms) = options.death_pause_ms {
                if since.elapsed() >= Duration::from_millis(pause_ms) {
                    guard.complete_death_animation();
                }
            }
        }
        if guard.phase() != GamePhase::PlayerDied {
            died_at = None;
        }

        let snapshot = Arc::new(guard.build_snapshot(true));
        let over = guard.is_over();
        drop(guard);
        snapshot_tx.send_replace(snapshot);
        if over {
            break;
        }
    }

    let summary = engine.lock().await.build_summary();
    tracing::info!(
        score = summary.score,
        level = summary.level,
        ticks = summary.ticks,
        game_over = summary.game_over,
        "runner finished"
    );
    summary
}
