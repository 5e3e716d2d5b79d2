use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HighScoreError;
use crate::types::{HighScoreEntry, HighScoreResponse};

const FILE_VERSION: u8 = 1;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredScore {
    name: String,
    score: i32,
    level: i32,
    date: String,
}

#[derive(Clone, Debug, Serialize)]
struct HighScoreFile<'a> {
    version: u8,
    scores: &'a [StoredScore],
}

#[derive(Clone, Debug, Deserialize)]
struct HighScoreFileRaw {
    version: u8,
    scores: Vec<serde_json::Value>,
}

/// One row per player name, kept in a JSON file. Names compare trimmed and
/// case-insensitively.
pub struct HighScoreStore {
    file_path: PathBuf,
    scores: Vec<StoredScore>,
}

impl HighScoreStore {
    pub fn open(file_path: PathBuf) -> Self {
        let scores = load_scores(&file_path);
        Self { file_path, scores }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn record(
        &mut self,
        name: &str,
        score: i32,
        level: i32,
    ) -> Result<HighScoreEntry, HighScoreError> {
        self.record_on(name, score, level, Local::now().date_naive())
    }

    pub fn record_on(
        &mut self,
        name: &str,
        score: i32,
        level: i32,
        date: NaiveDate,
    ) -> Result<HighScoreEntry, HighScoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HighScoreError::EmptyName);
        }
        let key = name_key(name);
        if self.scores.iter().any(|stored| name_key(&stored.name) == key) {
            return Err(HighScoreError::NameTaken {
                name: name.to_string(),
            });
        }

        let stored = StoredScore {
            name: name.to_string(),
            score: score.max(0),
            level: level.max(1),
            date: date.format(DATE_FORMAT).to_string(),
        };
        let rank = 1 + self
            .scores
            .iter()
            .filter(|other| rank_order(other, &stored) == Ordering::Less)
            .count();
        let entry = HighScoreEntry {
            rank,
            name: stored.name.clone(),
            score: stored.score,
            level: stored.level,
            date: stored.date.clone(),
        };

        self.scores.push(stored);
        if let Err(err) = self.save() {
            self.scores.pop();
            return Err(err);
        }
        tracing::info!(name, score, level, rank, "high score recorded");
        Ok(entry)
    }

    pub fn top(&self, limit: usize) -> Vec<HighScoreEntry> {
        let mut entries = self.ranked();
        entries.truncate(limit);
        entries
    }

    pub fn build_response(&self, requested_limit: Option<usize>) -> HighScoreResponse {
        HighScoreResponse {
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            entries: self.top(requested_limit.unwrap_or(10).clamp(1, 100)),
        }
    }

    fn ranked(&self) -> Vec<HighScoreEntry> {
        let mut sorted: Vec<&StoredScore> = self.scores.iter().collect();
        sorted.sort_by(|a, b| rank_order(a, b));
        sorted
            .into_iter()
            .enumerate()
            .map(|(idx, stored)| HighScoreEntry {
                rank: idx + 1,
                name: stored.name.clone(),
                score: stored.score,
                level: stored.level,
                date: stored.date.clone(),
            })
            .collect()
    }

    fn save(&self) -> Result<(), HighScoreError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = HighScoreFile {
            version: FILE_VERSION,
            scores: &self.scores,
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(&self.file_path, text)?;
        Ok(())
    }
}

fn rank_order(a: &StoredScore, b: &StoredScore) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.level.cmp(&a.level))
        .then_with(|| a.date.cmp(&b.date))
        .then_with(|| name_key(&a.name).cmp(&name_key(&b.name)))
}

fn load_scores(path: &Path) -> Vec<StoredScore> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), %error, "failed to read high scores");
            }
            return Vec::new();
        }
    };
    let parsed = match serde_json::from_str::<HighScoreFileRaw>(&text) {
        Ok(value) if value.version == FILE_VERSION => value,
        Ok(value) => {
            tracing::warn!(
                path = %path.display(),
                version = value.version,
                "unsupported high score file version"
            );
            return Vec::new();
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "failed to parse high scores");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut scores = Vec::new();
    for raw in parsed.scores {
        let stored: StoredScore = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping bad high score row");
                continue;
            }
        };
        let Some(stored) = sanitize_stored(stored) else {
            continue;
        };
        if seen.insert(name_key(&stored.name)) {
            scores.push(stored);
        }
    }
    scores
}

fn sanitize_stored(value: StoredScore) -> Option<StoredScore> {
    let name = value.name.trim().to_string();
    if name.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(&value.date, DATE_FORMAT).ok()?;
    Some(StoredScore {
        name,
        score: value.score.max(0),
        level: value.level.max(1),
        date: value.date,
    })
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
