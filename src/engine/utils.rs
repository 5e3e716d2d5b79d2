use std::time::{SystemTime, UNIX_EPOCH};

use crate::rng::Rng;
use crate::types::{Direction, GhostType};

pub(super) fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now as u64
}

pub(super) fn pick_direction(options: &[Direction], rng: &mut Rng) -> Option<Direction> {
    if options.is_empty() {
        return None;
    }
    Some(options[rng.pick_index(options.len())])
}

pub(super) fn ghost_type_for_slot(slot: usize) -> GhostType {
    GhostType::ROTATION[slot % GhostType::ROTATION.len()]
}

pub(super) fn remaining_ms(until: Option<u64>, now_ms: u64) -> u64 {
    until.map(|end| end.saturating_sub(now_ms)).unwrap_or(0)
}
