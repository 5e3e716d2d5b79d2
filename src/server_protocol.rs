use serde_json::Value;

use crate::types::{Direction, MazeType};

#[derive(Debug)]
pub enum ParsedClientMessage {
    NewGame {
        rows: Option<i64>,
        cols: Option<i64>,
        seed: Option<u64>,
        maze_type: Option<MazeType>,
    },
    Input {
        dir: Direction,
    },
    DeathDone,
    SubmitScore {
        name: String,
    },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "new_game" => {
            let rows = parse_optional_i64(object.get("rows"))?;
            let cols = parse_optional_i64(object.get("cols"))?;
            let seed = match object.get("seed") {
                None | Some(Value::Null) => None,
                Some(value) => Some(value.as_u64()?),
            };
            let maze_type = match object.get("mazeType") {
                None => None,
                Some(value) => Some(MazeType::parse(value.as_str()?)?),
            };
            Some(ParsedClientMessage::NewGame {
                rows,
                cols,
                seed,
                maze_type,
            })
        }
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "death_done" => Some(ParsedClientMessage::DeathDone),
        "submit_score" => {
            let name = object.get("name")?.as_str()?.to_string();
            Some(ParsedClientMessage::SubmitScore { name })
        }
        _ => None,
    }
}

fn parse_optional_i64(value: Option<&Value>) -> Option<Option<i64>> {
    const MAX_SAFE_INTEGER_F64: f64 = 9_007_199_254_740_991.0;

    let Some(value) = value else {
        return Some(None);
    };
    if value.is_null() {
        return Some(None);
    }
    if let Some(number) = value.as_i64() {
        return Some(Some(number));
    }
    if let Some(number) = value.as_u64() {
        return i64::try_from(number).ok().map(Some);
    }
    if let Some(number) = value.as_f64() {
        if number.is_finite() {
            let floored = number.floor();
            if floored.abs() > MAX_SAFE_INTEGER_F64 {
                return None;
            }
            return Some(Some(floored as i64));
        }
    }
    None
}
