use crate::constants::{DEFAULT_BOARD_SIDE, MAX_BOARD_SIDE, MIN_BOARD_SIDE};

pub fn sanitize_name(value: &str) -> String {
    value.trim().chars().take(16).collect()
}

/// Missing sides fall back to the default; anything else is clamped into the
/// supported range.
pub fn normalize_board_side(value: Option<i64>) -> i32 {
    match value {
        None => DEFAULT_BOARD_SIDE,
        Some(side) => side.clamp(MIN_BOARD_SIDE as i64, MAX_BOARD_SIDE as i64) as i32,
    }
}

pub fn parse_highscore_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.parse::<usize>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highscore_limit_parsing_is_lenient_for_invalid_values() {
        assert_eq!(parse_highscore_limit(Some("8")), Some(8));
        assert_eq!(parse_highscore_limit(Some("0")), Some(0));
        assert_eq!(parse_highscore_limit(Some("abc")), None);
        assert_eq!(parse_highscore_limit(Some("-1")), None);
        assert_eq!(parse_highscore_limit(None), None);
    }

    #[test]
    fn sanitize_name_trims_and_caps_length() {
        assert_eq!(sanitize_name(""), "");
        assert_eq!(sanitize_name("   "), "");
        assert_eq!(sanitize_name(" Alice "), "Alice");
        assert_eq!(sanitize_name("12345678901234567890"), "1234567890123456");
    }

    #[test]
    fn board_sides_are_clamped() {
        assert_eq!(normalize_board_side(None), 20);
        assert_eq!(normalize_board_side(Some(4)), 10);
        assert_eq!(normalize_board_side(Some(35)), 35);
        assert_eq!(normalize_board_side(Some(5_000)), 100);
    }
}
