//! Tracing subscriber setup.

use std::str::FromStr;

use tracing::Level;

use crate::error::{AppError, AppResult};

/// Parse a level name such as `"info"` or `"DEBUG"`.
pub fn parse_level(name: &str) -> AppResult<Level> {
    Level::from_str(name.trim())
        .map_err(|_| AppError::InvalidInput(format!("unknown log level '{name}'")))
}

/// Install a fmt subscriber capped at `level`.
///
/// Only the first call in a process installs anything; later calls return
/// `false`.
pub fn init(level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// [`init`] from a level name.
pub fn init_from_name(name: &str) -> AppResult<bool> {
    Ok(init(parse_level(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_level(" warn ").unwrap(), Level::WARN);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn second_init_is_a_no_op() {
        init(Level::WARN);
        assert!(!init(Level::DEBUG));
    }
}
