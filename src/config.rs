use std::str::FromStr;

use crate::engine::types::Difficulty;

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server listen port.
    pub port: u16,
    /// Server bind host.
    pub host: String,
    /// Difficulty for AI moves when neither the request nor the game sets one.
    pub default_difficulty: Difficulty,
    /// Deadline for a single AI search in milliseconds.
    pub ai_timeout_ms: u64,
    /// Search depth used for hints.
    pub hint_depth: u32,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unparseable values fall back to
    /// the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            port: parse_or(&lookup, "PORT", defaults.port),
            host: lookup("HOST").unwrap_or(defaults.host),
            default_difficulty: lookup("CHESS_AI_DEFAULT_DIFFICULTY")
                .and_then(|v| Difficulty::from_str_loose(&v))
                .unwrap_or(defaults.default_difficulty),
            ai_timeout_ms: parse_or(&lookup, "CHESS_AI_TIMEOUT", defaults.ai_timeout_ms),
            hint_depth: parse_or(&lookup, "CHESS_HINT_DEPTH", defaults.hint_depth),
        }
    }

    /// Socket address string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 8082,
            host: "0.0.0.0".to_string(),
            default_difficulty: Difficulty::Medium,
            ai_timeout_ms: 5000,
            hint_depth: 2,
        }
    }
}
