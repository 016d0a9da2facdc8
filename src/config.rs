// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use dotenvy::dotenv;

/// Players allowed in one session unless the host asks for another cap.
pub const DEFAULT_MAX_PLAYERS: i32 = 50;

/// Upper bound a host may request for a single session.
pub const MAX_PLAYERS_LIMIT: i32 = 500;

/// Number of selectable avatars (ids 1..=AVATAR_COUNT).
pub const AVATAR_COUNT: i32 = 15;

/// Longest nickname accepted at join time, in characters.
pub const NICKNAME_MAX_LEN: usize = 30;

/// Full marks for an instantaneous correct answer.
pub const MAX_QUESTION_POINTS: f64 = 1000.0;

/// Delay between `game_started` and the first question.
pub const DEFAULT_START_DELAY: Duration = Duration::from_millis(2000);

/// Tuning knobs for the live session engine.
#[derive(Debug, Clone)]
pub struct LiveSettings {
    pub max_players: i32,
    /// Grace period so players can switch from lobby to game screen
    /// before the first `show_question` goes out.
    pub start_delay: Duration,
    /// When set, `host_join` must carry the host token issued at session
    /// creation. When unset, any connection that sends `host_join` is
    /// trusted as the host.
    pub require_host_token: bool,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            start_delay: DEFAULT_START_DELAY,
            require_host_token: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub live: LiveSettings,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60 * 60 * 12);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let defaults = LiveSettings::default();
        let live = LiveSettings {
            max_players: env::var("LIVE_MAX_PLAYERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_players)
                .clamp(1, MAX_PLAYERS_LIMIT),
            start_delay: env::var("LIVE_START_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.start_delay),
            require_host_token: env::var("LIVE_REQUIRE_HOST_TOKEN")
                .ok()
                .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(defaults.require_host_token),
        };

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            live,
        }
    }
}
