//! Command-line surface, matching §6's flag table.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "server", about = "Dog-walking game session server")]
pub struct Args {
    /// JSON map catalog.
    #[arg(long = "config-file")]
    pub config_file: PathBuf,

    /// Directory of static client assets.
    #[arg(long = "www-root")]
    pub www_root: PathBuf,

    /// Enables the internal ticker at this period; when absent,
    /// `/api/v1/game/tick` becomes the enabled endpoint instead.
    #[arg(long = "tick-period")]
    pub tick_period_ms: Option<u64>,

    #[arg(long = "randomize-spawn-points", default_value_t = false)]
    pub randomize_spawn_points: bool,

    /// Enables snapshotting to this file.
    #[arg(long = "state-file")]
    pub state_file: Option<PathBuf>,

    #[arg(long = "save-state-period")]
    pub save_state_period_ms: Option<u64>,
}

/// Env var the libpq-compatible scoreboard database URL is read from
/// (§6). Pulled out of `main` so it has a unit-testable surface.
pub const DATABASE_URL_VAR: &str = "BOOKYPEDIA_DB_URL";

pub fn resolve_database_url() -> Result<String, String> {
    std::env::var(DATABASE_URL_VAR).map_err(|_| format!("{DATABASE_URL_VAR} must be set"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn resolves_the_url_when_the_env_var_is_set() {
        std::env::set_var(DATABASE_URL_VAR, "postgres://localhost/test");
        assert_eq!(resolve_database_url().unwrap(), "postgres://localhost/test");
        std::env::remove_var(DATABASE_URL_VAR);
    }

    #[test]
    #[serial]
    fn errors_when_the_env_var_is_missing() {
        std::env::remove_var(DATABASE_URL_VAR);
        assert!(resolve_database_url().is_err());
    }
}
