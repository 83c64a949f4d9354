use clap::Parser;
use std::path::PathBuf;

/// rollcall: automated daily check-in runner for API relay portals.
#[derive(Parser, Debug)]
#[command(name = "rollcall", version)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "rollcall.json")]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also write daily-rotated log files to the platform data directory
    #[arg(long)]
    pub log_to_file: bool,

    /// Path of the balance fingerprint state file
    #[arg(long, default_value = "balance_hash.txt")]
    pub state_file: PathBuf,

    /// Suppress the failure notification for this run
    #[arg(long)]
    pub skip_notify: bool,

    /// Save challenge-stage screenshots to debug_screenshots/
    #[arg(long)]
    pub debug_screenshots: bool,

    /// Exit 0 regardless of per-account failures (for schedulers that
    /// alert on non-zero exits)
    #[arg(long)]
    pub always_exit_zero: bool,

    /// Run the bypass browser with a visible window
    #[arg(long)]
    pub headful: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["rollcall"]);
        assert_eq!(cli.config, PathBuf::from("rollcall.json"));
        assert_eq!(cli.log_level, "info");
        assert!(!cli.skip_notify);
        assert!(!cli.always_exit_zero);
        assert!(!cli.headful);
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::parse_from([
            "rollcall",
            "--config",
            "custom.json",
            "--skip-notify",
            "--always-exit-zero",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.json"));
        assert!(cli.skip_notify);
        assert!(cli.always_exit_zero);
    }
}
