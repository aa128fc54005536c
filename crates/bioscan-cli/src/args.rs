use clap::Parser;
use std::path::PathBuf;

/// Fingerprint device console
#[derive(Parser, Debug)]
#[command(name = "bioscan")]
#[command(version)]
#[command(about = "Line-oriented console for the fingerprint device service", long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Override the template database path
    #[arg(long = "database")]
    pub database: Option<String>,

    /// Override the log level (error, warn, info, debug, trace)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::parse_from([
            "bioscan",
            "--config",
            "/etc/bioscan.toml",
            "--database",
            "/tmp/t.db",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/bioscan.toml")));
        assert_eq!(cli.database.as_deref(), Some("/tmp/t.db"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["bioscan"]);
        assert!(cli.config.is_none());
        assert!(cli.database.is_none());
    }
}
