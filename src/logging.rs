//! Tracing subscriber setup

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Maps a configured level name to a tracing level
pub fn parse_level(level: &str) -> Option<Level> {
    match level.to_uppercase().as_str() {
        "TRACE" => Some(Level::TRACE),
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARN" | "WARNING" => Some(Level::WARN),
        "ERROR" => Some(Level::ERROR),
        _ => None,
    }
}

/// Builds the event filter. `verbose` forces debug, otherwise non-empty `RUST_LOG`
/// directives replace the configured level.
fn build_filter(env_directives: Option<&str>, level: Level, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new(Level::DEBUG.as_str());
    }
    if let Some(directives) = env_directives.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("Ignoring invalid {}: {e}", EnvFilter::DEFAULT_ENV),
        }
    }
    EnvFilter::new(level.as_str())
}

/// Installs the global subscriber on stderr, pretty or json per `config.format`
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = parse_level(&config.level).unwrap_or(Level::INFO);
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env_directives.as_deref(), level, verbose);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if config.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };
    installed.map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

    tracing::debug!("Logging initialized (level: {:?}, format: {})", level, config.format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tracing_subscriber::filter::LevelFilter;

    #[rstest]
    #[case("trace", Some(Level::TRACE))]
    #[case("Debug", Some(Level::DEBUG))]
    #[case("INFO", Some(Level::INFO))]
    #[case("warning", Some(Level::WARN))]
    #[case("error", Some(Level::ERROR))]
    #[case("loud", None)]
    fn test_parse_level(#[case] input: &str, #[case] expected: Option<Level>) {
        assert_eq!(parse_level(input), expected);
    }

    #[rstest]
    #[case(None, Level::INFO, false, LevelFilter::INFO)]
    #[case(Some(""), Level::ERROR, false, LevelFilter::ERROR)]
    #[case(Some("warn"), Level::DEBUG, false, LevelFilter::WARN)]
    #[case(Some("trace"), Level::INFO, false, LevelFilter::TRACE)]
    #[case(Some("warn"), Level::INFO, true, LevelFilter::DEBUG)]
    #[case(Some("foodietour=loud"), Level::WARN, false, LevelFilter::WARN)]
    fn test_rust_log_replaces_configured_level(
        #[case] env: Option<&str>,
        #[case] level: Level,
        #[case] verbose: bool,
        #[case] expected: LevelFilter,
    ) {
        let filter = build_filter(env, level, verbose);
        assert_eq!(filter.max_level_hint(), Some(expected));
    }
}
