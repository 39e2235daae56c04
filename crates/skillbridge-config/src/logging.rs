use crate::schema::LoggingConfig;

/// Install the global tracing subscriber.
///
/// Level precedence: `RUST_LOG` > `level_override` > `config.level`.
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig, level_override: Option<&str>) -> bool {
    let level = level_override.unwrap_or(&config.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .try_init()
            .is_ok(),
        "compact" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_target(false)
            .try_init()
            .is_ok(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_refused() {
        let config = LoggingConfig {
            format: "json".into(),
            ..Default::default()
        };
        // Another test in this binary may have installed one first.
        let _ = init_tracing(&config, Some("debug"));
        assert!(!init_tracing(&config, None));
    }
}
