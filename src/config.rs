use anyhow::Context;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime settings for the command-line front end, read from the
/// environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub log_level: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .context("DATABASE_URL must be set to a production Postgres instance")?;

        let max_connections = match lookup("PG_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .with_context(|| format!("PG_MAX_CONNECTIONS is not a number: {value}"))?
                .max(1),
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let log_level = lookup("PROGRESS_ANALYTICS_LOG")
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            database_url,
            max_connections,
            log_level,
        })
    }
}
