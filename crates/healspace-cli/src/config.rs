use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Runtime configuration, read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub viewer_id: String,
    pub tick: Duration,
    pub seed: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path: PathBuf = lookup("HEALSPACE_DB_PATH")
            .unwrap_or_else(|| "healspace.db".into())
            .into();
        let viewer_id = lookup("HEALSPACE_VIEWER_ID").unwrap_or_else(|| "me".into());
        let tick_ms: u64 = lookup("HEALSPACE_TICK_MS")
            .unwrap_or_else(|| "100".into())
            .parse()
            .context("HEALSPACE_TICK_MS must be a whole number of milliseconds")?;
        let seed = match lookup("HEALSPACE_SEED").as_deref() {
            None | Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => anyhow::bail!("HEALSPACE_SEED must be true or false, got {}", other),
        };

        if tick_ms == 0 {
            anyhow::bail!("HEALSPACE_TICK_MS must be greater than zero");
        }

        Ok(Self {
            db_path,
            viewer_id,
            tick: Duration::from_millis(tick_ms),
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c.db_path, PathBuf::from("healspace.db"));
        assert_eq!(c.viewer_id, "me");
        assert_eq!(c.tick, Duration::from_millis(100));
        assert!(c.seed);
    }

    #[test]
    fn overrides() {
        let c = config(&[
            ("HEALSPACE_DB_PATH", "/tmp/hs.db"),
            ("HEALSPACE_VIEWER_ID", "maya"),
            ("HEALSPACE_TICK_MS", "50"),
            ("HEALSPACE_SEED", "false"),
        ])
        .unwrap();
        assert_eq!(c.db_path, PathBuf::from("/tmp/hs.db"));
        assert_eq!(c.viewer_id, "maya");
        assert_eq!(c.tick, Duration::from_millis(50));
        assert!(!c.seed);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("HEALSPACE_TICK_MS", "fast")]).is_err());
        assert!(config(&[("HEALSPACE_TICK_MS", "0")]).is_err());
        assert!(config(&[("HEALSPACE_SEED", "maybe")]).is_err());
    }
}
