use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Startup configuration. The only required field is the bot token.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(alias = "Token")]
    pub token: String,
    /// How long `stop` waits for in-flight updates before the process exits
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// Skip updates that queued up while the bot was offline
    #[serde(default)]
    pub drop_pending_updates: bool,
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

impl Config {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Read the config file. `.toml` files are parsed as TOML, everything
    /// else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let parsed = if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        };

        parsed.with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content).context("Invalid JSON config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid TOML config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            bail!("Bot token is empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_capitalised_token() {
        let config = Config::from_json(r#"{"Token": "123:abc"}"#).unwrap();
        assert_eq!(config.token, "123:abc");
        assert_eq!(config.shutdown_grace_secs, 10);
        assert!(!config.drop_pending_updates);
    }

    #[test]
    fn test_json_lowercase_token_and_overrides() {
        let config = Config::from_json(
            r#"{"token": "123:abc", "shutdown_grace_secs": 3, "drop_pending_updates": true}"#,
        )
        .unwrap();
        assert_eq!(config.token, "123:abc");
        assert_eq!(config.shutdown_grace(), Duration::from_secs(3));
        assert!(config.drop_pending_updates);
    }

    #[test]
    fn test_toml_config() {
        let config = Config::from_toml("token = \"123:abc\"\nshutdown_grace_secs = 0\n").unwrap();
        assert_eq!(config.token, "123:abc");
        assert_eq!(config.shutdown_grace_secs, 0);
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(Config::from_json(r#"{"Token": "   "}"#).is_err());
    }

    #[test]
    fn test_missing_token_rejected() {
        assert!(Config::from_json("{}").is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(Config::from_json("{\"Token\": ").is_err());
    }

    #[test]
    fn test_load_picks_format_by_extension() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"Token": "from-json"}}"#).unwrap();
        assert_eq!(Config::load(json.path()).unwrap().token, "from-json");

        let mut toml = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(toml, "token = \"from-toml\"").unwrap();
        assert_eq!(Config::load(toml.path()).unwrap().token, "from-toml");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("Token.json")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
