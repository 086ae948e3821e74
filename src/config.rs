//! Configuration for the dashboard core
//!
//! Loads chain settings and the currency table from TOML files with
//! environment variable substitution. Loaded once at startup; the resulting
//! registry is immutable afterwards.

use crate::address::DEFAULT_ACCOUNT_PREFIX;
use crate::amount::{Currency, CurrencyRegistry};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub chain: ChainConfig,
    #[serde(rename = "currency")]
    pub currencies: Vec<Currency>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: String,
    /// Bech32 prefix for account addresses.
    #[serde(default = "default_account_prefix")]
    pub account_prefix: String,
    /// Bech32 prefix for validator operator addresses.
    #[serde(default = "default_validator_prefix")]
    pub validator_prefix: String,
}

fn default_account_prefix() -> String {
    DEFAULT_ACCOUNT_PREFIX.to_string()
}

fn default_validator_prefix() -> String {
    format!("{}valoper", DEFAULT_ACCOUNT_PREFIX)
}

impl Settings {
    /// Load settings from the configuration file named by `MERDASH_CONFIG`,
    /// falling back to `config/default.toml`.
    pub fn load() -> Result<Self> {
        let config_path = env::var("MERDASH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from a specific file.
    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.currencies.is_empty() {
            anyhow::bail!("At least one currency must be configured");
        }

        for currency in &self.currencies {
            if currency.denom.is_empty() || currency.minimal_denom.is_empty() {
                anyhow::bail!("Currency denoms must be non-empty");
            }
            // A zero-decimals currency is its own minimal denomination.
            if currency.decimals > 0 && currency.denom == currency.minimal_denom {
                anyhow::bail!(
                    "Currency {} has {} decimals but identical display and minimal denoms",
                    currency.denom,
                    currency.decimals
                );
            }
        }

        if self.chain.account_prefix.is_empty() {
            anyhow::bail!("Account prefix must be non-empty");
        }

        Ok(())
    }

    /// Build the immutable currency registry from the configured table.
    pub fn registry(&self) -> CurrencyRegistry {
        CurrencyRegistry::new(self.currencies.clone())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[chain]
chain_id = "merlion-1"
account_prefix = "mer"
validator_prefix = "mervaloper"

[[currency]]
denom = "alion"
minimal_denom = "lion"
decimals = 18

[[currency]]
denom = "mer"
minimal_denom = "umer"
decimals = 6
"#;

    #[test]
    fn loads_and_validates_sample_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.chain.chain_id, "merlion-1");
        assert_eq!(settings.currencies.len(), 2);

        let registry = settings.registry();
        assert_eq!(registry.find("lion").unwrap().denom, "alion");
    }

    #[test]
    fn rejects_empty_currency_table() {
        let settings: Result<Settings> = toml::from_str::<Settings>(
            r#"
[chain]
chain_id = "merlion-1"
"#,
        )
        .map_err(Into::into);
        // Missing `[[currency]]` entries fail at deserialization.
        assert!(settings.is_err());
    }

    #[test]
    fn rejects_identical_denoms_with_decimals() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[chain]
chain_id = "merlion-1"

[[currency]]
denom = "lion"
minimal_denom = "lion"
decimals = 18
"#,
        )
        .unwrap();

        assert!(Settings::load_from(file.path()).is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_CHAIN_ID", "merlion-2");
        let input = "chain_id = \"${TEST_CHAIN_ID}\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "chain_id = \"merlion-2\"");
    }
}
