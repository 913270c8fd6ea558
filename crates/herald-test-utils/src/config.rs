//! Inline-TOML configuration builders.

use herald_config::StaticConfig;

/// Parse an inline TOML fragment into a full configuration.
///
/// # Panics
/// Panics if the fragment is not valid configuration TOML.
pub fn config_from_toml(toml_text: &str) -> StaticConfig {
    toml::from_str(toml_text).expect("fixture TOML should parse")
}

/// A minimal valid configuration (one account `bot`, default community
/// `pics`) with `extra` TOML appended.
///
/// # Example
///
/// ```rust
/// use herald_test_utils::base_config;
///
/// let config = base_config(
///     r#"
/// [sync.items.rules.source]
/// name = "rules"
/// [sync.items.rules.targets.mirror]
/// name = "rules-mirror"
/// "#,
/// );
/// assert!(config.accounts.contains_key("bot"));
/// ```
pub fn base_config(extra: &str) -> StaticConfig {
    config_from_toml(&format!(
        r#"
[accounts.bot]
site = "example"

[defaults]
account = "bot"
community = "pics"

{extra}
"#
    ))
}
