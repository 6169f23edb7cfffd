use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// Secret used when none is configured. Tokens signed with it are forgeable.
pub const DEFAULT_SECRET_KEY: &str = "please-set-secret";

/// Configuration for the calculator module.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorConfig {
    /// Root data directory; histories live in `<data_dir>/histories`.
    pub data_dir: String,
    pub session: SessionConfig,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            data_dir: "/data".to_owned(),
            session: SessionConfig::default(),
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(deserialize_with = "deserialize_secret")]
    pub secret_key: SecretString,
    pub cookie_name: String,
    /// Add the `Secure` attribute to the session cookie.
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: SecretString::from(DEFAULT_SECRET_KEY),
            cookie_name: "calc_session".to_owned(),
            secure_cookie: false,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.secret_key.expose_secret() == DEFAULT_SECRET_KEY
    }
}

// Environment layers may hand over a purely numeric secret as a number.
fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "secret_key must be a string, got {other}"
            )));
        }
    };
    Ok(SecretString::from(raw))
}
