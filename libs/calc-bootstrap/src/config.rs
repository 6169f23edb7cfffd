//! Layered application configuration.
//!
//! Precedence, lowest to highest:
//! 1. built-in defaults
//! 2. YAML file (`--config`)
//! 3. plain environment variables (`LOG_LEVEL`, `DATA_DIR`, `SECRET_KEY`, `DEBUG`)
//! 4. prefixed environment variables (`CALC__SECTION__KEY`)
//! 5. CLI overrides (`--port`, `-v`)
//!
//! Module sections live under `modules.<name>.config` and are decoded lazily
//! by the owning module through [`AppConfig::module_config_or_default`].

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix for structured environment overrides, e.g. `CALC__SERVER__BIND_ADDR`.
pub const ENV_PREFIX: &str = "CALC__";

/// Configuration error for typed module config operations
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("module '{module}' config must be an object")]
    InvalidModuleStructure { module: String },
    #[error("invalid config for module '{module}': {source}")]
    InvalidConfig {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_owned(),
            request_timeout_secs: 30,
            body_limit_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(deserialize_with = "deserialize_flag")]
    pub debug: bool,
    /// Raw per-module sections: `modules.<name>.config`.
    pub modules: BTreeMap<String, serde_json::Value>,
}

impl AppConfig {
    /// Load the layered configuration.
    ///
    /// # Errors
    /// Returns an error if the YAML file is unreadable or any layer fails to
    /// deserialize into the expected shape.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = config_path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(plain_env())
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded layers.
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.bind_addr = match self.server.bind_addr.parse::<SocketAddr>() {
                Ok(mut addr) => {
                    addr.set_port(port);
                    addr.to_string()
                }
                Err(_) => format!("0.0.0.0:{port}"),
            };
        }
        match verbose {
            0 => {}
            1 => "info".clone_into(&mut self.logging.level),
            2 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
    }

    /// Lenient module config loader.
    ///
    /// - module absent, or without a `config` field → `T::default()`
    /// - module not an object → `ConfigError::InvalidModuleStructure`
    /// - `config` present but invalid → `ConfigError::InvalidConfig`
    ///
    /// # Errors
    /// See above.
    pub fn module_config_or_default<T: DeserializeOwned + Default>(
        &self,
        module_name: &str,
    ) -> Result<T, ConfigError> {
        let Some(module_raw) = self.modules.get(module_name) else {
            return Ok(T::default());
        };

        let obj = module_raw
            .as_object()
            .ok_or_else(|| ConfigError::InvalidModuleStructure {
                module: module_name.to_owned(),
            })?;

        let Some(config_section) = obj.get("config") else {
            return Ok(T::default());
        };

        serde_json::from_value(config_section.clone()).map_err(|e| ConfigError::InvalidConfig {
            module: module_name.to_owned(),
            source: e,
        })
    }

    /// Render the effective configuration as YAML with secrets masked.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        let mut value = serde_json::to_value(self)?;
        redact_secrets(&mut value);
        Ok(serde_saphyr::to_string(&value)?)
    }
}

/// Unprefixed variables kept for compatibility with container deployments.
fn plain_env() -> Env {
    Env::raw()
        .only(&["LOG_LEVEL", "DATA_DIR", "SECRET_KEY", "DEBUG"])
        .map(|key| match key.as_str().to_ascii_lowercase().as_str() {
            "log_level" => "logging.level".into(),
            "data_dir" => "modules.calculator.config.data_dir".into(),
            "secret_key" => "modules.calculator.config.session.secret_key".into(),
            other => other.to_owned().into(),
        })
}

fn redact_secrets(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if key.contains("secret") {
                    *inner = serde_json::Value::String("***".to_owned());
                } else {
                    redact_secrets(inner);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}

/// Accepts `true`/`false`, `0`/`1`, and the usual string spellings.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
        Flag::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    const ALL_VARS: [&str; 6] = [
        "LOG_LEVEL",
        "DATA_DIR",
        "SECRET_KEY",
        "DEBUG",
        "CALC__SERVER__BIND_ADDR",
        "CALC__LOGGING__FORMAT",
    ];

    fn with_clean_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let mut all: Vec<(&str, Option<&str>)> = ALL_VARS.iter().map(|k| (*k, None)).collect();
        for &(k, v) in vars {
            all.retain(|(key, _)| *key != k);
            all.push((k, Some(v)));
        }
        temp_env::with_vars(all, f);
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct ModuleCfg {
        #[serde(default)]
        data_dir: String,
    }

    #[test]
    fn defaults_without_file_or_env() {
        with_clean_env(&[], || {
            let cfg = AppConfig::load(None).unwrap();
            assert_eq!(cfg.server.bind_addr, "0.0.0.0:5000");
            assert_eq!(cfg.logging.level, "info");
            assert_eq!(cfg.logging.format, LogFormat::Text);
            assert!(!cfg.debug);
            assert!(cfg.modules.is_empty());
        });
    }

    #[test]
    fn plain_env_vars_map_into_sections() {
        with_clean_env(
            &[
                ("LOG_LEVEL", "warn"),
                ("DATA_DIR", "/tmp/calc-data"),
                ("DEBUG", "true"),
            ],
            || {
                let cfg = AppConfig::load(None).unwrap();
                assert_eq!(cfg.logging.level, "warn");
                assert!(cfg.debug);
                let module: ModuleCfg = cfg.module_config_or_default("calculator").unwrap();
                assert_eq!(module.data_dir, "/tmp/calc-data");
            },
        );
    }

    #[test]
    fn prefixed_env_overrides_nested_keys() {
        with_clean_env(
            &[
                ("CALC__SERVER__BIND_ADDR", "127.0.0.1:8080"),
                ("CALC__LOGGING__FORMAT", "json"),
            ],
            || {
                let cfg = AppConfig::load(None).unwrap();
                assert_eq!(cfg.server.bind_addr, "127.0.0.1:8080");
                assert_eq!(cfg.logging.format, LogFormat::Json);
            },
        );
    }

    #[test]
    fn yaml_file_is_layered_below_env() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "server:\n  bind_addr: \"127.0.0.1:7000\"\nlogging:\n  level: debug\nmodules:\n  calculator:\n    config:\n      data_dir: /srv/yaml"
        )
        .unwrap();

        with_clean_env(&[("LOG_LEVEL", "error")], || {
            let cfg = AppConfig::load(Some(file.path())).unwrap();
            assert_eq!(cfg.server.bind_addr, "127.0.0.1:7000");
            assert_eq!(cfg.logging.level, "error");
            let module: ModuleCfg = cfg.module_config_or_default("calculator").unwrap();
            assert_eq!(module.data_dir, "/srv/yaml");
        });
    }

    #[test]
    fn missing_config_file_is_an_error() {
        with_clean_env(&[], || {
            let err = AppConfig::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
            assert!(err.to_string().contains("does not exist"));
        });
    }

    #[test]
    fn cli_overrides_port_and_verbosity() {
        let mut cfg = AppConfig::default();
        cfg.apply_cli_overrides(Some(9000), 2);
        assert_eq!(cfg.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(cfg.logging.level, "debug");

        cfg.apply_cli_overrides(None, 0);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn module_config_lenient_and_strict_paths() {
        let mut cfg = AppConfig::default();
        let missing: ModuleCfg = cfg.module_config_or_default("calculator").unwrap();
        assert_eq!(missing, ModuleCfg::default());

        cfg.modules.insert("calculator".to_owned(), json!({"other": 1}));
        let no_section: ModuleCfg = cfg.module_config_or_default("calculator").unwrap();
        assert_eq!(no_section, ModuleCfg::default());

        cfg.modules.insert("calculator".to_owned(), json!("nope"));
        assert!(matches!(
            cfg.module_config_or_default::<ModuleCfg>("calculator"),
            Err(ConfigError::InvalidModuleStructure { .. })
        ));

        cfg.modules
            .insert("calculator".to_owned(), json!({"config": {"data_dir": 42}}));
        assert!(matches!(
            cfg.module_config_or_default::<ModuleCfg>("calculator"),
            Err(ConfigError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn yaml_dump_masks_secrets() {
        let mut cfg = AppConfig::default();
        cfg.modules.insert(
            "calculator".to_owned(),
            json!({"config": {"session": {"secret_key": "hunter2"}}}),
        );
        let yaml = cfg.to_yaml().unwrap();
        assert!(!yaml.contains("hunter2"));
        assert!(yaml.contains("***"));
    }

    #[test]
    fn debug_flag_accepts_common_spellings() {
        for (raw, expected) in [("1", true), ("True", true), ("0", false), ("off", false)] {
            with_clean_env(&[("DEBUG", raw)], || {
                let cfg = AppConfig::load(None).unwrap();
                assert_eq!(cfg.debug, expected, "DEBUG={raw}");
            });
        }
    }
}
