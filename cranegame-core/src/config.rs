use crate::coordinates::ScreenSpace;
use crate::crane::CraneLayout;
use crate::rpc::{DEFAULT_MAX_PENDING, DEFAULT_REQUEST_TIMEOUT_MS, PluginIdentity, RequestPolicy};
use crate::sequencer::Choreography;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_URL: &str = "ws://localhost:8001";
pub const DEFAULT_PLUGIN_NAME: &str = "Crane Game";
pub const DEFAULT_PLUGIN_DEVELOPER: &str = "SnareChops";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub url: String,
    pub plugin_name: String,
    pub plugin_developer: String,
    pub request_timeout_ms: Option<f32>,
    pub max_pending: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            plugin_name: DEFAULT_PLUGIN_NAME.to_string(),
            plugin_developer: DEFAULT_PLUGIN_DEVELOPER.to_string(),
            request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

impl ConnectionConfig {
    pub fn identity(&self) -> PluginIdentity {
        PluginIdentity::new(self.plugin_name.clone(), self.plugin_developer.clone())
    }

    pub fn policy(&self) -> RequestPolicy {
        RequestPolicy {
            timeout_ms: self.request_timeout_ms,
            max_pending: self.max_pending,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub screen: ScreenSpace,
    pub crane: CraneLayout,
    pub choreography: Choreography,
    pub connection: ConnectionConfig,
    /// Custom claw artwork; the built-in shape is used when unset.
    pub claw_svg: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "invalid scene config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl SceneConfig {
    /// Missing sections and fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let config = SceneConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.connection.url, "ws://localhost:8001");
        assert_eq!(config.choreography.cycle_ms(), 21_700.0);
    }

    #[test]
    fn partial_sections_override_single_fields() {
        let config = SceneConfig::from_json_str(
            r#"{
                "screen": { "width": 1280 },
                "choreography": { "move_back_ms": 4000, "start_delay_ms": null },
                "connection": { "url": "ws://studio.local:8001" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.screen, ScreenSpace::new(1280.0, 1080.0));
        assert_eq!(config.choreography.move_back_ms, 4_000.0);
        assert_eq!(config.choreography.start_delay_ms, None);
        assert_eq!(config.choreography.move_to_ms, 5_000.0);
        assert_eq!(config.connection.url, "ws://studio.local:8001");
        assert_eq!(config.connection.plugin_name, "Crane Game");
        assert_eq!(config.crane, CraneLayout::default());
        assert_eq!(config.claw_svg, None);
    }

    #[test]
    fn connection_projects_identity_and_policy() {
        let connection = ConnectionConfig {
            request_timeout_ms: None,
            max_pending: 4,
            ..ConnectionConfig::default()
        };
        assert_eq!(
            connection.identity(),
            PluginIdentity::new("Crane Game", "SnareChops")
        );
        assert_eq!(
            connection.policy(),
            RequestPolicy {
                timeout_ms: None,
                max_pending: 4,
            }
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SceneConfig::from_json_str("{ screen: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("invalid scene config"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SceneConfig::load("/definitely/not/here/crane.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("crane.json"));
    }
}
