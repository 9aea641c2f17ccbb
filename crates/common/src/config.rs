use serde::{Deserialize, Serialize};

/// Top-level system configuration, deserialized from system.toml.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub reasoner: ReasonerConfig,
    pub sessions: SessionConfig,
}

/// External reasoner subprocess configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Whether the external reasoner path is attempted at all.
    pub enabled: bool,
    /// Reasoner binary invoked as a subprocess.
    pub command: String,
    /// Base fact-template file loaded by every generated script.
    pub template_path: String,
    /// Hard bound on one inference run. The subprocess is killed on expiry.
    pub timeout_seconds: u64,
    /// Bound on the version probe that gates every inference attempt.
    pub probe_timeout_seconds: u64,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "clips".to_string(),
            template_path: "clips/templates.clp".to_string(),
            timeout_seconds: 30,
            probe_timeout_seconds: 5,
        }
    }
}

/// Session table parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle minutes after which an abandoned session is swept.
    pub idle_ttl_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_minutes: 240,
        }
    }
}
