use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use distress_core::validate::ValidationPolicy;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-5-20250929-v1:0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    pub region: String,
    pub model_id: String,
    /// Named AWS profile; the default credential chain is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// How model answers that break the rubric are handled. Added in v1.
    #[serde(default)]
    pub validation: ValidationPolicy,
    pub created_at: jiff::Timestamp,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            region: DEFAULT_REGION.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            profile: None,
            validation: ValidationPolicy::default(),
            created_at: jiff::Timestamp::now(),
        }
    }
}

/// Values given on the command line. They take precedence over the
/// environment and the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub model_id: Option<String>,
    pub profile: Option<String>,
    pub validation: Option<ValidationPolicy>,
}

/// Where a resolved setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Flag,
    Env,
    File,
    Default,
}

/// Effective settings after layering flags > env > file > defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub region: String,
    pub model_id: String,
    pub profile: Option<String>,
    pub validation: ValidationPolicy,
    pub region_source: Source,
}

impl Settings {
    /// Resolve settings. `env` looks up an environment variable; pass
    /// `|k| std::env::var(k).ok()` outside of tests.
    ///
    /// Recognized variables: `DISTRESS_REGION` (falling back to
    /// `AWS_REGION`), `DISTRESS_MODEL_ID`, `DISTRESS_PROFILE` and
    /// `DISTRESS_VALIDATION`.
    pub fn resolve(
        file: Option<&AnalyzerConfig>,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> eyre::Result<Self> {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let (region, region_source) = if let Some(region) = &overrides.region {
            (region.clone(), Source::Flag)
        } else if let Some(region) = non_empty("DISTRESS_REGION").or_else(|| non_empty("AWS_REGION")) {
            (region, Source::Env)
        } else if let Some(config) = file {
            (config.region.clone(), Source::File)
        } else {
            (DEFAULT_REGION.to_string(), Source::Default)
        };

        let model_id = overrides
            .model_id
            .clone()
            .or_else(|| non_empty("DISTRESS_MODEL_ID"))
            .or_else(|| file.map(|c| c.model_id.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

        let profile = overrides
            .profile
            .clone()
            .or_else(|| non_empty("DISTRESS_PROFILE"))
            .or_else(|| file.and_then(|c| c.profile.clone()));

        let validation = match (overrides.validation, non_empty("DISTRESS_VALIDATION")) {
            (Some(policy), _) => policy,
            (None, Some(raw)) => raw
                .parse::<ValidationPolicy>()
                .map_err(|e| eyre::eyre!("DISTRESS_VALIDATION: {e}"))?,
            (None, None) => file.map(|c| c.validation).unwrap_or_default(),
        };

        Ok(Self {
            region,
            model_id,
            profile,
            validation,
            region_source,
        })
    }
}

/// Config info for `config show`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigInfo {
    pub path: String,
    pub file_present: bool,
    pub region: String,
    pub region_source: Source,
    pub model_id: String,
    pub credential_type: String,
    pub profile_name: Option<String>,
    pub validation: String,
    pub created_at: Option<String>,
}

pub fn config_info(path: &Path, file: Option<&AnalyzerConfig>, settings: &Settings) -> ConfigInfo {
    let credential_type = if settings.profile.is_some() {
        "profile"
    } else {
        "default_chain"
    };
    ConfigInfo {
        path: path.display().to_string(),
        file_present: file.is_some(),
        region: settings.region.clone(),
        region_source: settings.region_source,
        model_id: settings.model_id.clone(),
        credential_type: credential_type.to_string(),
        profile_name: settings.profile.clone(),
        validation: settings.validation.to_string(),
        created_at: file.map(|c| c.created_at.to_string()),
    }
}

fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("distress-analyzer"))
}

pub fn default_config_path() -> eyre::Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Load the config at `path`, or `None` if there is no file.
pub fn load_optional(path: &Path) -> eyre::Result<Option<AnalyzerConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    load_config(path).map(Some)
}

pub fn load_config(path: &Path) -> eyre::Result<AnalyzerConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: AnalyzerConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
pub fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update distress."
        ));
    }

    // v0 → v1: add validation policy
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.entry("validation")
            .or_insert(serde_json::Value::String(ValidationPolicy::default().to_string()));
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (added validation)");
    }

    Ok(json)
}

pub fn save_config(path: &Path, config: &AnalyzerConfig) -> eyre::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let json = serde_json::to_string_pretty(&stamped)?;

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
