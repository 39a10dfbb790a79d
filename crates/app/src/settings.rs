use std::fmt;
use std::path::{Path, PathBuf};

use drill_core::model::{DrillSettings, DrillSettingsDraft};

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    InvalidEnv { key: &'static str, raw: String },
    Invalid(drill_core::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid settings in {}: {source}", path.display())
            }
            ConfigError::InvalidEnv { key, raw } => write!(f, "invalid {key} value: {raw}"),
            ConfigError::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

const ENV_KEYS: [&str; 5] = [
    "DRILL_HIGHLIGHT_MS",
    "DRILL_GAP_MS",
    "DRILL_ROUND_PAUSE_MS",
    "DRILL_ROUND_CEILING",
    "DRILL_INTERFERENCE_POINTS",
];

/// Resolve drill settings: defaults, then the TOML file, then `DRILL_*` variables.
pub fn load(config: Option<&Path>) -> Result<DrillSettings, ConfigError> {
    let file = match config {
        Some(path) => read_file(path)?,
        None => DrillSettingsDraft::new(),
    };
    let env = from_env(|key| std::env::var(key).ok())?;
    file.merge(env)
        .validate()
        .map_err(|err| ConfigError::Invalid(err.into()))
}

fn read_file(path: &Path) -> Result<DrillSettingsDraft, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Result<DrillSettingsDraft, ConfigError> {
    let mut draft = DrillSettingsDraft::new();
    for key in ENV_KEYS {
        let Some(raw) = lookup(key) else {
            continue;
        };
        let invalid = || ConfigError::InvalidEnv {
            key,
            raw: raw.clone(),
        };
        match key {
            "DRILL_HIGHLIGHT_MS" => draft.highlight_ms = Some(raw.trim().parse().map_err(|_| invalid())?),
            "DRILL_GAP_MS" => draft.gap_ms = Some(raw.trim().parse().map_err(|_| invalid())?),
            "DRILL_ROUND_PAUSE_MS" => {
                draft.round_pause_ms = Some(raw.trim().parse().map_err(|_| invalid())?);
            }
            "DRILL_ROUND_CEILING" => {
                draft.round_ceiling = Some(raw.trim().parse().map_err(|_| invalid())?);
            }
            _ => draft.interference_points = Some(raw.trim().parse().map_err(|_| invalid())?),
        }
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn env_overrides_are_parsed() {
        let draft = from_env(|key| match key {
            "DRILL_GAP_MS" => Some("50".into()),
            "DRILL_ROUND_CEILING" => Some(" 5 ".into()),
            _ => None,
        })
        .unwrap();
        let settings = draft.validate().unwrap();
        assert_eq!(settings.gap(), Duration::from_millis(50));
        assert_eq!(settings.round_ceiling(), 5);
    }

    #[test]
    fn malformed_env_value_is_reported() {
        let err = from_env(|key| (key == "DRILL_HIGHLIGHT_MS").then(|| "fast".into())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "DRILL_HIGHLIGHT_MS", .. }));
    }

    #[test]
    fn toml_file_fields_map_onto_draft() {
        let draft: DrillSettingsDraft = toml::from_str("highlight_ms = 300\nround_pause_ms = 0\n").unwrap();
        let settings = draft.validate().unwrap();
        assert_eq!(settings.highlight(), Duration::from_millis(300));
        assert_eq!(settings.round_pause(), Duration::ZERO);
    }

    #[test]
    fn invalid_values_surface_as_domain_errors() {
        let dir = std::env::temp_dir().join(format!("drill-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("zero-ceiling.toml");
        std::fs::write(&path, "round_ceiling = 0\n").unwrap();

        let err = load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(drill_core::Error::Settings(_))));
        assert_eq!(err.to_string(), "round ceiling must be > 0");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unknown_toml_fields_are_rejected() {
        assert!(toml::from_str::<DrillSettingsDraft>("speed = 3\n").is_err());
    }
}
