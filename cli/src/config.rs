use std::fs;
use std::path::Path;

use sensorthings_core::model::{MultiDatastreams, SensingCore};
use sensorthings_core::{IdKind, ModelBuilder, ModelRegistry, ParserSettings, QueryDefaults, Version};
use serde::Deserialize;

use crate::error::{CliError, Result};

const DEFAULT_CONFIG_ENV: &str = "STA_PARSE_CONFIG";

const KNOWN_PLUGINS: [&str; 1] = ["multi_datastream"];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub log_level: Option<String>,
    pub service_root_url: String,
    pub version: String,
    pub model: ModelSettings,
    pub parser: ParserSection,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: Some(String::from("info")),
            service_root_url: String::from("http://localhost:8080/sta"),
            version: Version::default().to_string(),
            model: ModelSettings::default(),
            parser: ParserSection::default(),
        }
    }
}

impl CliConfig {
    pub fn from_sources(cli_path: Option<&str>) -> Result<Self> {
        let env_path = std::env::var(DEFAULT_CONFIG_ENV).ok();

        if let Some(path) = cli_path {
            if path.is_empty() {
                return Err(CliError::Config(
                    "configuration path must not be empty".into(),
                ));
            }
        }

        let config = if let Some(path) = cli_path {
            Self::load_from_path(path)?
        } else if let Some(path) = env_path.as_deref().filter(|p| !p.is_empty()) {
            Self::load_from_path(path)?
        } else {
            Self::default()
        };

        config.check()?;
        Ok(config)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let raw = fs::read_to_string(&absolute_path)?;
        let config: CliConfig = toml::from_str(&raw)?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.service_root_url.trim().is_empty() {
            return Err(CliError::Config(
                "service_root_url must not be empty".into(),
            ));
        }

        self.version()?;

        let defaults = &self.parser.defaults;
        if defaults.top_default > defaults.top_max {
            return Err(CliError::Config(format!(
                "parser.defaults.top_default ({}) exceeds parser.defaults.top_max ({})",
                defaults.top_default, defaults.top_max
            )));
        }

        if let Some(unknown) = self
            .model
            .plugins
            .iter()
            .find(|name| !KNOWN_PLUGINS.contains(&name.as_str()))
        {
            return Err(CliError::Config(format!("unknown model plugin '{unknown}'")));
        }

        Ok(())
    }

    pub fn version(&self) -> Result<Version> {
        Ok(self.version.parse()?)
    }

    pub fn parser_settings(&self) -> ParserSettings {
        ParserSettings {
            custom_links_enabled: self.parser.custom_links_enabled,
            defaults: QueryDefaults {
                top_default: self.parser.defaults.top_default,
                top_max: self.parser.defaults.top_max,
                count_default: self.parser.defaults.count_default,
            },
        }
    }

    /// The sensing core plus every configured plugin.
    pub fn build_model(&self) -> Result<ModelRegistry> {
        let id_kind = self.model.id_kind.into();
        let mut builder = ModelBuilder::new();
        builder.apply(&SensingCore::new(id_kind))?;
        for name in &self.model.plugins {
            match name.as_str() {
                "multi_datastream" => {
                    builder.apply(&MultiDatastreams { id_kind })?;
                }
                other => {
                    return Err(CliError::Config(format!("unknown model plugin '{other}'")));
                }
            }
        }
        Ok(builder.finalize()?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKindSetting {
    #[default]
    Long,
    String,
    Uuid,
}

impl From<IdKindSetting> for IdKind {
    fn from(setting: IdKindSetting) -> Self {
        match setting {
            IdKindSetting::Long => IdKind::Long,
            IdKindSetting::String => IdKind::String,
            IdKindSetting::Uuid => IdKind::Uuid,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub id_kind: IdKindSetting,
    pub plugins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParserSection {
    pub custom_links_enabled: bool,
    pub defaults: DefaultsSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsSection {
    pub top_default: u64,
    pub top_max: u64,
    pub count_default: bool,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        let defaults = QueryDefaults::default();
        Self {
            top_default: defaults.top_default,
            top_max: defaults.top_max,
            count_default: defaults.count_default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    fn load(text: &str) -> Result<CliConfig> {
        let file = write_config(text);
        CliConfig::from_sources(file.path().to_str())
    }

    #[test]
    fn full_file_is_read() {
        let config = load(
            r#"
log_level = "debug"
service_root_url = "https://example.org/sta"
version = "v1.0"

[model]
id_kind = "string"
plugins = ["multi_datastream"]

[parser]
custom_links_enabled = true

[parser.defaults]
top_default = 20
top_max = 200
count_default = true
"#,
        )
        .unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.version().unwrap(), Version::V1_0);
        assert_eq!(config.model.id_kind, IdKindSetting::String);

        let settings = config.parser_settings();
        assert!(settings.custom_links_enabled);
        assert_eq!(
            settings.defaults,
            QueryDefaults {
                top_default: 20,
                top_max: 200,
                count_default: true,
            }
        );

        let registry = config.build_model().unwrap();
        let thing = registry.entity_set("Things").unwrap();
        assert_eq!(thing.id_kind(), IdKind::String);
        assert!(registry.entity_set("MultiDatastreams").is_some());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = load("service_root_url = \"http://x\"\n").unwrap();
        assert_eq!(config.version().unwrap(), Version::V1_1);
        assert_eq!(config.parser_settings(), ParserSettings::default());
        assert!(config.model.plugins.is_empty());
        assert!(config.build_model().unwrap().entity_set("MultiDatastreams").is_none());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        for text in [
            "service_root_url = \"  \"\n",
            "version = \"v2.0\"\n",
            "[parser.defaults]\ntop_default = 10\ntop_max = 5\n",
            "[model]\nplugins = [\"tasking\"]\n",
        ] {
            assert!(
                matches!(load(text), Err(CliError::Config(_)) | Err(CliError::Version(_))),
                "{text:?} should be rejected"
            );
        }
        assert!(matches!(
            load("[model]\nid_kind = \"guid\"\n"),
            Err(CliError::Toml(_))
        ));
    }

    #[test]
    fn empty_cli_path_is_an_error() {
        assert!(matches!(
            CliConfig::from_sources(Some("")),
            Err(CliError::Config(_))
        ));
    }
}
