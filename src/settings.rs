use anyhow::*;
use directories_next::BaseDirs;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::templates::{
    TemplateNames, DEFAULT_OBJECT_NAME, DEFAULT_TEMPLATE_EXT, DEFAULT_TYPE_SUFFIX,
};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdminSettings {
    pub name: String,
    pub url: String,
    pub datetime_format: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        AdminSettings {
            name: "Quiz Admin".to_owned(),
            url: "/admin".to_owned(),
            datetime_format: "%Y-%m-%d %H:%M".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub smart_slug_enabled: bool,
    pub object_name: String,
    pub template_ext: String,
    pub default_template_suffix: String,
    pub question_url_prefix: String,
    pub template_root: PathBuf,
    pub admin: AdminSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            smart_slug_enabled: false,
            object_name: DEFAULT_OBJECT_NAME.to_owned(),
            template_ext: DEFAULT_TEMPLATE_EXT.to_owned(),
            default_template_suffix: DEFAULT_TYPE_SUFFIX.to_owned(),
            question_url_prefix: "/question".to_owned(),
            template_root: PathBuf::from("."),
            admin: AdminSettings::default(),
        }
    }
}

impl Settings {
    pub fn default_path() -> Result<PathBuf> {
        let mut path = BaseDirs::new()
            .context("could not locate system directories")?
            .config_dir()
            .to_path_buf();
        path.push("quizdesk");
        path.push("settings.toml");
        Ok(path)
    }

    pub fn from_toml(source: &str) -> Result<Settings> {
        toml::from_str(source).context("Invalid settings")
    }

    /// Reads settings from `path`, or from the default location when no path
    /// is given. A missing default file yields the default settings.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Settings::default_path()?, false),
        };
        if !path.exists() {
            if required {
                return Err(anyhow!("Settings file {} does not exist", path.display()));
            }
            return Ok(Settings::default());
        }
        info!("Reading settings from {}", path.display());
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Could not read settings file {}", path.display()))?;
        Settings::from_toml(&source)
    }

    pub fn template_names(&self) -> TemplateNames {
        TemplateNames::new(
            &self.object_name,
            &self.template_ext,
            &self.default_template_suffix,
        )
    }
}
