//! INI file configuration adapter.

use crate::adapters::default_config;
use crate::domain::error::InvestingError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::{Ini, IniDefault};
use std::path::Path;

/// Keys and values are looked up case-insensitively. Section names are also
/// kept as written so portfolio names can be checked.
pub struct FileConfigAdapter {
    config: Ini,
    section_names: Vec<String>,
}

/// `#` and `;` only start a comment at the beginning of a line, so values
/// such as `/data/stocks#2024` survive intact.
fn new_ini(case_sensitive: bool) -> Ini {
    let mut defaults = IniDefault::default();
    defaults.case_sensitive = case_sensitive;
    defaults.enable_inline_comments = false;
    Ini::new_from_defaults(defaults)
}

impl FileConfigAdapter {
    /// Apply the same loading steps to a case-folded and a case-preserving parser.
    fn build<E>(fill: impl Fn(&mut Ini) -> Result<(), E>) -> Result<Self, E> {
        let mut config = new_ini(false);
        fill(&mut config)?;
        let mut raw = new_ini(true);
        fill(&mut raw)?;
        Ok(Self {
            config,
            section_names: raw.sections(),
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InvestingError> {
        let path = path.as_ref();
        Self::build(|ini| {
            ini.load(path).map_err(|reason| parse_error(path, reason))?;
            Ok(())
        })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        Self::build(|ini| {
            ini.read(content.to_string())?;
            Ok(())
        })
    }

    /// Built-in defaults overridden key by key by `user_path`, when it exists.
    pub fn with_defaults(user_path: &Path) -> Result<Self, InvestingError> {
        if !user_path.exists() {
            tracing::debug!("No config file at {}, using defaults", user_path.display());
        }
        Self::build(|ini| {
            ini.read(default_config::defaults().to_string())
                .map_err(|reason| parse_error(Path::new("<defaults>"), reason))?;
            if user_path.exists() {
                ini.load_and_append(user_path)
                    .map_err(|reason| parse_error(user_path, reason))?;
            }
            Ok(())
        })
    }

    /// The user's file alone, or an empty config when it does not exist yet.
    pub fn user_only(user_path: &Path) -> Result<Self, InvestingError> {
        if user_path.exists() {
            Self::from_file(user_path)
        } else {
            Ok(Self {
                config: new_ini(false),
                section_names: Vec::new(),
            })
        }
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.config.set(section, key, Some(value.to_string()));
        if !self
            .section_names
            .iter()
            .any(|s| s.eq_ignore_ascii_case(section))
        {
            self.section_names.push(section.to_string());
        }
    }

    pub fn to_ini_string(&self) -> String {
        self.config.writes()
    }

    /// Write the config, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> Result<(), InvestingError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.config.write(path)?;
        Ok(())
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

fn parse_error(path: &Path, reason: String) -> InvestingError {
    InvestingError::ConfigParse {
        file: path.display().to_string(),
        reason,
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .filter(|v| !v.trim().is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }

    fn sections(&self) -> Vec<String> {
        self.section_names.clone()
    }
}
