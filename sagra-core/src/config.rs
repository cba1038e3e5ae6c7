//! Global sagra configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{SagraError, SagraResult};
use crate::store::SheetLayout;
use crate::user::Principal;

static DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
static DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org/search";

fn default_sheets_api_base() -> String {
    DEFAULT_SHEETS_API_BASE.to_string()
}

fn default_events_sheet() -> String {
    "Eventi".to_string()
}

fn default_users_sheet() -> String {
    "Utenti".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_geocoding_url() -> String {
    DEFAULT_GEOCODING_URL.to_string()
}

fn default_country_code() -> String {
    "it".to_string()
}

fn default_country_qualifier() -> String {
    "Italia".to_string()
}

/// Configuration at ~/.config/sagra/config.toml, overridable with
/// `SAGRA_*` environment variables (e.g. `SAGRA_API_KEY`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SagraConfig {
    #[serde(default)]
    pub spreadsheet_id: String,

    #[serde(default)]
    pub api_key: String,

    /// OAuth bearer token, needed by Google for appends.
    pub access_token: Option<String>,

    #[serde(default = "default_sheets_api_base")]
    pub sheets_api_base: String,

    #[serde(default = "default_events_sheet")]
    pub events_sheet: String,

    #[serde(default = "default_users_sheet")]
    pub users_sheet: String,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Appended to every address before geocoding.
    #[serde(default = "default_country_qualifier")]
    pub country_qualifier: String,

    /// Email of the logged-in contributor.
    pub user_email: Option<String>,

    pub user_name: Option<String>,
}

impl Default for SagraConfig {
    fn default() -> Self {
        SagraConfig {
            spreadsheet_id: String::new(),
            api_key: String::new(),
            access_token: None,
            sheets_api_base: default_sheets_api_base(),
            events_sheet: default_events_sheet(),
            users_sheet: default_users_sheet(),
            cache_ttl_secs: default_cache_ttl_secs(),
            geocoding_url: default_geocoding_url(),
            country_code: default_country_code(),
            country_qualifier: default_country_qualifier(),
            user_email: None,
            user_name: None,
        }
    }
}

impl SagraConfig {
    pub fn config_path() -> SagraResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SagraError::Config("Could not determine config directory".into()))?
            .join("sagra");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file (creating a commented default if missing) and
    /// layer environment overrides on top.
    pub fn load() -> SagraResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> SagraResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("SAGRA"))
            .build()
            .map_err(|e| SagraError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SagraError::Config(e.to_string()))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn layout(&self) -> SheetLayout {
        SheetLayout {
            events_sheet: self.events_sheet.clone(),
            users_sheet: self.users_sheet.clone(),
        }
    }

    /// The configured contributor, if any.
    pub fn principal(&self) -> Option<Principal> {
        let email = self.user_email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        Some(Principal {
            email: email.to_string(),
            name: self.user_name.clone(),
            photo_url: None,
        })
    }

    /// Fail early when the spreadsheet is not configured.
    pub fn require_spreadsheet(&self) -> SagraResult<()> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(SagraError::Config(format!(
                "No spreadsheet configured. Set spreadsheet_id in {} or SAGRA_SPREADSHEET_ID",
                Self::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.toml".into())
            )));
        }
        Ok(())
    }

    /// Effective settings as TOML, with secrets masked.
    pub fn to_toml(&self) -> SagraResult<String> {
        let mut shown = self.clone();
        if !shown.api_key.is_empty() {
            shown.api_key = "********".to_string();
        }
        if shown.access_token.is_some() {
            shown.access_token = Some("********".to_string());
        }

        toml::to_string_pretty(&shown).map_err(|e| SagraError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SagraResult<()> {
        let contents = format!(
            "\
# sagra configuration

# Google Sheets holding the events and users tabs:
# spreadsheet_id = \"\"
# api_key = \"\"
# access_token = \"\"
# sheets_api_base = \"{}\"
# events_sheet = \"Eventi\"
# users_sheet = \"Utenti\"

# Seconds before cached events are fetched again:
# cache_ttl_secs = 300

# Geocoding of event locations:
# geocoding_url = \"{}\"
# country_code = \"it\"
# country_qualifier = \"Italia\"

# Who you are when adding events:
# user_email = \"you@example.com\"
# user_name = \"Your Name\"
",
            DEFAULT_SHEETS_API_BASE, DEFAULT_GEOCODING_URL
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SagraError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SagraError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
