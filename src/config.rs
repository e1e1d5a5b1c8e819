use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the credential/configuration file
pub const DEFAULT_CONFIG_PATH: &str = "private/secret.toml";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sharepoint: SharePointConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Tenant, site and app-only credentials for the SharePoint site
#[derive(Debug, Clone, Deserialize)]
pub struct SharePointConfig {
    /// Tenant base URL, e.g. `https://contoso.sharepoint.com`
    pub tenant_name: String,
    pub site: String,
    /// Document root relative to the site, e.g. `Shared Documents/General`
    pub root_dir_relative_url: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,
}

/// Property names and request tuning for the traversal
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_spreadsheet_extension")]
    pub spreadsheet_extension: String,
    #[serde(default = "default_description_property")]
    pub description_property: String,
    #[serde(default = "default_sheet_manifest_property")]
    pub sheet_manifest_property: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            spreadsheet_extension: default_spreadsheet_extension(),
            description_property: default_description_property(),
            sheet_manifest_property: default_sheet_manifest_property(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_client_secret_env() -> String {
    "SHAREPOINT_CLIENT_SECRET".to_string()
}

fn default_spreadsheet_extension() -> String {
    ".xlsx".to_string()
}

fn default_description_property() -> String {
    "OData__x005f_ExtendedDescription".to_string()
}

fn default_sheet_manifest_property() -> String {
    "Excelcontents".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from the default location
    ///
    /// Looks for the config file in this order:
    /// 1. Path specified in SPMAP_CONFIG environment variable
    /// 2. ./private/secret.toml
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SPMAP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file
    ///
    /// Loads environment variables from .env file (if present) first, so the
    /// client secret can live outside the TOML file.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let sp = &self.sharepoint;

        let tenant = url::Url::parse(&sp.tenant_name)
            .with_context(|| format!("sharepoint.tenant_name is not a valid URL: {}", sp.tenant_name))?;
        if !matches!(tenant.scheme(), "http" | "https") {
            anyhow::bail!("sharepoint.tenant_name must be an http(s) URL: {}", sp.tenant_name);
        }

        if sp.site.trim().is_empty() {
            anyhow::bail!("sharepoint.site must not be empty");
        }

        if sp.root_dir_relative_url.trim_matches('/').trim().is_empty() {
            anyhow::bail!("sharepoint.root_dir_relative_url must not be empty");
        }

        if sp.client_id.trim().is_empty() {
            anyhow::bail!("sharepoint.client_id must not be empty");
        }

        if !self.scan.spreadsheet_extension.starts_with('.') {
            anyhow::bail!(
                "scan.spreadsheet_extension must start with '.': {}",
                self.scan.spreadsheet_extension
            );
        }

        if self.scan.request_timeout_secs == 0 {
            anyhow::bail!("scan.request_timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Client secret, inline value first, then the named environment variable.
    ///
    /// Only the scanner needs it, so loading does not require one.
    pub fn client_secret(&self) -> Result<String> {
        if let Some(secret) = self.sharepoint.client_secret.as_deref() {
            if !secret.trim().is_empty() {
                return Ok(secret.to_string());
            }
        }
        std::env::var(&self.sharepoint.client_secret_env).with_context(|| {
            format!(
                "No client secret: set sharepoint.client_secret or the {} environment variable (a .env file works too).",
                self.sharepoint.client_secret_env
            )
        })
    }

    /// Tenant base URL without a trailing slash
    pub fn tenant_url(&self) -> &str {
        self.sharepoint.tenant_name.trim_end_matches('/')
    }

    /// Absolute URL of the site, `{tenant}/sites/{site}`
    pub fn site_url(&self) -> String {
        format!("{}/sites/{}", self.tenant_url(), self.sharepoint.site.trim_matches('/'))
    }

    /// Server-relative path of the scan root, `/sites/{site}/{root}`
    pub fn root_path(&self) -> String {
        format!(
            "/sites/{}/{}",
            self.sharepoint.site.trim_matches('/'),
            self.sharepoint.root_dir_relative_url.trim_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.scan.request_timeout_secs)
    }
}
