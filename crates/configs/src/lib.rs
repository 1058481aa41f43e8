use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_url() -> String { "sqlite::memory:".to_string() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Paging defaults applied when a list input carries no paging fields.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Upper bound for caller-supplied page sizes; unbounded when absent.
    #[serde(default)]
    pub max_page_size: Option<u64>,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self { default_page_size: default_page_size(), max_page_size: None }
    }
}

fn default_page_size() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Emit JSON structured logs instead of the compact format.
    #[serde(default)]
    pub json: bool,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    AppConfig::from_toml_str(&content)
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(content)?;
        Ok(cfg)
    }

    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.database.normalize_from_env();
        self.database.validate()?;
        self.paging.validate()?;
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // An empty URL in the file defers to DATABASE_URL.
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://") || lower.starts_with("sqlite:")) {
            return Err(anyhow!("database.url must start with postgres://, postgresql:// or sqlite:"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl PagingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(anyhow!("paging.default_page_size must be >= 1"));
        }
        if let Some(max) = self.max_page_size {
            if max < self.default_page_size {
                return Err(anyhow!("paging.max_page_size must be >= default_page_size"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.paging.default_page_size, 10);
        assert_eq!(cfg.paging.max_page_size, None);
        assert!(!cfg.logging.json);
    }

    #[test]
    fn paging_section_overrides_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [paging]
            default_page_size = 25
            max_page_size = 200

            [logging]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.paging.default_page_size, 25);
        assert_eq!(cfg.paging.max_page_size, Some(200));
        assert!(cfg.logging.json);
        assert!(cfg.paging.validate().is_ok());
    }

    #[test]
    fn rejects_max_below_default() {
        let paging = PagingConfig { default_page_size: 50, max_page_size: Some(20) };
        assert!(paging.validate().is_err());
    }

    #[test]
    fn rejects_unsupported_database_scheme() {
        let db = DatabaseConfig { url: "mysql://localhost/app".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
    }
}
