use serde::Deserialize;

/// Poll floor; sub-second sampling of slow-moving report counters is
/// meaningless, so anything lower is raised to this.
pub const MIN_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub vhosts: VhostConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Directory the server writes its per-core report files into.
    #[serde(default = "default_report_path")]
    pub path: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: default_report_path(),
        }
    }
}

fn default_report_path() -> String {
    "/tmp/lshttpd".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// How often to log worker stats (cycles run/failed, records emitted) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

fn default_interval_ms() -> u64 {
    MIN_POLL_INTERVAL_MS
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    /// Metric source label; defaults to the machine hostname.
    #[serde(default)]
    pub name: Option<String>,
    /// Truncate the hostname at its first dot.
    #[serde(default)]
    pub partial_hostname: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VhostConfig {
    /// Explicit `host` or `host|alias` entries; empty selects auto-discovery.
    #[serde(default)]
    pub filter: Vec<String>,
    /// How many discovered hosts to emit per poll in auto-discovery mode.
    #[serde(default = "default_auto_limit")]
    pub auto_limit: usize,
    #[serde(default)]
    pub enable_requests: bool,
    #[serde(default)]
    pub enable_extapps: bool,
}

impl Default for VhostConfig {
    fn default() -> Self {
        Self {
            filter: Vec::new(),
            auto_limit: default_auto_limit(),
            enable_requests: false,
            enable_extapps: false,
        }
    }
}

fn default_auto_limit() -> usize {
    20
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse, validate, and normalize config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let mut config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        if config.polling.interval_ms < MIN_POLL_INTERVAL_MS {
            config.polling.interval_ms = MIN_POLL_INTERVAL_MS;
        }
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.report.path.trim().is_empty(),
            "report.path must be non-empty"
        );
        anyhow::ensure!(
            self.polling.stats_log_interval_secs > 0,
            "polling.stats_log_interval_secs must be > 0, got {}",
            self.polling.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.vhosts.auto_limit > 0,
            "vhosts.auto_limit must be > 0, got {}",
            self.vhosts.auto_limit
        );
        Ok(())
    }
}
