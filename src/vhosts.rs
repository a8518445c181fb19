// Vhost tracking policy: explicit filter with aliases, or auto-discovery
// capped at emission time. Built once at startup, read-only afterwards.

use std::collections::HashMap;

/// The empty host name denotes the server-wide default host.
pub const GLOBAL_VHOST: &str = "";
/// Display alias for the global host.
pub const GLOBAL_ALIAS: &str = "Global";

#[derive(Debug, Clone)]
pub struct VhostRegistry {
    aliases: HashMap<String, String>,
    auto_mode: bool,
    auto_limit: usize,
}

impl VhostRegistry {
    /// Builds the registry from `host` or `host|alias` filter entries. Blank
    /// entries are skipped; an empty filter selects auto-discovery mode. A
    /// host configured twice is ambiguous and rejected.
    pub fn from_filter(filter: &[String], auto_limit: usize) -> anyhow::Result<Self> {
        let mut aliases = HashMap::new();
        let mut auto_mode = true;

        for entry in filter {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (host, alias) = match entry.split_once('|') {
                Some((host, alias)) => (host.trim(), alias.trim()),
                None => (entry, entry),
            };
            let alias = if alias.is_empty() { host } else { alias };
            anyhow::ensure!(
                aliases
                    .insert(host.to_string(), alias.to_string())
                    .is_none(),
                "duplicate vhost filter entry: {host}"
            );
            auto_mode = false;
        }

        aliases.insert(GLOBAL_VHOST.to_string(), GLOBAL_ALIAS.to_string());
        Ok(Self {
            aliases,
            auto_mode,
            auto_limit,
        })
    }

    pub fn auto_mode(&self) -> bool {
        self.auto_mode
    }

    /// Emission cap per loop in auto-discovery mode.
    pub fn auto_limit(&self) -> usize {
        self.auto_limit
    }

    /// Whether `host` is explicitly configured. The global host always is.
    pub fn is_registered(&self, host: &str) -> bool {
        self.aliases.contains_key(host)
    }

    /// Whether stats for `host` may be emitted under the current mode.
    pub fn is_tracked(&self, host: &str) -> bool {
        self.auto_mode || self.aliases.contains_key(host)
    }

    /// Display alias: the configured alias, `Global` for the empty host,
    /// otherwise the raw name.
    pub fn alias<'a>(&'a self, host: &'a str) -> &'a str {
        self.aliases.get(host).map(String::as_str).unwrap_or(host)
    }
}
