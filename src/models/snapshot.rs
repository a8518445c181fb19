// Field sets, vhost and extapp stats, per-core snapshot

use std::collections::HashMap;

/// Uppercase field name to numeric value. Values are finite and non-negative;
/// unusable input coerces to 0 at the parse boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet(HashMap<String, f64>);

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, 0 when absent.
    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Inserts `key`, or adds `value` to its running sum.
    pub fn add(&mut self, key: impl Into<String>, value: f64) {
        *self.0.entry(key.into()).or_insert(0.0) += value;
    }

    /// Insert-or-sum every field of `other` into `self`.
    pub fn merge(&mut self, other: &FieldSet) {
        for (key, value) in &other.0 {
            self.add(key.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// One vhost's request fields; the empty name is the global host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VhostStat {
    pub name: String,
    pub fields: FieldSet,
}

/// One external application backend under a vhost. `kind` and `name` are
/// identity fields, stored verbatim and never summed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtAppStat {
    pub kind: String,
    pub vhost: String,
    pub name: String,
    pub fields: FieldSet,
}

/// Parsed state of one core's report; also the merged aggregate across cores.
/// Vhosts and extapps keep report insertion order, which is the emission
/// order when the auto-discovery cap truncates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub server: FieldSet,
    pub vhosts: Vec<VhostStat>,
    pub extapps: Vec<ExtAppStat>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.server.is_empty() && self.vhosts.is_empty() && self.extapps.is_empty()
    }

    /// Request fields for `host`, if that host appears in the snapshot.
    pub fn vhost(&self, host: &str) -> Option<&FieldSet> {
        self.vhosts
            .iter()
            .find(|v| v.name == host)
            .map(|v| &v.fields)
    }

    /// Request fields for `host`, created at first mention.
    pub fn vhost_fields(&mut self, host: &str) -> &mut FieldSet {
        let idx = match self.vhosts.iter().position(|v| v.name == host) {
            Some(i) => i,
            None => {
                self.vhosts.push(VhostStat {
                    name: host.to_string(),
                    fields: FieldSet::new(),
                });
                self.vhosts.len() - 1
            }
        };
        &mut self.vhosts[idx].fields
    }

    /// Counter fields for app `name` under `vhost`, created at first mention.
    /// Identity fields are set on creation only.
    pub fn extapp_fields(&mut self, kind: &str, vhost: &str, name: &str) -> &mut FieldSet {
        let idx = match self
            .extapps
            .iter()
            .position(|a| a.vhost == vhost && a.name == name)
        {
            Some(i) => i,
            None => {
                self.extapps.push(ExtAppStat {
                    kind: kind.to_string(),
                    vhost: vhost.to_string(),
                    name: name.to_string(),
                    fields: FieldSet::new(),
                });
                self.extapps.len() - 1
            }
        };
        &mut self.extapps[idx].fields
    }

    pub fn find_extapp_mut(&mut self, vhost: &str, name: &str) -> Option<&mut ExtAppStat> {
        self.extapps
            .iter_mut()
            .find(|a| a.vhost == vhost && a.name == name)
    }
}
