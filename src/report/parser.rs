// Report text parsing: fixed recognized line prefixes, single forward-scan
// KVP extraction. Everything else in the report is ignored.

use super::ReportError;
use crate::models::{FieldSet, Snapshot};
use crate::vhosts::VhostRegistry;
use std::collections::HashSet;

const PREFIX_BPS: &str = "BPS_IN:";
const PREFIX_CONN: &str = "MAXCONN:";
const PREFIX_REQ_RATE: &str = "REQ_RATE";
const PREFIX_EXTAPP: &str = "EXTAPP";

/// Parses one core's report text into a snapshot.
///
/// `BPS_IN:` and `MAXCONN:` lines feed the server field set. A
/// `REQ_RATE [host]:` line feeds that host's field set (empty brackets is the
/// global host) and registers the host for auto-discovery. An
/// `EXTAPP [type] [host] [name]:` line feeds that app's field set; its owning
/// host must be configured or introduced by an earlier `REQ_RATE` line, since
/// extapp stats are meaningless without a resolved host.
pub fn parse_report(raw: &str, registry: &VhostRegistry) -> Result<Snapshot, ReportError> {
    let mut snapshot = Snapshot::default();
    let mut seen_hosts: HashSet<&str> = HashSet::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.starts_with(PREFIX_BPS) || line.starts_with(PREFIX_CONN) {
            scan_fields(line, &mut snapshot.server);
        } else if let Some(rest) = line.strip_prefix(PREFIX_REQ_RATE) {
            let Some((idents, body)) = split_bracketed(rest, 1) else {
                continue;
            };
            let host = idents[0];
            seen_hosts.insert(host);
            scan_fields(body, snapshot.vhost_fields(host));
        } else if let Some(rest) = line.strip_prefix(PREFIX_EXTAPP) {
            let Some((idents, body)) = split_bracketed(rest, 3) else {
                continue;
            };
            let (kind, host, name) = (idents[0], idents[1], idents[2]);
            if !host.is_empty() && !registry.is_registered(host) && !seen_hosts.contains(host) {
                return Err(ReportError::UnknownExtAppHost {
                    vhost: host.to_string(),
                    app: name.to_string(),
                });
            }
            scan_fields(body, snapshot.extapp_fields(kind, host, name));
        }
    }

    Ok(snapshot)
}

/// Splits `[a] [b] ...: rest` into its bracketed identifiers and the text
/// after them. Returns None when the bracket syntax is broken; such lines are
/// skipped like any other unrecognized line.
fn split_bracketed(text: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut idents = Vec::with_capacity(count);
    let mut rest = text;
    for _ in 0..count {
        let open = rest.find('[')?;
        let close = rest[open + 1..].find(']')? + open + 1;
        idents.push(rest[open + 1..close].trim());
        rest = &rest[close + 1..];
    }
    let rest = rest.trim_start();
    Some((idents, rest.strip_prefix(':').unwrap_or(rest)))
}

/// Single forward scan over `KEY: value` pairs separated by commas or
/// whitespace. Keys are uppercased; a missing or unusable value counts as 0;
/// a key repeated within one line sums. The token iterator only moves
/// forward, so the scan terminates on any input.
fn scan_fields(text: &str, out: &mut FieldSet) {
    let mut tokens = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .peekable();

    while let Some(token) = tokens.next() {
        let Some((key, inline)) = token.split_once(':') else {
            continue;
        };
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }
        let value = if inline.is_empty() {
            // The value, if any, is the next token; consume it only if numeric.
            match tokens.peek().and_then(|t| parse_value(t)) {
                Some(v) => {
                    tokens.next();
                    v
                }
                None => 0.0,
            }
        } else {
            parse_value(inline).unwrap_or(0.0)
        };
        out.add(key.to_ascii_uppercase(), value);
    }
}

/// Finite, non-negative numeric token; anything else is unusable.
fn parse_value(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0))
}
