// Metric record rendering: server, per-vhost, and per-extapp emissions with
// the vhost policy applied. Line formatting and printing live in the writer
// task; this module only builds the record set.

use crate::derive::{cache_ratio, kb_to_bytes, safe_diff, usage_ratio};
use crate::models::{FieldSet, MetricRecord, Snapshot};
use crate::vhosts::{GLOBAL_VHOST, VhostRegistry};

/// Emission toggles and the source label, resolved once at startup.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub source: String,
    pub vhost_requests: bool,
    pub vhost_extapps: bool,
}

/// Renders the merged snapshot into discrete metric records.
///
/// Server records carry `<source>`, host records `<source>-<alias>`, app
/// records `<source>-<alias>-<type>-<name>`. Hosts and apps emit in report
/// insertion order; in auto-discovery mode each loop stops at the registry's
/// cap while the snapshot itself keeps every discovered host.
pub fn render_metrics(
    snapshot: &Snapshot,
    registry: &VhostRegistry,
    options: &EmitOptions,
) -> Vec<MetricRecord> {
    let mut records = Vec::new();
    server_metrics(snapshot, &options.source, &mut records);
    if options.vhost_requests {
        vhost_metrics(snapshot, registry, &options.source, &mut records);
    }
    if options.vhost_extapps {
        extapp_metrics(snapshot, registry, &options.source, &mut records);
    }
    records
}

fn server_metrics(snapshot: &Snapshot, source: &str, out: &mut Vec<MetricRecord>) {
    let s = &snapshot.server;
    let http_active = s.get("PLAINCONN");
    let http_idle = s.get("IDLECONN");
    let http_max = s.get("MAXCONN");
    let ssl_active = s.get("SSLCONN");
    let ssl_max = s.get("MAXSSL_CONN");

    let mut push = |name, value| out.push(MetricRecord::new(name, value, source));

    push(
        "LS_HTTP_CONN_USAGE",
        usage_ratio(http_active + http_idle, http_max),
    );
    push("LS_HTTP_CONN_ACTIVE", http_active);
    push("LS_HTTP_CONN_IDLE", http_idle);
    push(
        "LS_HTTP_CONN_FREE",
        safe_diff(http_max, http_active + http_idle),
    );
    push("LS_SSL_CONN_USAGE", usage_ratio(ssl_active, ssl_max));
    push("LS_SSL_CONN_ACTIVE", ssl_active);
    push("LS_SSL_CONN_FREE", safe_diff(ssl_max, ssl_active));

    let http_in = kb_to_bytes(s.get("BPS_IN"));
    let http_out = kb_to_bytes(s.get("BPS_OUT"));
    let ssl_in = kb_to_bytes(s.get("SSL_BPS_IN"));
    let ssl_out = kb_to_bytes(s.get("SSL_BPS_OUT"));
    push("LS_HTTP_TRAFFIC_IN", http_in);
    push("LS_HTTP_TRAFFIC_OUT", http_out);
    push("LS_SSL_TRAFFIC_IN", ssl_in);
    push("LS_SSL_TRAFFIC_OUT", ssl_out);
    push("LS_ALL_TRAFFIC_IN", http_in + ssl_in);
    push("LS_ALL_TRAFFIC_OUT", http_out + ssl_out);

    let empty = FieldSet::new();
    let global = snapshot.vhost(GLOBAL_VHOST).unwrap_or(&empty);
    push("LS_ALL_REQ_ACTIVE", global.get("REQ_PROCESSING"));
    push("LS_ALL_REQ_RATE", global.get("REQ_PER_SEC"));
    push("LS_ALL_REQ_COUNT", global.get("TOT_REQS"));
    push("LS_CACHE_HIT_RATIO", cache_hit_ratio(global));
}

fn vhost_metrics(
    snapshot: &Snapshot,
    registry: &VhostRegistry,
    source: &str,
    out: &mut Vec<MetricRecord>,
) {
    let mut emitted = 0usize;
    for vhost in &snapshot.vhosts {
        if !registry.is_tracked(&vhost.name) {
            continue;
        }
        if registry.auto_mode() && emitted >= registry.auto_limit() {
            break;
        }
        let source = format!("{source}-{}", registry.alias(&vhost.name));
        let f = &vhost.fields;
        out.push(MetricRecord::new(
            "LS_REQ_ACTIVE",
            f.get("REQ_PROCESSING"),
            &source,
        ));
        out.push(MetricRecord::new("LS_REQ_RATE", f.get("REQ_PER_SEC"), &source));
        out.push(MetricRecord::new("LS_REQ_COUNT", f.get("TOT_REQS"), &source));
        out.push(MetricRecord::new(
            "LS_REQ_CACHE_HIT_RATIO",
            cache_hit_ratio(f),
            &source,
        ));
        emitted += 1;
    }
}

fn extapp_metrics(
    snapshot: &Snapshot,
    registry: &VhostRegistry,
    source: &str,
    out: &mut Vec<MetricRecord>,
) {
    let mut emitted = 0usize;
    for app in &snapshot.extapps {
        if !registry.is_tracked(&app.vhost) {
            continue;
        }
        if registry.auto_mode() && emitted >= registry.auto_limit() {
            break;
        }
        let source = format!(
            "{source}-{}-{}-{}",
            registry.alias(&app.vhost),
            app.kind,
            app.name
        );
        let f = &app.fields;
        out.push(MetricRecord::new("LS_EXT_CMAX", f.get("CMAXCONN"), &source));
        out.push(MetricRecord::new("LS_EXT_EMAX", f.get("EMAXCONN"), &source));
        out.push(MetricRecord::new("LS_EXT_POOL", f.get("POOL_SIZE"), &source));
        out.push(MetricRecord::new(
            "LS_EXT_ACTIVE",
            f.get("INUSE_CONN"),
            &source,
        ));
        out.push(MetricRecord::new("LS_EXT_IDLE", f.get("IDLE_CONN"), &source));
        out.push(MetricRecord::new(
            "LS_EXT_QUEUE",
            f.get("WAITQUE_DEPTH"),
            &source,
        ));
        out.push(MetricRecord::new(
            "LS_EXT_REQ_RATE",
            f.get("REQ_PER_SEC"),
            &source,
        ));
        out.push(MetricRecord::new(
            "LS_EXT_REQ_COUNT",
            f.get("TOT_REQS"),
            &source,
        ));
        out.push(MetricRecord::new(
            "LS_EXT_CONN_USAGE",
            usage_ratio(f.get("INUSE_CONN"), f.get("CMAXCONN")),
            &source,
        ));
        out.push(MetricRecord::new(
            "LS_EXT_POOL_FREE",
            safe_diff(f.get("POOL_SIZE"), f.get("INUSE_CONN") + f.get("IDLE_CONN")),
            &source,
        ));
        emitted += 1;
    }
}

/// Combined cache hit fraction over a host's request fields.
fn cache_hit_ratio(fields: &FieldSet) -> f64 {
    let hits = fields.get("TOTAL_PUB_CACHE_HITS")
        + fields.get("TOTAL_PRIVATE_CACHE_HITS")
        + fields.get("TOTAL_STATIC_HITS");
    cache_ratio(hits, fields.get("TOT_REQS"))
}
