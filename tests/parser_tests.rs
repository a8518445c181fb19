// Report parser tests: recognized prefixes, forward-scan KVP extraction,
// bracketed host/app qualifiers, extapp host validation

use rtmetrics::models::FieldSet;
use rtmetrics::report::{ReportError, parse_report};
use rtmetrics::vhosts::VhostRegistry;

fn auto_registry() -> VhostRegistry {
    VhostRegistry::from_filter(&[], 20).expect("auto registry")
}

fn strict_registry(entries: &[&str]) -> VhostRegistry {
    let entries: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
    VhostRegistry::from_filter(&entries, 20).expect("strict registry")
}

#[test]
fn recognized_lines_fill_server_fields() {
    let raw = "VERSION: LiteSpeed Web Server/Enterprise/5.2.8\n\
               UPTIME: 01:45:26\n\
               BPS_IN: 12, BPS_OUT: 34, SSL_BPS_IN: 5, SSL_BPS_OUT: 6\n\
               MAXCONN: 10000, MAXSSL_CONN: 5000, PLAINCONN: 1, AVAILCONN: 9999, IDLECONN: 0, SSLCONN: 2, AVAILSSL: 4998\n";
    let snapshot = parse_report(raw, &auto_registry()).unwrap();
    assert_eq!(snapshot.server.get("BPS_IN"), 12.0);
    assert_eq!(snapshot.server.get("SSL_BPS_OUT"), 6.0);
    assert_eq!(snapshot.server.get("MAXCONN"), 10000.0);
    assert_eq!(snapshot.server.get("AVAILSSL"), 4998.0);
    // VERSION and UPTIME are not recognized prefixes
    assert!(!snapshot.server.contains("VERSION"));
    assert!(!snapshot.server.contains("UPTIME"));
}

#[test]
fn unrecognized_lines_are_ignored() {
    let raw = "VERSION: LiteSpeed Web Server/Enterprise/5.2.8\nBLOCKED_IP: \nEOF\n";
    let snapshot = parse_report(raw, &auto_registry()).unwrap();
    assert!(snapshot.is_empty());
}

#[test]
fn empty_input_yields_empty_valid_snapshot() {
    let snapshot = parse_report("", &auto_registry()).unwrap();
    assert!(snapshot.is_empty());
}

#[test]
fn missing_value_coerces_to_explicit_zero() {
    // A trailing field with no value is indistinguishable from an explicit 0.
    let with_missing = parse_report("MAXCONN: , PLAINCONN: 7", &auto_registry()).unwrap();
    let with_zero = parse_report("MAXCONN: 0, PLAINCONN: 7", &auto_registry()).unwrap();
    assert!(with_missing.server.contains("MAXCONN"));
    assert_eq!(with_missing.server, with_zero.server);
}

#[test]
fn malformed_numeric_coerces_to_zero() {
    let snapshot = parse_report("MAXCONN: abc, PLAINCONN: 5", &auto_registry()).unwrap();
    assert_eq!(snapshot.server.get("MAXCONN"), 0.0);
    assert_eq!(snapshot.server.get("PLAINCONN"), 5.0);
}

#[test]
fn non_finite_and_negative_values_coerce() {
    let snapshot =
        parse_report("MAXCONN: NaN, PLAINCONN: -3, IDLECONN: inf", &auto_registry()).unwrap();
    assert_eq!(snapshot.server.get("MAXCONN"), 0.0);
    assert_eq!(snapshot.server.get("PLAINCONN"), 0.0);
    assert_eq!(snapshot.server.get("IDLECONN"), 0.0);
}

#[test]
fn repeated_key_sums_within_line() {
    let snapshot = parse_report("MAXCONN: 5, MAXCONN: 7", &auto_registry()).unwrap();
    assert_eq!(snapshot.server.get("MAXCONN"), 12.0);
}

#[test]
fn keys_are_uppercased() {
    let snapshot = parse_report("MAXCONN: 1, availConn: 9", &auto_registry()).unwrap();
    assert_eq!(snapshot.server.get("AVAILCONN"), 9.0);
}

#[test]
fn req_rate_empty_brackets_is_global_host() {
    let snapshot = parse_report(
        "REQ_RATE []: REQ_PROCESSING: 1, REQ_PER_SEC: 2.5, TOT_REQS: 5",
        &auto_registry(),
    )
    .unwrap();
    assert_eq!(snapshot.vhosts.len(), 1);
    assert_eq!(snapshot.vhosts[0].name, "");
    assert_eq!(snapshot.vhosts[0].fields.get("TOT_REQS"), 5.0);
    assert_eq!(snapshot.vhosts[0].fields.get("REQ_PER_SEC"), 2.5);
}

#[test]
fn req_rate_hosts_register_in_report_order() {
    let raw = "REQ_RATE []: TOT_REQS: 1\n\
               REQ_RATE [beta.example]: TOT_REQS: 2\n\
               REQ_RATE [alpha.example]: TOT_REQS: 3\n";
    let snapshot = parse_report(raw, &auto_registry()).unwrap();
    let names: Vec<&str> = snapshot.vhosts.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["", "beta.example", "alpha.example"]);
}

#[test]
fn extapp_identity_fields_stored_verbatim() {
    let raw = "REQ_RATE [example.com]: TOT_REQS: 1\n\
               EXTAPP [LSAPI] [example.com] [lsphp]: CMAXCONN: 35, POOL_SIZE: 1, INUSE_CONN: 0, IDLE_CONN: 1\n";
    let snapshot = parse_report(raw, &auto_registry()).unwrap();
    assert_eq!(snapshot.extapps.len(), 1);
    let app = &snapshot.extapps[0];
    assert_eq!(app.kind, "LSAPI");
    assert_eq!(app.vhost, "example.com");
    assert_eq!(app.name, "lsphp");
    assert_eq!(app.fields.get("CMAXCONN"), 35.0);
    assert!(!app.fields.contains("LSAPI"));
}

#[test]
fn extapp_unknown_host_is_consistency_error() {
    let err = parse_report(
        "EXTAPP [Proxy] [nowhere.example] [backend]: CMAXCONN: 10",
        &strict_registry(&["example.com"]),
    )
    .unwrap_err();
    assert!(matches!(err, ReportError::UnknownExtAppHost { .. }));
    let msg = err.to_string();
    assert!(msg.contains("nowhere.example"), "got: {msg}");
}

#[test]
fn extapp_host_known_from_configuration() {
    let snapshot = parse_report(
        "EXTAPP [Proxy] [example.com] [backend]: CMAXCONN: 10",
        &strict_registry(&["example.com"]),
    )
    .unwrap();
    assert_eq!(snapshot.extapps.len(), 1);
}

#[test]
fn extapp_host_known_from_earlier_req_rate_line() {
    let raw = "REQ_RATE [fresh.example]: TOT_REQS: 1\n\
               EXTAPP [LSAPI] [fresh.example] [lsphp]: CMAXCONN: 10\n";
    let snapshot = parse_report(raw, &strict_registry(&["example.com"])).unwrap();
    assert_eq!(snapshot.extapps.len(), 1);
}

#[test]
fn extapp_global_host_always_known() {
    let snapshot = parse_report(
        "EXTAPP [LSAPI] [] [lsphp]: CMAXCONN: 35, POOL_SIZE: 1",
        &strict_registry(&["example.com"]),
    )
    .unwrap();
    assert_eq!(snapshot.extapps.len(), 1);
    assert_eq!(snapshot.extapps[0].vhost, "");
}

#[test]
fn malformed_brackets_skip_the_line() {
    let raw = "REQ_RATE [oops: TOT_REQS: 5\nEXTAPP [a] [b]: X: 1\n";
    let snapshot = parse_report(raw, &auto_registry()).unwrap();
    assert!(snapshot.vhosts.is_empty());
    assert!(snapshot.extapps.is_empty());
}

#[test]
fn same_extapp_mentioned_twice_accumulates() {
    let raw = "EXTAPP [LSAPI] [] [lsphp]: TOT_REQS: 3\n\
               EXTAPP [LSAPI] [] [lsphp]: TOT_REQS: 4\n";
    let snapshot = parse_report(raw, &auto_registry()).unwrap();
    assert_eq!(snapshot.extapps.len(), 1);
    assert_eq!(snapshot.extapps[0].fields.get("TOT_REQS"), 7.0);
}

// Serialize a field set back into report syntax with `first` as the leading
// key, so the line keeps its recognized prefix.
fn to_line(prefix: &str, first: &str, fields: &FieldSet) -> String {
    let mut parts = vec![format!("{first}: {}", fields.get(first))];
    for (key, value) in fields.iter() {
        if key != first {
            parts.push(format!("{key}: {value}"));
        }
    }
    format!("{prefix}{}", parts.join(", "))
}

#[test]
fn reparse_of_serialized_fields_is_identical() {
    let raw = "MAXCONN: 10000, MAXSSL_CONN: 5000, PLAINCONN: 3, IDLECONN: 2, SSLCONN: 1\n\
               BPS_IN: 12, BPS_OUT: 34, SSL_BPS_IN: 0, SSL_BPS_OUT: 0\n\
               REQ_RATE []: REQ_PROCESSING: 0, REQ_PER_SEC: 1.5, TOT_REQS: 37\n\
               REQ_RATE [example.com]: REQ_PROCESSING: 1, TOT_REQS: 9\n";
    let registry = auto_registry();
    let first = parse_report(raw, &registry).unwrap();

    let mut serialized = to_line("", "MAXCONN", &first.server);
    serialized.push('\n');
    for vhost in &first.vhosts {
        serialized.push_str(&to_line(
            &format!("REQ_RATE [{}]: ", vhost.name),
            "TOT_REQS",
            &vhost.fields,
        ));
        serialized.push('\n');
    }

    let second = parse_report(&serialized, &registry).unwrap();
    assert_eq!(first.server, second.server);
    assert_eq!(first.vhosts.len(), second.vhosts.len());
    for vhost in &first.vhosts {
        assert_eq!(second.vhost(&vhost.name), Some(&vhost.fields));
    }
}
