// Derived metrics: ratio and difference guards over merged snapshot fields.
// All pure; nothing here mutates a snapshot.

/// The report expresses its BPS_* byte-rate fields in KB.
const BYTES_PER_KB: f64 = 1024.0;

/// Usage as a 0-100 percentage; 0 when the capacity is zero or absent.
pub fn usage_ratio(active: f64, max: f64) -> f64 {
    if max <= 0.0 { 0.0 } else { active / max * 100.0 }
}

/// `a - b` floored at zero; cross-core sums can be transiently inconsistent.
pub fn safe_diff(a: f64, b: f64) -> f64 {
    (a - b).max(0.0)
}

/// Hit fraction in 0-1; 0 when no requests were served.
pub fn cache_ratio(hits: f64, requests: f64) -> f64 {
    if requests <= 0.0 { 0.0 } else { hits / requests }
}

/// Scales a KB-reported field to bytes before emission.
pub fn kb_to_bytes(v: f64) -> f64 {
    v * BYTES_PER_KB
}
