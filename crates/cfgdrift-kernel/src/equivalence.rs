//! Value equivalence between a declared setting and what Db2 reports.
//!
//! Db2 always reports auto-sized parameters as `AUTOMATIC(n)`, while a
//! desired state may say `n AUTOMATIC` or just `AUTOMATIC`. Path parameters
//! come back with node and log-stream segments appended.

use regex::Regex;
use std::sync::OnceLock;

/// Parameters whose observed value extends the declared base path.
pub const PATH_PREFIX_PARAMS: &[&str] = &["MIRRORLOGPATH"];

const AUTOMATIC: &str = "AUTOMATIC";

fn numeric_automatic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d+)\s*AUTOMATIC").expect("numeric automatic regex must compile"))
}

fn sized_automatic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"AUTOMATIC\(\d+\)").expect("sized automatic regex must compile"))
}

/// Whether `observed` denotes the same setting as `declared` for `param`.
///
/// Cases are tried in order and the first applicable one decides:
/// 1. path-prefix parameters: `observed` starts with `declared`;
/// 2. `N AUTOMATIC`: `observed` is exactly `AUTOMATIC(N)`;
/// 3. bare `AUTOMATIC`: `observed` holds `AUTOMATIC(<digits>)` or is `AUTOMATIC`;
/// 4. otherwise exact equality.
///
/// Identical strings always match, whichever case applies.
pub fn matches(param: &str, declared: &str, observed: &str) -> bool {
    tracing::trace!(param, declared, observed, "comparing");

    if PATH_PREFIX_PARAMS.contains(&param) {
        return observed.starts_with(declared);
    }
    if observed == declared {
        return true;
    }

    if let Some(caps) = numeric_automatic_re().captures(declared) {
        let hint = canonical_integer(&caps[1]);
        return observed == format!("{AUTOMATIC}({hint})");
    }

    if declared.eq_ignore_ascii_case(AUTOMATIC) {
        return observed == AUTOMATIC || sized_automatic_re().is_match(observed);
    }

    false
}

/// Decimal digits with leading zeros removed, so `0042` reads as `42`.
fn canonical_integer(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}
