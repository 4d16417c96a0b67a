//! Parameter extraction from raw command output.
//!
//! `db2 get db cfg` and `db2 get dbm cfg` print one parameter per line as
//! `<description> (<PARAM>) = <value>`. `db2set` prints `<PARAM>=<value>`,
//! with ` [O]` appended when the value is an override.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Layout of a raw command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// `get db cfg` / `get dbm cfg` listings.
    Config,
    /// `db2set` listings.
    Registry,
}

/// Value reported for `param` in `raw`, or `None` if no line carries it.
///
/// The first matching line wins. The parameter name is matched literally and
/// only at its delimiter (`(NAME)` or a line-leading `NAME=`), so a name never
/// matches inside a longer one.
pub fn extract<'a>(raw: &'a str, param: &str, format: Format) -> Option<&'a str> {
    let re = line_pattern(param, format);
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str())
}

fn line_pattern(param: &str, format: Format) -> Regex {
    let name = regex::escape(param);
    let pattern = match format {
        Format::Config => format!(r"(?m)\({name}\)[ \t]*=[ \t]?(.*?)\r?$"),
        Format::Registry => format!(r"(?m)^[ \t]*{name}=(.*?)(?:[ \t]\[O\])?\r?$"),
    };
    // Escaped input cannot produce an invalid pattern.
    Regex::new(&pattern).expect("escaped parameter pattern must compile")
}
