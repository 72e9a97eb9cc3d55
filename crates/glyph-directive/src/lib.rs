//! Display-directive grammar parser.
//!
//! The AI backend embeds a compact directive of the form
//! `display:<domain>:<component>:<k1>=<v1>,<k2>=<v2>,...` anywhere inside its
//! free-form answer text. This crate extracts the first such directive and
//! parses its parameter string. Parsing is pure and never panics; anything
//! that does not match the grammar yields `None`.

use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

// =============================================================================
// Compiled regex sets (compiled once, reused across calls)
// =============================================================================

/// Matches `display:<domain>:<component>:<paramString>` as a substring.
/// Domain and component are single identifiers; the param string runs to the
/// end of the line and may itself contain colons and equals signs.
static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"display:(\w+):(\w+):([^\r\n]*)").expect("Invalid directive regex"));

/// Safe identifier pattern for parameter keys. Keys outside this set are
/// dropped so a directive can never smuggle arbitrary property names into
/// renderer configuration.
static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("Invalid identifier regex"));

// =============================================================================
// ParsedDirective
// =============================================================================

/// A parsed display directive.
///
/// Created per detection event, immediately consumed by the rendering fetch,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDirective {
    /// Business domain the component belongs to (e.g. `hr`, `sales`).
    pub domain: String,
    /// Component name within the domain (e.g. `org_chart`).
    pub component: String,
    /// Parsed key/value parameters. Duplicate keys: last occurrence wins.
    pub params: HashMap<String, String>,
    /// The raw directive substring as it appeared in the source text, kept so
    /// callers can re-issue the same rendering fetch later.
    pub raw: String,
}

/// Extract and parse the first display directive found in `input`.
///
/// Returns `None` when no substring matches the three-segment grammar.
/// Text before and after the directive is ignored here; use
/// [`strip_directive`] to recover the surrounding prose for display.
pub fn parse(input: &str) -> Option<ParsedDirective> {
    let caps = DIRECTIVE_RE.captures(input)?;
    Some(ParsedDirective {
        domain: caps[1].to_string(),
        component: caps[2].to_string(),
        params: parse_params(&caps[3]),
        raw: caps[0].to_string(),
    })
}

/// Cheap pre-check: does `input` contain a well-formed directive?
pub fn contains_directive(input: &str) -> bool {
    DIRECTIVE_RE.is_match(input)
}

/// Remove the first directive from `input`, returning the prose around it.
///
/// Borrows the input unchanged when no directive is present.
pub fn strip_directive(input: &str) -> Cow<'_, str> {
    match DIRECTIVE_RE.find(input) {
        None => Cow::Borrowed(input),
        Some(m) => {
            let mut out = String::with_capacity(input.len() - m.len());
            out.push_str(&input[..m.start()]);
            out.push_str(&input[m.end()..]);
            Cow::Owned(out.trim().to_string())
        }
    }
}

/// Parse the comma-separated `k=v` parameter string.
///
/// Each pair splits on the first `=` only, so values may contain `=`.
/// Pairs without `=`, or whose trimmed key is empty or not a safe
/// identifier, are dropped. Values keep their bytes untouched after
/// whitespace trimming; an empty value is kept as `""`.
///
/// Known limitation: splitting happens on bare commas with no escaping, so a
/// value that itself contains a comma is truncated at the comma boundary.
fn parse_params(param_str: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in param_str.split(',') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || !IDENT_RE.is_match(key) {
            continue;
        }
        params.insert(key.to_string(), value.trim().to_string());
    }
    params
}

// =============================================================================
// Tests
// =============================================================================
