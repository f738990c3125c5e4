//! Event selector parsing.
//!
//! Turns selector strings such as `"[mousedown, window:mouseup] > window:mousemove!"`
//! into structured [`EventStream`]s. Grammar:
//!
//! ```text
//! selectors := selector ("," selector)*
//! selector  := "[" selector "," selector "]" ">" selector | stream
//! stream    := (source ":" | "@" markname ":" | marktype ":")? type "!"? ("[" expr "]")* ("{" throttle ("," debounce)? "}")?
//! ```

use crate::error::CompileError;
use serde::{Deserialize, Serialize};

const MARK_TYPES: [&str; 12] = [
    "arc", "area", "group", "image", "line", "path", "rect", "rule", "shape", "symbol", "text",
    "trail",
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventStream {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marktype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consume: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub between: Vec<EventStream>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<Box<EventStream>>,
}

impl EventStream {
    /// Adds a filter expression unless it is already present.
    pub fn add_filter(&mut self, expr: &str) {
        let filters = self.filter.get_or_insert_with(Vec::new);
        if !filters.iter().any(|f| f == expr) {
            filters.push(expr.to_string());
        }
    }
}

/// Parses a comma-separated list of event selectors. Streams without an
/// explicit source get `default_source`.
pub fn parse(selector: &str, default_source: &str) -> Result<Vec<EventStream>, CompileError> {
    let parser = SelectorParser {
        input: selector,
        default_source,
    };
    parser
        .split_merge(selector)?
        .into_iter()
        .map(|part| parser.parse_selector(part))
        .collect()
}

struct SelectorParser<'a> {
    input: &'a str,
    default_source: &'a str,
}

/// Index of the first `end` byte at nesting depth zero, or `s.len()`.
fn find(s: &[u8], mut i: usize, end: u8, push: &[u8], pop: &[u8]) -> usize {
    let mut depth = 0i32;
    while i < s.len() {
        let c = s[i];
        if depth == 0 && c == end {
            return i;
        } else if pop.contains(&c) {
            depth -= 1;
        } else if push.contains(&c) {
            depth += 1;
        }
        i += 1;
    }
    i
}

impl<'a> SelectorParser<'a> {
    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::InvalidEventSelector {
            selector: self.input.to_string(),
            message: message.into(),
        }
    }

    fn split_merge<'s>(&self, s: &'s str) -> Result<Vec<&'s str>, CompileError> {
        let bytes = s.as_bytes();
        let mut output = Vec::new();
        let (mut start, mut i) = (0, 0);
        while i < bytes.len() {
            i = find(bytes, i, b',', b"[{", b"]}");
            output.push(s[start..i].trim());
            i += 1;
            start = i;
        }
        if output.is_empty() {
            return Err(self.error("empty event selector"));
        }
        Ok(output)
    }

    fn parse_selector(&self, s: &str) -> Result<EventStream, CompileError> {
        if s.starts_with('[') {
            self.parse_between(s)
        } else {
            self.parse_stream(s)
        }
    }

    fn parse_between(&self, s: &str) -> Result<EventStream, CompileError> {
        let close = find(s.as_bytes(), 1, b']', b"[", b"]");
        if close == s.len() {
            return Err(self.error("empty between selector"));
        }
        let bounds = self.split_merge(&s[1..close])?;
        if bounds.len() != 2 {
            return Err(self.error("between selector must have two elements"));
        }
        let rest = s[close + 1..].trim();
        let Some(inner) = rest.strip_prefix('>') else {
            return Err(self.error("expected '>' after between selector"));
        };
        let between = bounds
            .into_iter()
            .map(|b| self.parse_selector(b))
            .collect::<Result<Vec<_>, _>>()?;

        let mut stream = self.parse_selector(inner.trim())?;
        if stream.between.is_empty() {
            stream.between = between;
            Ok(stream)
        } else {
            Ok(EventStream {
                between,
                stream: Some(Box::new(stream)),
                ..Default::default()
            })
        }
    }

    fn parse_stream(&self, selector: &str) -> Result<EventStream, CompileError> {
        let mut s = selector;
        let mut throttle = (0.0, 0.0);

        if s.ends_with('}') {
            let Some(open) = s.rfind('{') else {
                return Err(self.error("unmatched right brace"));
            };
            throttle = self.parse_throttle(&s[open + 1..s.len() - 1])?;
            s = s[..open].trim();
        }
        if s.is_empty() {
            return Err(self.error("empty event stream"));
        }

        let bytes = s.as_bytes();
        let n = bytes.len();
        let is_markname = bytes[0] == b'@';
        let mut i = usize::from(is_markname);
        let mut start = 0;
        let mut source = Vec::with_capacity(2);

        let colon = find(bytes, i, b':', b"", b"");
        if colon < n {
            source.push(s[start..colon].trim());
            i = colon + 1;
            start = i;
        }

        let mut filter = None;
        i = find(bytes, i, b'[', b"", b"");
        if i == n {
            source.push(s[start..n].trim());
        } else {
            source.push(s[start..i].trim());
            i += 1;
            start = i;
            if start == n {
                return Err(self.error("unmatched left bracket"));
            }
            let mut filters = Vec::new();
            while i < n {
                i = find(bytes, i, b']', b"", b"");
                if i == n {
                    return Err(self.error("unmatched left bracket"));
                }
                filters.push(s[start..i].trim().to_string());
                if i < n - 1 {
                    i += 1;
                    if bytes[i] != b'[' {
                        return Err(self.error("expected left bracket"));
                    }
                }
                i += 1;
                start = i;
            }
            filter = Some(filters);
        }

        let last = source.last().copied().unwrap_or_default();
        if last.is_empty() || last.contains(['[', ']', '{', '}']) {
            return Err(self.error("invalid event type"));
        }

        let mut stream = EventStream {
            source: Some(self.default_source.to_string()),
            filter,
            ..Default::default()
        };
        let mut event_type = if let [prefix, event_type] = source[..] {
            if is_markname {
                stream.markname = Some(prefix[1..].to_string());
            } else if MARK_TYPES.contains(&prefix) {
                stream.marktype = Some(prefix.to_string());
            } else {
                stream.source = Some(prefix.to_string());
            }
            event_type.to_string()
        } else {
            last.to_string()
        };
        if event_type.ends_with('!') {
            event_type.pop();
            stream.consume = Some(true);
        }
        stream.event_type = Some(event_type);
        if throttle.0 != 0.0 {
            stream.throttle = Some(throttle.0);
        }
        if throttle.1 != 0.0 {
            stream.debounce = Some(throttle.1);
        }
        Ok(stream)
    }

    /// `throttle[,debounce]`; an empty entry counts as zero.
    fn parse_throttle(&self, s: &str) -> Result<(f64, f64), CompileError> {
        let parts: Vec<&str> = s.split(',').collect();
        if s.trim().is_empty() || parts.len() > 2 {
            return Err(self.error("invalid throttle specification"));
        }
        let mut values = [0.0; 2];
        for (slot, part) in values.iter_mut().zip(&parts) {
            let part = part.trim();
            *slot = if part.is_empty() {
                0.0
            } else {
                part.parse::<f64>()
                    .map_err(|_| self.error("invalid throttle specification"))?
            };
        }
        Ok((values[0], values[1]))
    }
}

