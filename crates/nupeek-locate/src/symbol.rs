use std::fmt;

use serde::Serialize;

/// What the caller asked to find.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum TargetSpec {
    /// A type name; matched exactly, never through a member.
    Type(String),
    /// A type or `Type.Member` reference; falls back to a member search.
    Symbol(String),
}

impl TargetSpec {
    pub fn text(&self) -> &str {
        match self {
            TargetSpec::Type(text) | TargetSpec::Symbol(text) => text,
        }
    }

    pub fn allows_member_fallback(&self) -> bool {
        matches!(self, TargetSpec::Symbol(_))
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Type(name) => write!(f, "type {name}"),
            TargetSpec::Symbol(name) => write!(f, "symbol {name}"),
        }
    }
}

/// Trailing member name of a dotted symbol.
///
/// Any parameter list and generic argument list are removed first, and dots
/// inside angle brackets do not split, so `Ns.Cache<K.V>.Get<T>(int)` gives `Get`.
pub fn member_name(symbol: &str) -> Option<&str> {
    let head = symbol.trim();
    let head = head.split_once('(').map_or(head, |(before, _)| before).trim_end();
    let head = strip_trailing_generics(head);

    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in head.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => start = i + 1,
            _ => {}
        }
    }

    let name = head[start..].trim();
    (!name.is_empty()).then_some(name)
}

fn strip_trailing_generics(text: &str) -> &str {
    if !text.ends_with('>') {
        return text;
    }

    let mut depth = 0usize;
    for (i, ch) in text.char_indices().rev() {
        match ch {
            '>' => depth += 1,
            '<' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return text[..i].trim_end();
                }
            }
            _ => {}
        }
    }
    text
}
