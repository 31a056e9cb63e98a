//! The URL fragment format: one decimal value per row, comma-separated,
//! in row order (`"5,200"`).

use smallvec::SmallVec;

use crate::value;

/// Entry separator.
pub const SEPARATOR: char = ',';

/// Values read from a fragment, positionally aligned to rows.
pub type Entries = SmallVec<[u8; 8]>;

/// Parse a fragment into coerced values.
///
/// A leading `#` is accepted so address-bar text can be passed as-is.
/// An empty fragment has no entries. Every entry is coerced like field
/// input, so an empty entry between two commas reads as 0.
pub fn parse(fragment: &str) -> Entries {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    if fragment.is_empty() {
        return Entries::new();
    }
    fragment
        .split(SEPARATOR)
        .map(|entry| value::coerce(entry))
        .collect()
}

/// Join values into the fragment text, without a leading `#`.
pub fn serialize(values: impl IntoIterator<Item = u8>) -> String {
    let mut out = String::new();
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(&v.to_string());
    }
    out
}
