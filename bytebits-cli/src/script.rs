//! Event scripts for `bytebits replay`.
//!
//! One event per line:
//!
//! ```text
//! # numeric field 0 now reads "300", then bit 7 of row 1 is clicked
//! edit 0 300
//! click 1 7
//! # display toggle, then an address-bar change
//! mode
//! hash 5,200
//! ```
//!
//! Lines starting with `#` are comments.

use anyhow::{bail, Context, Result};

use bytebits::Event;

/// Parse a whole script. Errors name the offending line.
pub fn parse_script(src: &str) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for (n, line) in src.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = parse_line(line).with_context(|| format!("line {}: {line:?}", n + 1))?;
        events.push(event);
    }
    Ok(events)
}

fn parse_line(line: &str) -> Result<Event> {
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match verb {
        "edit" => {
            let (row, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Ok(Event::FieldEdited {
                row: parse_index(row, "row")?,
                text: text.trim().to_string(),
            })
        }
        "click" => {
            let mut parts = rest.split_whitespace();
            let row = parse_index(parts.next().unwrap_or(""), "row")?;
            let bit = parse_index(parts.next().unwrap_or(""), "bit")?;
            if parts.next().is_some() {
                bail!("click takes a row and a bit");
            }
            Ok(Event::BitClicked { row, bit })
        }
        "mode" => {
            if !rest.is_empty() {
                bail!("mode takes no arguments");
            }
            Ok(Event::DisplayToggled)
        }
        "hash" => Ok(Event::FragmentChanged(rest.to_string())),
        other => bail!("unknown event {other:?} (expected edit, click, mode, or hash)"),
    }
}

fn parse_index(s: &str, what: &str) -> Result<usize> {
    if s.is_empty() {
        bail!("missing {what}");
    }
    s.parse().with_context(|| format!("invalid {what} {s:?}"))
}
