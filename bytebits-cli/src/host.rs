use std::io::Write;

use bytebits::render::{self, DisplayMode, RowView};
use bytebits::Host;

/// Prints renders and fragment writes as a replay log.
///
/// The address bar is simulated: a write that changes the text is echoed
/// back as a fragment change, like a browser raising `hashchange`.
pub struct TerminalHost<W> {
    out: W,
    fragment: String,
}

impl<W: Write> TerminalHost<W> {
    pub fn new(out: W, fragment: &str) -> Self {
        TerminalHost {
            out,
            fragment: fragment.trim_start_matches('#').to_string(),
        }
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Host for TerminalHost<W> {
    type Error = std::io::Error;

    fn render_row(&mut self, row: &RowView) -> std::io::Result<()> {
        writeln!(self.out, "row {}: {}", row.index, render::render_row_text(row))
    }

    fn write_fragment(&mut self, fragment: &str) -> std::io::Result<bool> {
        if self.fragment == fragment {
            return Ok(false);
        }
        writeln!(self.out, "hash: #{fragment}")?;
        self.fragment = fragment.to_string();
        Ok(true)
    }

    fn display_mode_changed(&mut self, mode: DisplayMode) -> std::io::Result<()> {
        writeln!(self.out, "mode: {mode:?} [{}]", mode.button_label())
    }
}
