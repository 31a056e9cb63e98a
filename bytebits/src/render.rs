use crate::bits::BitVector;

/// How bit boxes present themselves.
///
/// Affects rendering only. Switching modes never touches a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DisplayMode {
    /// Boxes are blank; state is conveyed by the on/off pattern alone.
    #[default]
    Pattern,
    /// Boxes also carry their literal `0`/`1`.
    Bits,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Pattern => DisplayMode::Bits,
            DisplayMode::Bits => DisplayMode::Pattern,
        }
    }

    pub fn shows_bits(self) -> bool {
        self == DisplayMode::Bits
    }

    pub fn from_show_bits(show_bits: bool) -> Self {
        if show_bits {
            DisplayMode::Bits
        } else {
            DisplayMode::Pattern
        }
    }

    /// Caption for the toggle control: it names the mode a click switches to.
    pub fn button_label(self) -> &'static str {
        match self {
            DisplayMode::Pattern => "Show Bits",
            DisplayMode::Bits => "Show Pattern",
        }
    }
}

/// One rendered bit box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitCell {
    pub active: bool,
    /// `Some('0' | '1')` in [`DisplayMode::Bits`], `None` otherwise.
    pub label: Option<char>,
}

impl BitCell {
    pub fn new(active: bool, mode: DisplayMode) -> Self {
        let label = mode
            .shows_bits()
            .then_some(if active { '1' } else { '0' });
        BitCell { active, label }
    }
}

/// Everything the rendering boundary needs to draw one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub index: usize,
    pub value: u8,
    pub bits: BitVector,
    pub cells: [BitCell; 8],
}

impl RowView {
    pub fn new(index: usize, value: u8, mode: DisplayMode) -> Self {
        let bits = BitVector::from_value(value);
        let cells = bits.as_array().map(|active| BitCell::new(active, mode));
        RowView {
            index,
            value,
            bits,
            cells,
        }
    }
}

/// Render a row as fixed-width text, e.g. `  5  [ ][ ][ ][ ][ ][#][ ][#]`.
pub fn render_row_text(row: &RowView) -> String {
    let mut out = String::with_capacity(5 + 3 * row.cells.len());
    out.push_str(&format!("{:>3}  ", row.value));
    for cell in &row.cells {
        let glyph = match (cell.label, cell.active) {
            (Some(c), _) => c,
            (None, true) => '#',
            (None, false) => ' ',
        };
        out.push('[');
        out.push(glyph);
        out.push(']');
    }
    out
}
