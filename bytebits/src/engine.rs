use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::bits::{self, BitVector};
use crate::fragment;
use crate::render::{DisplayMode, RowView};
use crate::value::{self, RawValue};

/// One row's stored byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Register {
    pub index: usize,
    pub value: u8,
}

impl Register {
    pub fn bits(&self) -> BitVector {
        BitVector::from_value(self.value)
    }
}

/// Indices of the rows a fragment load actually changed, in row order.
pub type Changes = SmallVec<[usize; 8]>;

/// Owns every register plus the display mode, and applies edits from
/// the numeric fields, the bit boxes, and the URL fragment.
///
/// The row count is fixed at construction. Every mutation compares the
/// coerced value against the stored one and reports whether anything
/// changed; callers use that flag to decide whether to re-render and
/// re-serialize, which is what stops a fragment write from echoing back
/// into another load forever.
#[derive(Debug, Clone)]
pub struct ValueSyncEngine {
    registers: Vec<Register>,
    mode: DisplayMode,
}

impl ValueSyncEngine {
    /// `rows` registers, all zero, in pattern mode.
    pub fn new(rows: usize) -> Self {
        ValueSyncEngine {
            registers: (0..rows).map(|index| Register { index, value: 0 }).collect(),
            mode: DisplayMode::default(),
        }
    }

    /// `rows` registers seeded from `values`; missing values are zero and
    /// extra values are dropped.
    pub fn with_values(rows: usize, values: &[u8]) -> Self {
        let mut engine = ValueSyncEngine::new(rows);
        for (reg, &v) in engine.registers.iter_mut().zip(values) {
            reg.value = v;
        }
        engine
    }

    pub fn with_display_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    pub fn value(&self, index: usize) -> Option<u8> {
        self.registers.get(index).map(|r| r.value)
    }

    pub fn values(&self) -> Vec<u8> {
        self.registers.iter().map(|r| r.value).collect()
    }

    pub fn bit_vector(&self, index: usize) -> Option<BitVector> {
        self.registers.get(index).map(Register::bits)
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn row_view(&self, index: usize) -> Option<RowView> {
        self.registers
            .get(index)
            .map(|r| RowView::new(r.index, r.value, self.mode))
    }

    pub fn row_views(&self) -> Vec<RowView> {
        self.registers
            .iter()
            .map(|r| RowView::new(r.index, r.value, self.mode))
            .collect()
    }

    /// Coerce `raw` and store it in row `index`.
    ///
    /// Returns `true` when the stored value changed. An index past the
    /// last row is ignored.
    pub fn set_value<'a>(&mut self, index: usize, raw: impl Into<RawValue<'a>>) -> bool {
        let value = value::coerce(raw);
        self.apply(index, value)
    }

    /// Flip bit `pos` (0 = MSB) of row `index`.
    ///
    /// Returns `true` when the row exists and the bit position is valid;
    /// a flip always changes the value.
    pub fn toggle_bit(&mut self, index: usize, pos: usize) -> bool {
        let (Some(current), Some(weight)) = (self.value(index), bits::weight(pos)) else {
            trace!(index, pos, "ignoring bit toggle outside the register grid");
            return false;
        };
        self.set_value(index, current ^ weight)
    }

    /// Apply a fragment to the registers, position by position.
    ///
    /// Entries past the last row are ignored and rows past the last entry
    /// keep their value. Rows whose coerced entry equals the stored value
    /// are skipped, so loading the fragment this engine just serialized
    /// reports no changes.
    pub fn load_from_fragment(&mut self, fragment: &str) -> Changes {
        let entries = fragment::parse(fragment);
        if entries.len() > self.registers.len() {
            trace!(
                entries = entries.len(),
                rows = self.registers.len(),
                "ignoring trailing fragment entries"
            );
        }

        let mut changes = Changes::new();
        for (index, value) in entries.into_iter().enumerate().take(self.registers.len()) {
            if self.apply(index, value) {
                changes.push(index);
            }
        }
        changes
    }

    /// The fragment text for the current registers, e.g. `"5,200"`.
    pub fn serialize_to_fragment(&self) -> String {
        fragment::serialize(self.registers.iter().map(|r| r.value))
    }

    /// Switch between pattern-only and bits-shown rendering and return the
    /// new mode. Register values are untouched; callers re-render every row.
    pub fn toggle_display_mode(&mut self) -> DisplayMode {
        self.mode = self.mode.toggled();
        debug!(mode = ?self.mode, "display mode toggled");
        self.mode
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    /// Store an already-coerced value, comparing first.
    fn apply(&mut self, index: usize, value: u8) -> bool {
        let Some(reg) = self.registers.get_mut(index) else {
            trace!(index, "ignoring edit for missing row");
            return false;
        };
        if reg.value == value {
            trace!(index, value, "value unchanged");
            return false;
        }
        debug!(index, from = reg.value, to = value, "register updated");
        reg.value = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_engine_is_all_zero() {
        let engine = ValueSyncEngine::new(3);
        assert_eq!(engine.len(), 3);
        assert_eq!(engine.values(), vec![0, 0, 0]);
        assert_eq!(engine.serialize_to_fragment(), "0,0,0");
        assert_eq!(engine.display_mode(), DisplayMode::Pattern);
    }

    #[test]
    fn with_values_pads_and_truncates() {
        assert_eq!(ValueSyncEngine::with_values(3, &[7]).values(), vec![7, 0, 0]);
        assert_eq!(ValueSyncEngine::with_values(1, &[7, 8]).values(), vec![7]);
    }

    #[test]
    fn set_value_clamps_and_reports_change() {
        let mut engine = ValueSyncEngine::new(2);
        assert!(engine.set_value(0, "300"));
        assert_eq!(engine.value(0), Some(255));
        assert!(!engine.set_value(0, 999));
        assert!(engine.set_value(0, "-3"));
        assert_eq!(engine.value(0), Some(0));
        assert!(engine.set_value(1, "42"));
        assert!(engine.set_value(1, "junk"));
        assert_eq!(engine.value(1), Some(0));
    }

    #[test]
    fn set_value_out_of_range_row_is_ignored() {
        let mut engine = ValueSyncEngine::with_values(2, &[1, 2]);
        assert!(!engine.set_value(2, "9"));
        assert_eq!(engine.values(), vec![1, 2]);
    }

    #[test]
    fn toggle_bit_flips_msb_and_lsb() {
        let mut engine = ValueSyncEngine::with_values(1, &[5]);
        assert!(engine.toggle_bit(0, 0));
        assert_eq!(engine.value(0), Some(133));

        let mut engine = ValueSyncEngine::with_values(1, &[5]);
        assert!(engine.toggle_bit(0, 7));
        assert_eq!(engine.value(0), Some(4));
    }

    #[test]
    fn toggle_bit_twice_restores() {
        let mut engine = ValueSyncEngine::with_values(1, &[77]);
        for pos in 0..8 {
            engine.toggle_bit(0, pos);
            engine.toggle_bit(0, pos);
        }
        assert_eq!(engine.value(0), Some(77));
    }

    #[test]
    fn toggle_bit_out_of_range_is_ignored() {
        let mut engine = ValueSyncEngine::with_values(1, &[5]);
        assert!(!engine.toggle_bit(0, 8));
        assert!(!engine.toggle_bit(1, 0));
        assert_eq!(engine.value(0), Some(5));
    }

    #[test]
    fn bit_vector_tracks_value() {
        let mut engine = ValueSyncEngine::with_values(1, &[5]);
        assert_eq!(engine.bit_vector(0), Some(BitVector::from_value(5)));
        engine.set_value(0, 128);
        assert_eq!(engine.bit_vector(0).map(|b| b.to_string()).as_deref(), Some("10000000"));
        assert_eq!(engine.bit_vector(1), None);
    }

    #[test]
    fn load_reports_changed_rows_only() {
        let mut engine = ValueSyncEngine::with_values(3, &[1, 2, 3]);
        let changes = engine.load_from_fragment("1,9,3");
        assert_eq!(changes.as_slice(), &[1]);
        assert_eq!(engine.values(), vec![1, 9, 3]);
    }

    #[test]
    fn load_short_fragment_leaves_tail_alone() {
        let mut engine = ValueSyncEngine::with_values(3, &[1, 2, 3]);
        engine.load_from_fragment("7");
        assert_eq!(engine.values(), vec![7, 2, 3]);
    }

    #[test]
    fn load_long_fragment_ignores_extra() {
        let mut engine = ValueSyncEngine::new(2);
        let changes = engine.load_from_fragment("1,2,3,4");
        assert_eq!(changes.as_slice(), &[0, 1]);
        assert_eq!(engine.values(), vec![1, 2]);
    }

    #[test]
    fn load_empty_fragment_is_noop() {
        let mut engine = ValueSyncEngine::with_values(2, &[5, 6]);
        assert!(engine.load_from_fragment("").is_empty());
        assert!(engine.load_from_fragment("#").is_empty());
        assert_eq!(engine.values(), vec![5, 6]);
    }

    #[test]
    fn load_coerces_entries() {
        let mut engine = ValueSyncEngine::with_values(3, &[5, 6, 7]);
        engine.load_from_fragment("#300,x,");
        assert_eq!(engine.values(), vec![255, 0, 0]);
    }

    #[test]
    fn load_of_own_serialization_changes_nothing() {
        let mut engine = ValueSyncEngine::with_values(4, &[0, 17, 128, 255]);
        let fragment = engine.serialize_to_fragment();
        assert!(engine.load_from_fragment(&fragment).is_empty());
        assert_eq!(engine.values(), vec![0, 17, 128, 255]);
    }

    #[test]
    fn load_twice_is_idempotent() {
        let mut engine = ValueSyncEngine::new(2);
        assert_eq!(engine.load_from_fragment("9,300").len(), 2);
        let after_once = engine.values();
        assert!(engine.load_from_fragment("9,300").is_empty());
        assert_eq!(engine.values(), after_once);
    }

    #[test]
    fn display_toggle_leaves_values_and_bits() {
        let mut engine = ValueSyncEngine::with_values(2, &[5, 200]);
        let before: Vec<BitVector> = engine.row_views().iter().map(|r| r.bits).collect();
        assert_eq!(engine.toggle_display_mode(), DisplayMode::Bits);
        let after: Vec<BitVector> = engine.row_views().iter().map(|r| r.bits).collect();
        assert_eq!(before, after);
        assert_eq!(engine.values(), vec![5, 200]);
        assert_eq!(engine.row_view(0).unwrap().cells[5].label, Some('1'));
        assert_eq!(engine.toggle_display_mode(), DisplayMode::Pattern);
        assert_eq!(engine.row_view(0).unwrap().cells[5].label, None);
    }

    #[test]
    fn set_display_mode_reports_change() {
        let mut engine = ValueSyncEngine::new(1);
        assert!(!engine.set_display_mode(DisplayMode::Pattern));
        assert!(engine.set_display_mode(DisplayMode::Bits));
        assert!(engine.display_mode().shows_bits());
    }
}
