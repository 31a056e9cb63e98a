use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use bytebits::config::WidgetConfig;
use bytebits::error::ConfigError;
use bytebits::session::{Event, Host, Session};
use bytebits::value::{self, RawValue};
use bytebits::{RowView, ValueSyncEngine};

// ── Tsify types for TypeScript interface generation ──

/// One row, ready to be painted into the bit boxes of the page.
#[derive(Tsify, Serialize, Deserialize)]
#[tsify(into_wasm_abi)]
pub struct WasmRowView {
    pub index: usize,
    pub value: u8,
    /// On/off state of each box, most significant bit first.
    pub active: Vec<bool>,
    /// Text for each box: `"0"`/`"1"` when bits are shown, empty otherwise.
    pub labels: Vec<String>,
}

// ── Host bridging to JavaScript callbacks ──

struct JsHost {
    on_render: js_sys::Function,
    on_fragment: js_sys::Function,
}

impl Host for JsHost {
    type Error = JsValue;

    fn render_row(&mut self, row: &RowView) -> Result<(), JsValue> {
        let view = serde_wasm_bindgen::to_value(&row_to_wasm(row))?;
        self.on_render.call1(&JsValue::NULL, &view)?;
        Ok(())
    }

    fn write_fragment(&mut self, fragment: &str) -> Result<bool, JsValue> {
        self.on_fragment
            .call1(&JsValue::NULL, &JsValue::from_str(fragment))?;
        // The browser raises `hashchange` on a later turn of its event loop;
        // the page forwards it through `hashChanged`.
        Ok(false)
    }
}

// ── Widget wrapper ──

/// Byte/bit widget state for use from JavaScript/TypeScript.
#[wasm_bindgen]
pub struct Widget {
    inner: Session<JsHost>,
}

#[wasm_bindgen]
impl Widget {
    /// Create a widget with `rows` registers.
    ///
    /// `values`, when given, is an array holding each numeric field's
    /// current content (numbers or strings), coerced like any edit; rows
    /// past its end start at zero. Seeding does not touch the fragment.
    ///
    /// `on_render(row)` is called with a `WasmRowView` whenever a row needs
    /// repainting; `on_fragment(text)` whenever the address-bar fragment
    /// should be replaced.
    #[wasm_bindgen(constructor)]
    pub fn new(
        rows: usize,
        on_render: js_sys::Function,
        on_fragment: js_sys::Function,
        values: JsValue,
    ) -> Result<Widget, JsError> {
        console_error_panic_hook::set_once();

        let seeds: Vec<u8> = if values.is_undefined() || values.is_null() {
            Vec::new()
        } else {
            js_sys::Array::from(&values).iter().map(coerce_value).collect()
        };
        let engine = seeded_engine(rows, &seeds).map_err(|e| JsError::new(&e.to_string()))?;

        Ok(Widget {
            inner: Session::new(
                engine,
                JsHost {
                    on_render,
                    on_fragment,
                },
            ),
        })
    }

    /// Paint every row and apply the page's current fragment, if any.
    pub fn start(&mut self, fragment: Option<String>) -> Result<(), JsValue> {
        self.inner.start(fragment.as_deref())?;
        Ok(())
    }

    /// A numeric field now holds `text`.
    #[wasm_bindgen(js_name = "fieldEdited")]
    pub fn field_edited(&mut self, row: usize, text: String) -> Result<(), JsValue> {
        self.inner.dispatch(Event::FieldEdited { row, text })?;
        Ok(())
    }

    /// Bit box `bit` (0 = leftmost, weight 128) of `row` was clicked.
    #[wasm_bindgen(js_name = "bitClicked")]
    pub fn bit_clicked(&mut self, row: usize, bit: usize) -> Result<(), JsValue> {
        self.inner.dispatch(Event::BitClicked { row, bit })?;
        Ok(())
    }

    /// The display toggle was clicked. Repaints every row.
    #[wasm_bindgen(js_name = "toggleDisplay")]
    pub fn toggle_display(&mut self) -> Result<(), JsValue> {
        self.inner.dispatch(Event::DisplayToggled)?;
        Ok(())
    }

    /// Forward the browser's `hashchange` with the new fragment text.
    #[wasm_bindgen(js_name = "hashChanged")]
    pub fn hash_changed(&mut self, fragment: String) -> Result<(), JsValue> {
        self.inner.dispatch(Event::FragmentChanged(fragment))?;
        Ok(())
    }

    /// The fragment for the current values, without a leading `#`.
    #[wasm_bindgen(getter)]
    pub fn fragment(&self) -> String {
        self.inner.engine().serialize_to_fragment()
    }

    #[wasm_bindgen(getter)]
    pub fn values(&self) -> Vec<u8> {
        self.inner.engine().values()
    }

    #[wasm_bindgen(getter, js_name = "showBits")]
    pub fn show_bits(&self) -> bool {
        self.inner.engine().display_mode().shows_bits()
    }

    /// Caption for the display toggle in the current mode.
    #[wasm_bindgen(getter, js_name = "buttonLabel")]
    pub fn button_label(&self) -> String {
        self.inner.engine().display_mode().button_label().to_string()
    }

    /// Snapshot of one row.
    pub fn row(&self, index: usize) -> Result<JsValue, JsError> {
        let view = self
            .inner
            .engine()
            .row_view(index)
            .ok_or_else(|| JsError::new(&format!("no row {index}")))?;
        serde_wasm_bindgen::to_value(&row_to_wasm(&view)).map_err(|e| JsError::new(&e.to_string()))
    }
}

/// Coerce any JS value the way a numeric field would: numbers truncate,
/// strings parse their leading integer, everything else is 0; the result
/// is clamped to a byte.
#[wasm_bindgen(js_name = "coerceValue")]
pub fn coerce_value(raw: JsValue) -> u8 {
    coerce_field(raw.as_f64(), raw.as_string().as_deref())
}

/// Coercion once the JS value has been split into its number or string form.
fn coerce_field(number: Option<f64>, text: Option<&str>) -> u8 {
    match (number, text) {
        (Some(n), _) => value::coerce(RawValue::Float(n)),
        (None, Some(s)) => value::coerce(s),
        (None, None) => 0,
    }
}

/// Engine for `rows` registers seeded from already-coerced field values.
fn seeded_engine(rows: usize, seeds: &[u8]) -> Result<ValueSyncEngine, ConfigError> {
    let config = WidgetConfig {
        rows,
        values: seeds.iter().map(|&v| i64::from(v)).collect(),
        show_bits: false,
    };
    config.into_engine()
}

/// Bits of `value`, most significant first, as `"00000101"`.
#[wasm_bindgen(js_name = "toBinary")]
pub fn to_binary(value: u8) -> String {
    bytebits::BitVector::from_value(value).to_string()
}

fn row_to_wasm(row: &RowView) -> WasmRowView {
    WasmRowView {
        index: row.index,
        value: row.value,
        active: row.cells.iter().map(|c| c.active).collect(),
        labels: row
            .cells
            .iter()
            .map(|c| c.label.map(String::from).unwrap_or_default())
            .collect(),
    }
}
