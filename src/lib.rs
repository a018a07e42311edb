// pie_panel_core: Rust/WASM engine for the streaming pie chart panel.
// The host owns chrome, settings UI, and drawing; this crate owns path binding, colors, and wedges.

mod colormap;
mod error;
mod extract;
mod geometry;
mod panel;
mod path;
mod reducer;
mod types;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use colormap::{reverse_stops, sample_stops, turbo, ColorMapEngine};
pub use error::{PanelError, PathParseError};
pub use extract::extract_weights;
pub use geometry::{percentages, WedgeGeometry};
pub use panel::{PiePanel, TraceEvent, TraceHook};
pub use path::{Literal, MessagePathParser, Operand, ParsedPath, PathOp, PathParser, SliceBound};
pub use reducer::{Action, ReducerState, DYNAMIC_PATH_ERROR};
pub use types::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(err: PanelError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, PanelError> {
    Ok(serde_json::from_str(json)?)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, PanelError> {
    Ok(serde_json::to_string(value)?)
}

/// Panel interface exposed to JavaScript. JSON in, JSON out.
#[wasm_bindgen]
pub struct WasmPiePanel {
    inner: PiePanel,
}

#[wasm_bindgen]
impl WasmPiePanel {
    /// Create a panel from `{ config, geometry }`; both parts may be omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(init_json: &str) -> Result<WasmPiePanel, JsValue> {
        let init: PanelInit = from_json(init_json).map_err(js_error)?;
        let inner = PiePanel::new(init.config, init.geometry).map_err(js_error)?;
        Ok(WasmPiePanel { inner })
    }

    /// Replace the panel settings (persisted config shape).
    pub fn set_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        let config: PanelConfig = from_json(config_json).map_err(js_error)?;
        self.inner.set_config(config);
        Ok(())
    }

    /// Apply one render tick's messages, a JSON array of `{ topic, receiveTime, message }`.
    pub fn apply_frame(&mut self, messages_json: &str) -> Result<(), JsValue> {
        let messages: Vec<Message> = from_json(messages_json).map_err(js_error)?;
        self.inner.apply_frame(messages);
        Ok(())
    }

    /// Playback discontinuity.
    pub fn seek(&mut self) {
        self.inner.seek();
    }

    /// Render model as JSON.
    pub fn render(&self) -> Result<String, JsValue> {
        to_json(&self.inner.render()).map_err(js_error)
    }

    /// Color stops of the current config as JSON, for the legend.
    pub fn color_stops(&self) -> Result<String, JsValue> {
        to_json(&self.inner.color_stops()).map_err(js_error)
    }

    /// Topic to subscribe to, if the path names one.
    pub fn subscribed_topic(&self) -> Option<String> {
        self.inner.subscribed_topic().map(str::to_string)
    }

    /// Forward trace events to `callback` as JSON strings.
    pub fn set_trace_hook(&mut self, callback: js_sys::Function) {
        self.inner.set_trace_hook(Box::new(move |event: &TraceEvent| {
            if let Ok(json) = to_json(event) {
                let _ = callback.call1(&JsValue::NULL, &JsValue::from_str(&json));
            }
        }));
    }

    pub fn clear_trace_hook(&mut self) {
        self.inner.clear_trace_hook();
    }
}
