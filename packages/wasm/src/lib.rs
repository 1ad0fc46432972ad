use raqam_dom::{Document, NodeSnapshot};
use raqam_engine::{to_persian_digits, Activation, Bootstrapper, EngineConfig};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Converted snapshot plus pass counters, as returned to JavaScript
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertOutput {
    snapshot: NodeSnapshot,
    visited: usize,
    converted: usize,
}

/// Rewrite every Western digit in `text` to its Persian form
#[wasm_bindgen(js_name = toPersianDigits)]
pub fn to_persian_digits_js(text: &str) -> String {
    to_persian_digits(text).into_owned()
}

/// Convert a JSON document snapshot; `config_json` uses the
/// raqam.config.json format and defaults apply when it is absent
#[wasm_bindgen(js_name = convertSnapshot)]
pub fn convert_snapshot_js(snapshot_json: &str, config_json: Option<String>) -> Result<String, JsValue> {
    convert_snapshot(snapshot_json, config_json.as_deref()).map_err(|e| JsValue::from_str(&e))
}

fn convert_snapshot(snapshot_json: &str, config_json: Option<&str>) -> Result<String, String> {
    let config = match config_json {
        Some(json) => serde_json::from_str::<EngineConfig>(json)
            .map_err(|e| format!("Config error: {}", e))?,
        None => EngineConfig::default(),
    };

    let snapshot: NodeSnapshot =
        serde_json::from_str(snapshot_json).map_err(|e| format!("Snapshot error: {}", e))?;
    let mut doc = Document::from_snapshot(&snapshot).map_err(|e| format!("Document error: {}", e))?;

    let stats = match Bootstrapper::new(&config, None).start(&mut doc) {
        Activation::Static(stats) | Activation::Live(stats) => stats,
        Activation::Deferred => return Err("Document never finished loading".to_string()),
    };

    let output = ConvertOutput {
        snapshot: doc.snapshot(),
        visited: stats.visited,
        converted: stats.converted,
    };
    serde_json::to_string(&output).map_err(|e| format!("Serialization error: {}", e))
}
