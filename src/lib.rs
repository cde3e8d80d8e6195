pub mod correlation;
pub mod encoder;
pub mod error;
pub mod fix;
pub mod http;
pub mod multipart;
pub mod network_log;
pub mod options;
pub mod parser;
#[cfg(not(target_arch = "wasm32"))]
pub mod reqwest_transport;
pub mod uploader;
pub mod waypoint;

use wasm_bindgen::prelude::*;

pub use crate::correlation::{CorrelationId, CorrelationIdGenerator};
pub use crate::error::{GpxError, TransportError, UploadError};
pub use crate::options::{EncodeOptions, UploadLocation, UploadOptions};
pub use crate::uploader::{UploadResponse, Uploader};
pub use crate::waypoint::Waypoint;

/// Encode an array of waypoint objects into a GPX string.
#[wasm_bindgen(js_name = encodeGpx)]
pub fn encode_gpx(waypoints: JsValue, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let waypoints: Vec<Waypoint> =
        serde_wasm_bindgen::from_value(waypoints).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(encoder::encode_with(&waypoints, &opts))
}

/// Decode a GPX string into waypoint objects. Malformed input yields an empty array.
#[wasm_bindgen(js_name = decodeGpx)]
pub fn decode_gpx(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let waypoints = parser::decode_str(gpx_string);
    serde_wasm_bindgen::to_value(&waypoints).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Decode a GPX string into waypoint objects, throwing on malformed input.
#[wasm_bindgen(js_name = decodeGpxStrict)]
pub fn decode_gpx_strict(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let waypoints = parser::decode_strict(gpx_string.as_bytes())?;
    serde_wasm_bindgen::to_value(&waypoints).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_options(options: JsValue) -> Result<EncodeOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(EncodeOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
