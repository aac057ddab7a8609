//! JSON rendering of results.

use common_error::QuarryResult;
use quarry_core::HostValue;
use quarry_engine::Engine;
use serde_json::{json, Value};

/// Render a value as JSON text.
pub fn render(value: &HostValue, pretty: bool) -> QuarryResult<String> {
    let json = value.to_json();
    let text = if pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    Ok(text)
}

/// Identification and top-level layout of an open product.
pub fn product_info(engine: &Engine, product_id: i64) -> QuarryResult<Value> {
    let start = [HostValue::from(product_id)];
    let fields = engine.field_names(&start)?.to_json();
    Ok(json!({
        "class": engine.product_class(product_id)?,
        "type": engine.product_type(product_id)?,
        "version": engine.product_version(product_id)?,
        "fields": fields,
    }))
}
