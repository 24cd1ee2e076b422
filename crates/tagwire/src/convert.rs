//! Mapping between JSON and wire values for the command line.

use serde_json::{json, Map, Number};
use tagwire_codec::{ArrayData, Complex, NdArray, Value};

use crate::exit::{CliError, CliResult, DATA_INVALID};

/// Build a value from JSON.
///
/// Integers that fit the `int` codec become `Int`, other integers
/// `SignedInt`. Arrays become lists; `{"re": x, "im": y}` is a complex number.
pub fn json_to_value(json: &serde_json::Value) -> CliResult<Value> {
    match json {
        serde_json::Value::String(text) => Ok(Value::from(text.as_str())),
        serde_json::Value::Bool(flag) => Ok(Value::Bool(*flag)),
        serde_json::Value::Number(number) => number_to_value(number),
        serde_json::Value::Array(items) => items
            .iter()
            .map(json_to_value)
            .collect::<CliResult<Vec<_>>>()
            .map(Value::List),
        serde_json::Value::Object(fields) => complex_from_object(fields),
        serde_json::Value::Null => Err(CliError::new(DATA_INVALID, "null has no wire type")),
    }
}

fn number_to_value(number: &Number) -> CliResult<Value> {
    if let Some(n) = number.as_u64() {
        if let Ok(small) = u32::try_from(n) {
            return Ok(Value::from(small));
        }
        return i64::try_from(n)
            .map(Value::SignedInt)
            .map_err(|_| CliError::new(DATA_INVALID, format!("integer {n} exceeds 64 bits")));
    }
    if let Some(n) = number.as_i64() {
        return Ok(Value::SignedInt(n));
    }
    number
        .as_f64()
        .map(Value::Float)
        .ok_or_else(|| CliError::new(DATA_INVALID, format!("unsupported number {number}")))
}

fn complex_from_object(fields: &Map<String, serde_json::Value>) -> CliResult<Value> {
    let part = |name: &str| fields.get(name).and_then(serde_json::Value::as_f64);
    match (part("re"), part("im"), fields.len()) {
        (Some(re), Some(im), 2) => Ok(Value::Complex(Complex::new(re, im))),
        _ => Err(CliError::new(
            DATA_INVALID,
            "only {\"re\": x, \"im\": y} objects are supported",
        )),
    }
}

/// Render a value as JSON for output.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Str(text) => json!(text),
        Value::Bytes(data) => json!({ "bytes": hex(data) }),
        Value::Int(n) | Value::SignedInt(n) => json!(n),
        Value::Float(x) => float(*x),
        Value::Complex(c) => json!({ "re": float(c.re), "im": float(c.im) }),
        Value::Bool(flag) => json!(flag),
        Value::NdArray(array) => array_to_json(array),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Custom(custom) => json!({ "custom": format!("{custom:?}") }),
    }
}

fn array_to_json(array: &NdArray) -> serde_json::Value {
    let data: Vec<serde_json::Value> = match array.data() {
        ArrayData::Bool(v) => v.iter().map(|x| json!(x)).collect(),
        ArrayData::Int8(v) => v.iter().map(|x| json!(x)).collect(),
        ArrayData::Int16(v) => v.iter().map(|x| json!(x)).collect(),
        ArrayData::Int32(v) => v.iter().map(|x| json!(x)).collect(),
        ArrayData::Int64(v) => v.iter().map(|x| json!(x)).collect(),
        ArrayData::UInt8(v) => v.iter().map(|x| json!(x)).collect(),
        ArrayData::UInt16(v) => v.iter().map(|x| json!(x)).collect(),
        ArrayData::UInt32(v) => v.iter().map(|x| json!(x)).collect(),
        ArrayData::UInt64(v) => v.iter().map(|x| json!(x)).collect(),
        ArrayData::Float32(v) => v.iter().map(|&x| float(f64::from(x))).collect(),
        ArrayData::Float64(v) => v.iter().map(|&x| float(x)).collect(),
        ArrayData::Complex64(v) => v
            .iter()
            .map(|c| json!({ "re": float(f64::from(c.re)), "im": float(f64::from(c.im)) }))
            .collect(),
        ArrayData::Complex128(v) => v
            .iter()
            .map(|c| json!({ "re": float(c.re), "im": float(c.im) }))
            .collect(),
    };
    json!({
        "dtype": array.dtype().name(),
        "shape": array.shape(),
        "data": data,
    })
}

/// Non-finite floats have no JSON form and render as null.
fn float(x: f64) -> serde_json::Value {
    Number::from_f64(x).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}
