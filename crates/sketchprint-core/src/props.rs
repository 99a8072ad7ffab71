//! Property normalization for loosely typed shape records.
//!
//! Incoming records come from clients as JSON objects. Numeric and color
//! fields are never rejected: each helper here falls back to the field's
//! default when the value is missing, malformed or out of range. Only the
//! shape constructors decide what is truly required.

use crate::shapes::SerializableColor;
use kurbo::Point;
use serde_json::{Map, Value};
use std::str::FromStr;

/// A flat, loosely typed record of shape properties (camelCase keys).
pub type PropertyBag = Map<String, Value>;

/// Named colors accepted wherever a hex color is expected.
pub const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#FFFFFF"),
    ("red", "#FF0000"),
    ("green", "#008000"),
    ("blue", "#0000FF"),
    ("yellow", "#FFFF00"),
    ("orange", "#FFA500"),
    ("purple", "#800080"),
    ("pink", "#FFC0CB"),
    ("gray", "#808080"),
    ("grey", "#808080"),
];

/// Read a finite number. Numeric strings such as `"12.5"` are accepted.
pub fn number(bag: &PropertyBag, key: &str) -> Option<f64> {
    let value = match bag.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Any finite number, or `default`.
pub fn number_or(bag: &PropertyBag, key: &str, default: f64) -> f64 {
    number(bag, key).unwrap_or(default)
}

/// A strictly positive number, or `default`.
pub fn positive_or(bag: &PropertyBag, key: &str, default: f64) -> f64 {
    number(bag, key).filter(|v| *v > 0.0).unwrap_or(default)
}

/// A number `>= 0`, or `default`.
pub fn non_negative_or(bag: &PropertyBag, key: &str, default: f64) -> f64 {
    number(bag, key).filter(|v| *v >= 0.0).unwrap_or(default)
}

/// A number clamped into `[min, max]`, or `default` when absent or malformed.
pub fn clamped_or(bag: &PropertyBag, key: &str, default: f64, min: f64, max: f64) -> f64 {
    number(bag, key).map_or(default, |v| v.clamp(min, max))
}

/// An integer count rounded from the input and clamped into `[min, max]`.
pub fn count_or(bag: &PropertyBag, key: &str, default: u32, min: u32, max: u32) -> u32 {
    number(bag, key).map_or(default, |v| v.round().clamp(min as f64, max as f64) as u32)
}

/// A color given as hex (`#rgb`, `#rrggbb`, `#rrggbbaa`) or a named color.
pub fn color_or(bag: &PropertyBag, key: &str, default: SerializableColor) -> SerializableColor {
    bag.get(key)
        .and_then(Value::as_str)
        .and_then(parse_color)
        .unwrap_or(default)
}

/// Parse a hex or named color.
pub fn parse_color(value: &str) -> Option<SerializableColor> {
    let value = value.trim();
    if value.starts_with('#') {
        return SerializableColor::from_hex(value);
    }
    let lower = value.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .and_then(|(_, hex)| SerializableColor::from_hex(hex))
}

/// A string value, without trimming.
pub fn string(bag: &PropertyBag, key: &str) -> Option<String> {
    bag.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// A non-empty string, or `default`.
pub fn string_or(bag: &PropertyBag, key: &str, default: &str) -> String {
    string(bag, key)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// A boolean. Accepts JSON booleans and the strings `"true"`/`"false"`.
pub fn bool_or(bag: &PropertyBag, key: &str, default: bool) -> bool {
    match bag.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim() {
            "true" => true,
            "false" => false,
            _ => default,
        },
        _ => default,
    }
}

/// A string-encoded enum value, or `default` when it does not parse.
pub fn enum_or<T: FromStr>(bag: &PropertyBag, key: &str, default: T) -> T {
    bag.get(key)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// A list of `{x, y}` points. Entries with missing or non-numeric
/// coordinates are skipped.
pub fn points(bag: &PropertyBag, key: &str) -> Option<Vec<Point>> {
    let items = bag.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|p| Some(Point::new(number(p, "x")?, number(p, "y")?)))
            .collect(),
    )
}

/// A dash pattern: finite, non-negative lengths. Anything else is dropped.
pub fn dash_pattern(bag: &PropertyBag, key: &str) -> Vec<f64> {
    let Some(items) = bag.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_f64)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .collect()
}

/// Serialize a point list the way [`points`] reads it.
pub fn points_value(points: &[Point]) -> Value {
    Value::Array(
        points
            .iter()
            .map(|p| serde_json::json!({ "x": p.x, "y": p.y }))
            .collect(),
    )
}

/// Merge `updates` into `base`, overwriting existing keys.
pub fn merge(base: &mut PropertyBag, updates: &PropertyBag) {
    for (key, value) in updates {
        base.insert(key.clone(), value.clone());
    }
}
