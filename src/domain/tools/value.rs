//! Tool result values and their canonical JSON form.
//!
//! Tool handlers return loosely shaped data: rows of ERP records, scalar
//! aggregates, dates, monetary amounts. Before any result re-enters the
//! conversation it is normalized into this closed sum type and rendered by
//! exactly one serialization rule per variant, so the model always sees the
//! same shape for the same kind of data.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// A normalized tool result value.
///
/// Canonical JSON rules:
/// - `Decimal` renders as fixed-point text (`"123.45"`), never a float
/// - `Timestamp` renders as RFC 3339 text
/// - `Duration` renders as ISO-8601 duration text (`"PT2H30M"`)
/// - `Map` preserves insertion order
#[derive(Debug, Clone, PartialEq)]
pub enum ToolValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// Exact decimal: `unscaled * 10^-scale`.
    Decimal { unscaled: i64, scale: u32 },
    Text(String),
    Timestamp(DateTime<Utc>),
    Duration(Duration),
    List(Vec<ToolValue>),
    Map(Vec<(String, ToolValue)>),
}

impl ToolValue {
    /// Creates a text value.
    pub fn text(value: impl Into<String>) -> Self {
        ToolValue::Text(value.into())
    }

    /// Creates an exact decimal value, e.g. `decimal(12345, 2)` for 123.45.
    pub fn decimal(unscaled: i64, scale: u32) -> Self {
        ToolValue::Decimal { unscaled, scale }
    }

    /// Normalizes a float into an exact decimal (or integer when whole).
    ///
    /// Scans scales 0..=9 for the shortest fixed-point representation that
    /// round-trips; falls back to scale 9 for pathological values.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return ToolValue::text(value.to_string());
        }
        for scale in 0..=9u32 {
            let factor = 10f64.powi(scale as i32);
            let scaled = value * factor;
            if scaled.abs() < i64::MAX as f64 && (scaled.round() - scaled).abs() < 1e-9 {
                let unscaled = scaled.round() as i64;
                if scale == 0 {
                    return ToolValue::Integer(unscaled);
                }
                return ToolValue::Decimal { unscaled, scale };
            }
        }
        ToolValue::Decimal {
            unscaled: (value * 1e9).round() as i64,
            scale: 9,
        }
    }

    /// Normalizes an arbitrary JSON payload from a handler.
    ///
    /// Object key order is preserved; floats become exact decimals.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => ToolValue::Null,
            Value::Bool(b) => ToolValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ToolValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    ToolValue::from_f64(f)
                } else {
                    // u64 beyond i64 range
                    ToolValue::text(n.to_string())
                }
            }
            Value::String(s) => ToolValue::Text(s),
            Value::Array(items) => {
                ToolValue::List(items.into_iter().map(ToolValue::from_json).collect())
            }
            Value::Object(entries) => ToolValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, ToolValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Renders the canonical JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            ToolValue::Null => Value::Null,
            ToolValue::Bool(b) => Value::Bool(*b),
            ToolValue::Integer(i) => Value::from(*i),
            ToolValue::Decimal { unscaled, scale } => {
                if *scale == 0 {
                    Value::from(*unscaled)
                } else {
                    Value::String(decimal_text(*unscaled, *scale))
                }
            }
            ToolValue::Text(s) => Value::String(s.clone()),
            ToolValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            }
            ToolValue::Duration(d) => Value::String(duration_text(*d)),
            ToolValue::List(items) => {
                Value::Array(items.iter().map(ToolValue::to_json).collect())
            }
            ToolValue::Map(entries) => {
                let mut object = serde_json::Map::with_capacity(entries.len());
                for (key, value) in entries {
                    object.insert(key.clone(), value.to_json());
                }
                Value::Object(object)
            }
        }
    }

    /// Canonical JSON rendered as a string, as embedded in tool messages.
    pub fn to_canonical_string(&self) -> String {
        self.to_json().to_string()
    }
}

/// Fixed-point text for `unscaled * 10^-scale`.
fn decimal_text(unscaled: i64, scale: u32) -> String {
    if scale == 0 {
        return unscaled.to_string();
    }
    let sign = if unscaled < 0 { "-" } else { "" };
    let magnitude = unscaled.unsigned_abs();
    let divisor = 10u64.pow(scale);
    let whole = magnitude / divisor;
    let fraction = magnitude % divisor;
    format!("{sign}{whole}.{fraction:0width$}", width = scale as usize)
}

/// ISO-8601 duration text, hour resolution at most.
fn duration_text(duration: Duration) -> String {
    let total_seconds = duration.num_seconds();
    if total_seconds == 0 {
        return "PT0S".to_string();
    }
    let sign = if total_seconds < 0 { "-" } else { "" };
    let mut remainder = total_seconds.unsigned_abs();
    let hours = remainder / 3600;
    remainder %= 3600;
    let minutes = remainder / 60;
    let seconds = remainder % 60;

    let mut text = format!("{sign}PT");
    if hours > 0 {
        text.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        text.push_str(&format!("{minutes}M"));
    }
    if seconds > 0 {
        text.push_str(&format!("{seconds}S"));
    }
    text
}
