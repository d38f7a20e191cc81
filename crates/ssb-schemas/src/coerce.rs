//! Lenient numeric coercion.
//!
//! Store records are untyped: a quantity can arrive as a JSON number, a
//! numeric string, `null`, or garbage. Nothing here ever fails. Parsing falls
//! back to a default and clamping is applied by the caller at the point of use
//! through the `non_negative_*` / `lot_size` helpers.
//!
//! The `de` submodule exposes the same rules as serde field deserializers so
//! record types decode the same way everywhere.

use serde_json::Value;

/// Lot size used when a product carries no usable `qte_par_lot`.
pub const DEFAULT_LOT_SIZE: u64 = 1;

/// Lot size used for a zone's own conversions when its snapshot is unusable.
pub const DEFAULT_ZONE_LOT_SIZE: u64 = 20;

/// Parse a decimal; anything non-numeric or non-finite becomes `0.0`.
pub fn decimal(v: &Value) -> f64 {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(x) if x.is_finite() => x,
        _ => 0.0,
    }
}

/// Parse an integer the way a form field is read: fractional values truncate,
/// numeric strings are accepted, everything else becomes `0`.
pub fn integer(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|x| x.is_finite()).map(|x| x.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let t = s.trim();
            t.parse::<i64>()
                .ok()
                .or_else(|| {
                    t.parse::<f64>()
                        .ok()
                        .filter(|x| x.is_finite())
                        .map(|x| x.trunc() as i64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Parse a count input (lots, units): integer parse, then clamp to `>= 0`.
pub fn count(v: &Value) -> u64 {
    non_negative_int(integer(v))
}

/// Clamp a decimal to `>= 0`. NaN becomes `0.0`.
pub fn non_negative(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 {
        0.0
    } else {
        x
    }
}

/// Clamp an integer to `>= 0`.
pub fn non_negative_int(x: i64) -> u64 {
    if x < 0 {
        0
    } else {
        x as u64
    }
}

/// Round to the nearest integer and clamp to `>= 0`.
pub fn rounded_units(x: f64) -> u64 {
    let r = non_negative(x).round();
    if r >= u64::MAX as f64 {
        u64::MAX
    } else {
        r as u64
    }
}

/// Product lot size: anything below 1 falls back to [`DEFAULT_LOT_SIZE`].
pub fn lot_size(raw: i64) -> u64 {
    if raw < 1 {
        DEFAULT_LOT_SIZE
    } else {
        raw as u64
    }
}

/// Zone snapshot lot size: anything below 1 falls back to [`DEFAULT_ZONE_LOT_SIZE`].
pub fn zone_lot_size(raw: i64) -> u64 {
    if raw < 1 {
        DEFAULT_ZONE_LOT_SIZE
    } else {
        raw as u64
    }
}

/// Round to two decimals (display weights).
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Serde field deserializers applying the rules above.
pub mod de {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn decimal<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(super::decimal(&v))
    }

    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(super::integer(&v))
    }

    /// Strings pass through; numbers are rendered; everything else is empty.
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(match v {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    /// RFC 3339 timestamp; unparseable values become `None`.
    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(v.as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }
}
