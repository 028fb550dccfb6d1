//! JSON helpers: nested lookup, key filtering and display-friendly encoding

use chrono::TimeDelta;
use serde_json::{Map, Value};

/// Look up a dotted path (`"a.b.c"`) through nested objects.
///
/// Returns `None` when any key is missing, a non-object is hit on the way,
/// or the final value is `null`.
pub fn deep_get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let keys: Vec<&str> = path.split('.').collect();
    deep_get_keys(value, &keys)
}

/// Same as [`deep_get`] with the path already split into keys
pub fn deep_get_keys<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    if keys.is_empty() {
        return None;
    }
    let mut current = value;
    for key in keys {
        current = current.as_object()?.get(*key)?;
    }
    (!current.is_null()).then_some(current)
}

/// Drop (or mask) every entry whose key contains `keyword`
pub fn exclude_keyword(data: &Map<String, Value>, keyword: &str, mask: Option<&Value>) -> Map<String, Value> {
    if keyword.is_empty() {
        return data.clone();
    }
    filter_or_mask(data, |k| k.contains(keyword), mask)
}

/// Drop (or mask) every entry whose key is in `keys`
pub fn exclude_keys(data: &Map<String, Value>, keys: &[&str], mask: Option<&Value>) -> Map<String, Value> {
    if keys.is_empty() {
        return data.clone();
    }
    filter_or_mask(data, |k| keys.contains(&k), mask)
}

/// Keep only entries whose key contains `keyword`
pub fn reserve_keyword(data: &Map<String, Value>, keyword: &str) -> Map<String, Value> {
    if keyword.is_empty() {
        return data.clone();
    }
    filter_or_mask(data, |k| !k.contains(keyword), None)
}

/// Keep only entries whose key is in `keys`
pub fn reserve_keys(data: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    if keys.is_empty() {
        return data.clone();
    }
    filter_or_mask(data, |k| !keys.contains(&k), None)
}

fn filter_or_mask<F>(data: &Map<String, Value>, hit: F, mask: Option<&Value>) -> Map<String, Value>
where
    F: Fn(&str) -> bool,
{
    data.iter()
        .filter_map(|(k, v)| match (hit(k), mask) {
            (false, _) => Some((k.clone(), v.clone())),
            (true, Some(mask)) => Some((k.clone(), mask.clone())),
            (true, None) => None,
        })
        .collect()
}

/// Round every float in `value` to `places` decimals, recursively.
/// Integers are left alone.
pub fn round_floats(value: &mut Value, places: u32) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(f) = n.as_f64() {
                let factor = 10f64.powi(places as i32);
                if let Some(rounded) = serde_json::Number::from_f64((f * factor).round() / factor) {
                    *n = rounded;
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| round_floats(v, places)),
        Value::Object(map) => map.values_mut().for_each(|v| round_floats(v, places)),
        _ => {}
    }
}

/// Format a duration as `hh:mm:ss.SSS`; hours may exceed 24 and negative
/// durations get a leading `-`.
pub fn format_timedelta(delta: TimeDelta) -> String {
    let millis = delta.num_milliseconds();
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.unsigned_abs();
    let (secs, ms) = (millis / 1000, millis % 1000);
    format!(
        "{}{:02}:{:02}:{:02}.{:03}",
        sign,
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        ms
    )
}

/// Serialize a `NaiveDateTime` as `%Y-%m-%d %H:%M:%S`
pub mod datetime_format {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Serialize a `TimeDelta` as `hh:mm:ss.SSS`
pub mod timedelta_format {
    use chrono::TimeDelta;
    use serde::Serializer;

    pub fn serialize<S>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timedelta(*value))
    }
}
