// Lenient deserializers for values the visual editor may store as text

use crate::value::{display_string, strict_number};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Accept a string, number or bool and keep its string form; null → ""
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        other => display_string(&other),
    })
}

/// Accept a number or numeric string; anything else (including "") → None
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(strict_number))
}

/// Like [`opt_f64`] but only keeps whole numbers
pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_f64(deserializer)?
        .filter(|f| f.fract() == 0.0)
        .map(|f| f as i64))
}

/// Column number lists; non-numeric entries are dropped
pub fn int_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .iter()
        .filter_map(strict_number)
        .filter(|f| f.fract() == 0.0)
        .map(|f| f as i64)
        .collect())
}

/// Any value; falls back to `T::default()` when it does not fit the type
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(or_default(Value::deserialize(deserializer)?))
}

/// `column_count`: a whole number or numeric string; anything else is 1
pub fn column_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    // Out-of-range numbers are kept so validation can report them
    Ok(opt_i64(deserializer)?
        .map(|n| n.max(0) as usize)
        .unwrap_or(1))
}

/// List whose malformed entries become `T::default()`, keeping positions
pub fn list_or_default<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let items = list_items(Value::deserialize(deserializer)?);
    Ok(items.into_iter().map(or_default).collect())
}

/// List whose malformed entries are dropped
pub fn list_skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = list_items(Value::deserialize(deserializer)?);
    Ok(items
        .into_iter()
        .filter_map(|item| match T::deserialize(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(error = %e, "Dropping malformed list entry");
                None
            }
        })
        .collect())
}

fn list_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            debug!(value = %other, "Expected a list, ignoring");
            Vec::new()
        }
    }
}

fn or_default<T>(value: Value) -> T
where
    T: DeserializeOwned + Default,
{
    T::deserialize(value).unwrap_or_else(|e| {
        debug!(error = %e, "Malformed card field, using default");
        T::default()
    })
}
