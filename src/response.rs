//! Shared handling of API responses

use crate::error::{self, Error};
use serde::de::DeserializeOwned;

/// Splits off the body of a successful response, or classifies the failure
pub(crate) fn success_body<S>(response: http::Response<S>) -> Result<S, Error>
where
    S: AsRef<[u8]>,
{
    let (parts, body) = response.into_parts();

    if !parts.status.is_success() {
        tracing::debug!(status = %parts.status, "request failed");
        return Err(error::status_error(parts.status, body.as_ref()));
    }

    Ok(body)
}

/// Deserializes a JSON array where every element must be an object.
///
/// Going through `Map` first means an element that happens to be an array
/// isn't silently accepted as a positional struct.
pub(crate) fn object_array<T>(body: &[u8]) -> Result<Vec<T>, Error>
where
    T: DeserializeOwned,
{
    let objects: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_slice(body)?;

    objects
        .into_iter()
        .map(|obj| serde_json::from_value(serde_json::Value::Object(obj)).map_err(Error::from))
        .collect()
}

/// Deserializes a single JSON object
pub(crate) fn object<T>(body: &[u8]) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let obj: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(body)?;
    Ok(serde_json::from_value(serde_json::Value::Object(obj))?)
}

/// Treats a JSON `null` the same as a missing field
pub(crate) fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts a size as an integer, a whole float, or a numeric string. Anything
/// else becomes `None` rather than failing the whole listing.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
