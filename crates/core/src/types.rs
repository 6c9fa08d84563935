use serde::{Deserialize, Deserializer};

/// Backend primary keys are integers.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Wire representation of an id that may be sent as a number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(DbId),
    Text(String),
}

/// Deserialize a [`DbId`] that the backend sometimes sends as `"42"`.
pub fn deserialize_flexible_id<'de, D>(deserializer: D) -> Result<DbId, D::Error>
where
    D: Deserializer<'de>,
{
    match IdRepr::deserialize(deserializer)? {
        IdRepr::Number(id) => Ok(id),
        IdRepr::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {text:?}"))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Number(f64),
    Text(String),
}

/// Deserialize an optional decimal that may be encoded as a JSON string
/// (PostgreSQL `NUMERIC` columns serialize that way).
pub fn deserialize_flexible_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<DecimalRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(DecimalRepr::Number(value)) => Ok(Some(value)),
        Some(DecimalRepr::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid decimal: {text:?}"))),
    }
}
