use schemars::JsonSchema;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Activity IDs are numeric on Garmin's side but often arrive as strings.
/// Both forms are accepted; string input is forwarded untouched. Numbers must
/// be whole (`12345.0` is read as `12345`).
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum ActivityId {
    Int(i64),
    Str(String),
}

impl ActivityId {
    pub fn as_cow(&self) -> Cow<'_, str> {
        match self {
            ActivityId::Int(v) => Cow::Owned(v.to_string()),
            ActivityId::Str(s) => Cow::Borrowed(s),
        }
    }
}

impl<'de> Deserialize<'de> for ActivityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = ActivityId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer activity id or a string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ActivityId, E> {
                Ok(ActivityId::Int(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ActivityId, E> {
                i64::try_from(v)
                    .map(ActivityId::Int)
                    .map_err(|_| E::custom(format!("activity_id {v} is out of range")))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<ActivityId, E> {
                // 2^53: beyond this an f64 no longer holds every integer
                if v.is_finite() && v.fract() == 0.0 && v.abs() <= 9_007_199_254_740_992.0 {
                    Ok(ActivityId::Int(v as i64))
                } else {
                    Err(E::custom(format!(
                        "activity_id must be an integer or a string, got {v}"
                    )))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ActivityId, E> {
                Ok(ActivityId::Str(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<ActivityId, E> {
                Ok(ActivityId::Str(v))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

impl From<&str> for ActivityId {
    fn from(s: &str) -> Self {
        ActivityId::Str(s.to_owned())
    }
}
