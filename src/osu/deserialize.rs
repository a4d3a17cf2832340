//! The v1 API sends every number as a (nullable) string.

use std::str::FromStr;

use serde::de::{Error, Unexpected};
use serde::{Deserialize, Deserializer};

use super::RankStatus;

/// Parse a nullable string into `T`.
fn str_to_maybe<'de, D, T>(d: D, expected: &'static str) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let s: Option<String> = Deserialize::deserialize(d)?;

    s.map(|s| T::from_str(s.trim()).map_err(|_| s))
        .transpose()
        .map_err(|s| Error::invalid_value(Unexpected::Str(s.as_str()), &expected))
}

pub fn str_to_f32<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
    Ok(str_to_maybe(d, "f32 or null")?.unwrap_or(0.0))
}

pub fn str_to_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(str_to_maybe(d, "u32 or null")?.unwrap_or(0))
}

pub fn str_to_rank_status<'de, D: Deserializer<'de>>(d: D) -> Result<RankStatus, D::Error> {
    let status: Option<i8> = str_to_maybe(d, "rank status between -2 and 4")?;

    match status {
        None => Ok(RankStatus::Pending),
        Some(value) => RankStatus::try_from(value).map_err(|value| {
            Error::invalid_value(Unexpected::Signed(value.into()), &"rank status between -2 and 4")
        }),
    }
}
