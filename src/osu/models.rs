//! Models returned by the osu! v1 API.

use std::fmt::Display;

use serde::Deserialize;

use super::deserialize::{str_to_f32, str_to_rank_status, str_to_u32};

/// Subset of `get_user` needed to describe a player.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OsuUser {
    #[serde(deserialize_with = "str_to_u32")]
    pub user_id: u32,
    pub username: String,
    /// Two letter country code.
    #[serde(default)]
    pub country: String,
    #[serde(default, deserialize_with = "str_to_f32")]
    pub pp_raw: f32,
    #[serde(default, deserialize_with = "str_to_u32")]
    pub pp_rank: u32,
    #[serde(default, deserialize_with = "str_to_u32")]
    pub pp_country_rank: u32,
}

/// Subset of `get_beatmaps` needed to describe a difficulty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Beatmap {
    #[serde(deserialize_with = "str_to_u32")]
    pub beatmap_id: u32,
    #[serde(deserialize_with = "str_to_u32")]
    pub beatmapset_id: u32,
    pub artist: String,
    pub title: String,
    pub version: String,
    pub creator: String,
    #[serde(default, deserialize_with = "str_to_u32")]
    pub creator_id: u32,
    #[serde(default, deserialize_with = "str_to_f32")]
    pub bpm: f32,
    #[serde(default, deserialize_with = "str_to_f32")]
    pub difficultyrating: f32,
    #[serde(default = "RankStatus::default", deserialize_with = "str_to_rank_status")]
    pub approved: RankStatus,
}

/// Ranked state of a beatmap, as the `approved` field encodes it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RankStatus {
    Graveyard,
    Wip,
    #[default]
    Pending,
    Ranked,
    Approved,
    Qualified,
    Loved,
}

impl TryFrom<i8> for RankStatus {
    type Error = i8;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        let status = match value {
            -2 => RankStatus::Graveyard,
            -1 => RankStatus::Wip,
            0 => RankStatus::Pending,
            1 => RankStatus::Ranked,
            2 => RankStatus::Approved,
            3 => RankStatus::Qualified,
            4 => RankStatus::Loved,
            other => return Err(other),
        };
        Ok(status)
    }
}

impl Display for RankStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RankStatus::Graveyard => "Graveyard",
            RankStatus::Wip => "WIP",
            RankStatus::Pending => "Pending",
            RankStatus::Ranked => "Ranked",
            RankStatus::Approved => "Approved",
            RankStatus::Qualified => "Qualified",
            RankStatus::Loved => "Loved",
        };
        f.write_str(name)
    }
}
