//! Embeds posted for relayed messages.

use serenity::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, Timestamp};

use super::links;
use crate::irc::ChatMessage;
use crate::osu::{Beatmap, OsuUser};
use crate::serenity;

pub const OSU_BASE: &str = "https://osu.ppy.sh/";
pub const AVATAR_URL: &str = "https://a.ppy.sh/";
pub const FLAG_URL: &str = "https://assets.ppy.sh/old-flags/";
pub const MAP_THUMB_URL: &str = "https://b.ppy.sh/thumb/";

/// Parse `#rrggbb` or `rrggbb`.
pub fn parse_hex_colour(colour: &str) -> Option<u32> {
    let hex = colour.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);

    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Author line describing a player, e.g. `peppy: 1234.56pp (#100 AU5)`.
fn author_text(user: &OsuUser) -> String {
    format!(
        "{name}: {pp:.2}pp (#{global} {country}{national})",
        name = user.username,
        pp = user.pp_raw,
        global = user.pp_rank,
        country = user.country,
        national = user.pp_country_rank,
    )
}

/// The embed every relayed message gets.
///
/// Without a `user` (lookup failed or unknown name) the author is just the
/// IRC nick.
pub fn player(chat: &ChatMessage, user: Option<&OsuUser>, colour: u32) -> CreateEmbed {
    let author = match user {
        Some(user) => CreateEmbedAuthor::new(author_text(user))
            .icon_url(format!("{FLAG_URL}{}.png", user.country))
            .url(format!("{OSU_BASE}users/{}", user.user_id)),
        None => CreateEmbedAuthor::new(&chat.sender),
    };

    let mut embed = CreateEmbed::default()
        .author(author)
        .colour(colour)
        .footer(CreateEmbedFooter::new(format!("in {}", chat.target)))
        .timestamp(Timestamp::now());

    // Discord rejects empty descriptions.
    if !chat.content.is_empty() {
        embed = embed.description(&chat.content);
    }
    if let Some(user) = user {
        embed = embed.thumbnail(format!("{AVATAR_URL}{}", user.user_id));
    }
    if let Some(screenshot) = links::screenshot_url(&chat.content) {
        embed = embed.image(screenshot.as_str());
    }

    embed
}

/// Second embed for `/np` messages.
pub fn beatmap(map: &Beatmap, colour: u32) -> CreateEmbed {
    let author = CreateEmbedAuthor::new(format!("Mapped by {}", map.creator))
        .icon_url(format!("{AVATAR_URL}{}", map.creator_id))
        .url(format!("{OSU_BASE}users/{}", map.creator_id));

    CreateEmbed::default()
        .author(author)
        .title(format!("{} - {} [{}]", map.artist, map.title, map.version))
        .url(format!("{OSU_BASE}b/{}", map.beatmap_id))
        .thumbnail(format!("{MAP_THUMB_URL}{}l.jpg", map.beatmapset_id))
        .field("BPM", map.bpm.to_string(), true)
        .field("Star rating", format!("{:.2}⭐", map.difficultyrating), true)
        .field("Status", map.approved.to_string(), true)
        .colour(colour)
        .timestamp(Timestamp::now())
}

#[cfg(test)]
mod test {
    use serde_json::{json, Value};

    use super::*;
    use crate::irc::{ChatKind, ChatTarget};
    use crate::osu::RankStatus;

    fn to_json(embed: &CreateEmbed) -> Value {
        serde_json::to_value(embed).unwrap()
    }

    fn chat(content: &str) -> ChatMessage {
        ChatMessage {
            sender: "Some_Player".to_string(),
            target: ChatTarget::Channel("#osu".to_string()),
            content: content.to_string(),
            kind: ChatKind::Message,
        }
    }

    fn user() -> OsuUser {
        OsuUser {
            user_id: 124493,
            username: "Some Player".to_string(),
            country: "KR".to_string(),
            pp_raw: 10451.234,
            pp_rank: 8012,
            pp_country_rank: 512,
        }
    }

    #[test]
    fn hex_colours() {
        assert_eq!(parse_hex_colour("#2ec36e"), Some(0x2ec36e));
        assert_eq!(parse_hex_colour("2EC36E"), Some(0x2ec36e));
        assert_eq!(parse_hex_colour("#2ec36"), None);
        assert_eq!(parse_hex_colour("#zzzzzz"), None);
        assert_eq!(parse_hex_colour("+2ec36e"), None);
    }

    #[test]
    fn player_embed() {
        let embed = to_json(&player(&chat("hello"), Some(&user()), 0x2ec36e));

        assert_eq!(
            embed["author"]["name"],
            "Some Player: 10451.23pp (#8012 KR512)"
        );
        assert_eq!(
            embed["author"]["icon_url"],
            "https://assets.ppy.sh/old-flags/KR.png"
        );
        assert_eq!(embed["author"]["url"], "https://osu.ppy.sh/users/124493");
        assert_eq!(embed["thumbnail"]["url"], "https://a.ppy.sh/124493");
        assert_eq!(embed["description"], "hello");
        assert_eq!(embed["footer"]["text"], "in #osu");
        assert_eq!(embed["color"], json!(0x2ec36e));
        assert!(embed["image"].is_null());
        assert!(!embed["timestamp"].is_null());
    }

    #[test]
    fn player_embed_without_user() {
        let embed = to_json(&player(&chat("hello"), None, 0x2ec36e));

        assert_eq!(embed["author"]["name"], "Some_Player");
        assert!(embed["author"]["url"].is_null());
        assert!(embed["thumbnail"].is_null());
        assert_eq!(embed["description"], "hello");
    }

    #[test]
    fn player_embed_with_screenshot() {
        let content = "https://osu.ppy.sh/ss/12345678/abcd new pb!";
        let embed = to_json(&player(&chat(content), Some(&user()), 0));

        assert_eq!(embed["image"]["url"], "https://osu.ppy.sh/ss/12345678/abcd");
        assert_eq!(embed["description"], content);
    }

    #[test]
    fn private_message_footer() {
        let mut message = chat("hey");
        message.target = ChatTarget::Private;
        let embed = to_json(&player(&message, None, 0));

        assert_eq!(embed["footer"]["text"], "in private");
    }

    #[test]
    fn beatmap_embed() {
        let map = Beatmap {
            beatmap_id: 129891,
            beatmapset_id: 39804,
            artist: "xi".to_string(),
            title: "FREEDOM DiVE".to_string(),
            version: "FOUR DIMENSIONS".to_string(),
            creator: "Nakagawa-Kanon".to_string(),
            creator_id: 87065,
            bpm: 222.22,
            difficultyrating: 7.05968,
            approved: RankStatus::Ranked,
        };
        let embed = to_json(&beatmap(&map, 0x2ec36e));

        assert_eq!(embed["author"]["name"], "Mapped by Nakagawa-Kanon");
        assert_eq!(embed["author"]["icon_url"], "https://a.ppy.sh/87065");
        assert_eq!(embed["title"], "xi - FREEDOM DiVE [FOUR DIMENSIONS]");
        assert_eq!(embed["url"], "https://osu.ppy.sh/b/129891");
        assert_eq!(embed["thumbnail"]["url"], "https://b.ppy.sh/thumb/39804l.jpg");

        let fields = embed["fields"].as_array().unwrap();
        let values: Vec<(&str, &str)> = fields
            .iter()
            .map(|f| (f["name"].as_str().unwrap(), f["value"].as_str().unwrap()))
            .collect();
        assert_eq!(
            values,
            vec![("BPM", "222.22"), ("Star rating", "7.06⭐"), ("Status", "Ranked")]
        );
    }
}
