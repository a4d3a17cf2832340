//! Finding osu! links in chat messages.

use url::Url;

use crate::osu::BeatmapQuery;

/// Every http(s) link in the text. Bancho wraps `/np` links in brackets,
/// e.g. `[https://osu.ppy.sh/b/1 Artist - Title]`.
fn links(content: &str) -> impl Iterator<Item = Url> + '_ {
    content
        .split(|c: char| c.is_whitespace() || c == '[' || c == ']')
        .filter(|token| token.starts_with("http://") || token.starts_with("https://"))
        .filter_map(|token| Url::parse(token).ok())
}

fn is_osu(url: &Url) -> bool {
    url.host_str() == Some("osu.ppy.sh")
}

/// First osu! screenshot link (`https://osu.ppy.sh/ss/...`).
pub fn screenshot_url(content: &str) -> Option<Url> {
    links(content).find(|url| is_osu(url) && url.path().starts_with("/ss/"))
}

/// First link pointing at a beatmap or mapset.
pub fn beatmap_link(content: &str) -> Option<BeatmapQuery> {
    links(content).find_map(|url| parse_beatmap(&url))
}

fn parse_beatmap(url: &Url) -> Option<BeatmapQuery> {
    if !is_osu(url) {
        return None;
    }

    let mut segments = url.path_segments()?;
    let kind = segments.next()?;
    let id = segments.next()?;

    match kind {
        "b" | "beatmaps" => id.parse().ok().map(BeatmapQuery::Beatmap),
        "s" => id.parse().ok().map(BeatmapQuery::Set),
        "beatmapsets" => {
            let set = id.parse().ok()?;
            // `#osu/129891` or `#/129891`
            let map = url
                .fragment()
                .and_then(|fragment| fragment.rsplit('/').next())
                .and_then(|map| map.parse().ok());

            Some(map.map_or(BeatmapQuery::Set(set), BeatmapQuery::Beatmap))
        }
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn finds_screenshots() {
        let url = screenshot_url("look at this https://osu.ppy.sh/ss/12345678/abcd").unwrap();
        assert_eq!(url.as_str(), "https://osu.ppy.sh/ss/12345678/abcd");

        assert_eq!(screenshot_url("https://example.com/ss/1"), None);
        assert_eq!(screenshot_url("https://old.ppy.sh/ss/1"), None);
        assert_eq!(screenshot_url("https://osu.ppy.sh/b/1"), None);
        assert_eq!(screenshot_url("no links"), None);
    }

    #[test]
    fn now_playing_links() {
        let new_style = "is listening to [https://osu.ppy.sh/beatmapsets/39804#osu/129891 xi - FREEDOM DiVE]";
        assert_eq!(beatmap_link(new_style), Some(BeatmapQuery::Beatmap(129891)));

        let no_mode = "is playing [https://osu.ppy.sh/beatmapsets/39804#/129891 xi - FREEDOM DiVE]";
        assert_eq!(beatmap_link(no_mode), Some(BeatmapQuery::Beatmap(129891)));

        let old_style = "is listening to [https://osu.ppy.sh/b/129891 xi - FREEDOM DiVE]";
        assert_eq!(beatmap_link(old_style), Some(BeatmapQuery::Beatmap(129891)));
    }

    #[test]
    fn mapset_links() {
        assert_eq!(
            beatmap_link("https://osu.ppy.sh/beatmapsets/39804"),
            Some(BeatmapQuery::Set(39804))
        );
        assert_eq!(
            beatmap_link("http://osu.ppy.sh/s/39804"),
            Some(BeatmapQuery::Set(39804))
        );
        assert_eq!(
            beatmap_link("https://osu.ppy.sh/beatmaps/129891?mode=osu"),
            Some(BeatmapQuery::Beatmap(129891))
        );
    }

    #[test]
    fn ignores_unrelated_links() {
        assert_eq!(beatmap_link("https://osu.ppy.sh/users/2"), None);
        assert_eq!(beatmap_link("https://example.com/b/1"), None);
        assert_eq!(beatmap_link("https://old.ppy.sh/b/1"), None);
        assert_eq!(beatmap_link("https://osu.ppy.sh/b/notanumber"), None);
        assert_eq!(beatmap_link("just text"), None);
    }
}
