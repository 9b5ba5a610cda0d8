//! Embeds for the `recent` and `top` commands.

use serenity::CreateEmbed;
use serenity::CreateEmbedAuthor;
use serenity::CreateEmbedFooter;

use super::api::Score;
use super::calc::MapCalculation;
use super::calc::round2;
use super::Mods;
use crate::lib;
use crate::serenity;

/// Scores shown on one page of `top`.
pub const TOP_PAGE_SIZE: usize = 5;

const GREEN: u32 = 0x2ECC71;
const RED: u32 = 0xE74C3C;

pub fn grade_emoji(grade: &str) -> &str {
    match grade {
        "A" => "<:grade_a:1239381666552877056>",
        "B" => "<:grade_b:1239381664157794345>",
        "C" => "<:grade_c:1239381662555701298>",
        "D" => "<:grade_d:1239381659653111871>",
        "SH" => "<:grade_sh:1239381652837371925>",
        "XH" => "<:rank_x:1278891650520842362>",
        "S" => "<:grade_s:1239381654665957377>",
        "X" => "<:grade_ss:1239381649649700964>",
        "F" => "<:grade_f:1239381657543512106>",
        other => other,
    }
}

/// The text pieces both embeds are made of.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreDetails {
    pub title: String,
    pub pp: String,
    pub accuracy: String,
    pub combo: String,
    pub hits: String,
    pub score: String,
    pub mods: String,
    pub stars: String,
    /// Empty unless the server reports client side mods.
    pub cheats: String,
    pub score_set: Option<String>,
}

impl ScoreDetails {
    pub fn new(score: &Score, calc: &MapCalculation) -> Self {
        let beatmap = &score.beatmap;
        let pp = round2(score.pp);
        let if_fc = if pp != calc.pp_if_fc {
            format!(" ({}pp if FC)", calc.pp_if_fc)
        } else {
            String::new()
        };

        let mods = score.mods();
        let cheats = if mods.contains(Mods::SCOREV2) {
            // ScoreV2 is only played on stable.
            String::new()
        } else {
            cheat_values(score)
        };

        Self {
            title: format!("{} - {} [{}]", beatmap.artist, beatmap.title, beatmap.version),
            pp: format!("{pp}pp{if_fc}"),
            accuracy: format!("{:.2}%", score.acc),
            combo: format!("{}x/{}x", score.max_combo, beatmap.max_combo),
            hits: format!(
                "[{}/{}/{}/{}]",
                score.n300, score.n100, score.n50, score.nmiss
            ),
            score: lib::separated(score.score),
            mods: format!("+{}", mods.readable()),
            stars: format!("{}★", calc.stars),
            cheats,
            score_set: score
                .played_at()
                .filter(|_| !score.failed())
                .map(|ts| lib::timestamp(ts, 'R')),
        }
    }
}

fn cheat_values(score: &Score) -> String {
    let c = &score.cheats;
    let used = |flag: f64, value: f64| {
        if flag > 0.0 {
            value.to_string()
        } else {
            "Not used".to_string()
        }
    };
    let yes = |flag: f64| if flag > 0.0 { "Yes" } else { "Not used" };

    let mut line = format!(
        "▸ AC: {} ▸ AR Changer: {} ▸ HD Remover: {}",
        used(c.aim, c.aim_value),
        used(c.arc, c.ar_value),
        yes(c.hdr),
    );
    if score.mode().id() > 3 {
        line.push_str(&format!(
            "\n▸ Timewarp: {} ▸ CS Changer: {}",
            used(c.tw, c.twval),
            yes(c.cs)
        ));
    }
    line
}

/// Links to a server's pages.
#[derive(Debug, Clone, Copy)]
pub struct ServerLinks<'a> {
    pub server: &'a str,
    pub player_id: u64,
}

impl ServerLinks<'_> {
    fn avatar(&self) -> String {
        format!("https://a.{}/{}", self.server, self.player_id)
    }

    fn replay(&self, score_id: u64) -> String {
        format!("https://api.{}/v1/get_play?id={score_id}", self.server)
    }
}

/// The embed of `recent`, a single score.
pub fn recent_embed(score: &Score, calc: &MapCalculation, links: ServerLinks) -> CreateEmbed {
    let details = ScoreDetails::new(score, calc);
    let beatmap = &score.beatmap;

    let mut description = format!(
        "▸ {} ▸ **{}** ▸ {}\n▸ {} ▸ {} ▸ {}\n",
        grade_emoji(&score.grade),
        details.pp,
        details.accuracy,
        details.score,
        details.combo,
        details.hits,
    );
    if let Some(set) = &details.score_set {
        description.push_str(&format!("▸ score set: {set}\n"));
    }
    if !details.cheats.is_empty() {
        description.push_str(&format!("{} ", details.cheats));
    }
    if !score.failed() {
        description.push_str(&format!("▸ [Replay]({})", links.replay(score.id)));
    }

    let author = CreateEmbedAuthor::new(format!(
        "{} {} [{}]",
        details.title, details.mods, details.stars
    ))
    .icon_url(links.avatar())
    .url(format!("https://osu.ppy.sh/b/{}", beatmap.id));

    CreateEmbed::new()
        .description(description)
        .colour(if score.failed() { RED } else { GREEN })
        .author(author)
        .image(format!(
            "https://assets.ppy.sh/beatmaps/{}/covers/cover.jpg",
            beatmap.set_id
        ))
        .footer(CreateEmbedFooter::new(format!("on {}", links.server)))
}

/// One field of the `top` embed.
pub fn top_field(score: &Score, calc: &MapCalculation, number: usize, links: ServerLinks) -> (String, String) {
    let details = ScoreDetails::new(score, calc);

    let mut value = format!(
        "▸ {} ▸ **{}** ▸ {}\n▸ {} ▸ {} ▸ {}\n▸ {} ▸ {}\n",
        grade_emoji(&score.grade),
        details.pp,
        details.accuracy,
        details.score,
        details.combo,
        details.hits,
        details.mods,
        details.stars,
    );
    if let Some(set) = &details.score_set {
        value.push_str(&format!("▸ score set: {set}\n"));
    }
    value.push_str(&details.cheats);
    value.push_str(&format!(" ▸ [Replay]({})", links.replay(score.id)));

    (format!("{number}. {}", details.title), value)
}

/// The embed of `top`, one page of scores. `page` starts at 0.
pub fn top_embed(
    username: &str,
    fields: Vec<(String, String)>,
    page: usize,
    total_pages: usize,
    links: ServerLinks,
) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("Top plays for {username}"))
        .colour(GREEN)
        .fields(fields.into_iter().map(|(name, value)| (name, value, false)))
        .footer(CreateEmbedFooter::new(format!(
            "Page {}/{total_pages} | on {}",
            page + 1,
            links.server
        )))
        .thumbnail(links.avatar())
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::osu::api::Beatmap;
    use crate::osu::api::CheatValues;

    pub(crate) fn score(pp: f64, grade: &str, mods: u32, mode: i32) -> Score {
        Score {
            id: 77,
            score: 12345678,
            pp,
            acc: 97.256,
            max_combo: 812,
            mods,
            n300: 900,
            n100: 20,
            n50: 1,
            nmiss: 2,
            grade: grade.to_string(),
            mode,
            play_time: "2024-05-01T12:00:00".to_string(),
            beatmap: Beatmap {
                id: 11,
                set_id: 22,
                md5: "abc".to_string(),
                artist: "Camellia".to_string(),
                title: "Exit This Earth's Atomosphere".to_string(),
                version: "Evolution".to_string(),
                max_combo: 1024,
            },
            cheats: CheatValues::default(),
        }
    }

    fn calc(pp_if_fc: f64) -> MapCalculation {
        MapCalculation {
            pp: 0.0,
            stars: 7.42,
            pp_if_fc,
        }
    }

    #[test]
    fn details_of_a_choke() {
        let details = ScoreDetails::new(&score(412.345, "A", 8 | 64 | 512, 0), &calc(530.1));

        assert_eq!(details.title, "Camellia - Exit This Earth's Atomosphere [Evolution]");
        assert_eq!(details.pp, "412.35pp (530.1pp if FC)");
        assert_eq!(details.accuracy, "97.26%");
        assert_eq!(details.combo, "812x/1024x");
        assert_eq!(details.hits, "[900/20/1/2]");
        assert_eq!(details.score, "12,345,678");
        assert_eq!(details.mods, "+HDNC");
        assert_eq!(details.stars, "7.42★");
        assert_eq!(details.score_set.as_deref(), Some("<t:1714564800:R>"));
    }

    #[test]
    fn no_if_fc_suffix_for_full_combos() {
        let details = ScoreDetails::new(&score(530.1, "S", 0, 0), &calc(530.1));

        assert_eq!(details.pp, "530.1pp");
        assert_eq!(details.mods, "+");
    }

    #[test]
    fn failed_scores_have_no_set_time() {
        let details = ScoreDetails::new(&score(0.0, "F", 0, 0), &calc(100.0));

        assert_eq!(details.score_set, None);
    }

    #[test]
    fn cheat_values_depend_on_mode() {
        let mut relax = score(100.0, "A", 128, 4);
        relax.cheats.arc = 1.0;
        relax.cheats.ar_value = 9.5;
        let details = ScoreDetails::new(&relax, &calc(100.0));

        assert_eq!(
            details.cheats,
            "▸ AC: Not used ▸ AR Changer: 9.5 ▸ HD Remover: Not used\n\
             ▸ Timewarp: Not used ▸ CS Changer: Not used"
        );

        let v2 = score(100.0, "A", Mods::SCOREV2.bits(), 0);
        assert_eq!(ScoreDetails::new(&v2, &calc(100.0)).cheats, "");
    }

    #[test]
    fn top_fields_are_numbered() {
        let links = ServerLinks {
            server: "refx.online",
            player_id: 3,
        };
        let (name, value) = top_field(&score(100.0, "S", 0, 0), &calc(100.0), 7, links);

        assert_eq!(name, "7. Camellia - Exit This Earth's Atomosphere [Evolution]");
        assert!(value.ends_with("▸ [Replay](https://api.refx.online/v1/get_play?id=77)"));
    }
}
