//! Game modes as understood by bancho.py servers.
//!
//! Ids 0-3 are vanilla, 4-7 relax and 8 autopilot. Servers like refx call the
//! vanilla and relax leaderboards `001` and `002`.

use std::fmt::Display;

use rosu_pp::model::mode::GameMode;

/// Names accepted by [Mode::parse], indexed by mode id.
const NAMES: [(&str, &str); 9] = [
    ("vn!std", "001!std"),
    ("vn!taiko", "001!taiko"),
    ("vn!catch", "001!catch"),
    ("vn!mania", "001!mania"),
    ("rx!std", "002!std"),
    ("rx!taiko", "002!taiko"),
    ("rx!catch", "002!catch"),
    ("rx!mania", "002!mania"),
    ("ap!std", "ap!std"),
];

/// A bancho.py mode id.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode(u8);

impl Mode {
    pub const VN_STD: Mode = Mode(0);
    pub const RX_STD: Mode = Mode(4);

    /// Reads a mode like `rx!taiko` or `002!taiko`, ignoring case.
    /// Anything unknown is [Mode::VN_STD].
    pub fn parse(input: &str) -> Mode {
        let input = input.trim().to_lowercase();

        NAMES
            .iter()
            .position(|(short, refx)| *short == input || *refx == input)
            .and_then(|id| u8::try_from(id).ok())
            .map(Mode)
            .unwrap_or_default()
    }

    /// Mode from its numeric id, as stored in the database.
    /// Negative or huge ids become [Mode::VN_STD], other unknown ids display as `001!std`.
    pub fn from_id(id: i32) -> Mode {
        u8::try_from(id).map(Mode).unwrap_or_default()
    }

    pub fn id(self) -> u8 {
        self.0
    }

    /// The display name used in embeds.
    pub fn name(self) -> &'static str {
        NAMES
            .get(usize::from(self.0))
            .map_or("001!std", |(_, display)| *display)
    }

    /// The ruleset used for pp calculation.
    pub fn ruleset(self) -> GameMode {
        match self.0 % 4 {
            1 => GameMode::Taiko,
            2 => GameMode::Catch,
            3 => GameMode::Mania,
            _ => GameMode::Osu,
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_both_naming_schemes() {
        assert_eq!(Mode::parse("vn!std").id(), 0);
        assert_eq!(Mode::parse("001!mania").id(), 3);
        assert_eq!(Mode::parse("RX!Taiko").id(), 5);
        assert_eq!(Mode::parse("002!mania").id(), 7);
        assert_eq!(Mode::parse("ap!std").id(), 8);
    }

    #[test]
    fn unknown_input_is_vanilla_std() {
        assert_eq!(Mode::parse("ap!mania"), Mode::VN_STD);
        assert_eq!(Mode::parse(""), Mode::VN_STD);
        assert_eq!(Mode::from_id(-3), Mode::VN_STD);
    }

    #[test]
    fn display_names() {
        let names: Vec<_> = (0..=9).map(|id| Mode::from_id(id).to_string()).collect();

        assert_eq!(
            names,
            [
                "001!std", "001!taiko", "001!catch", "001!mania", "002!std", "002!taiko",
                "002!catch", "002!mania", "ap!std", "001!std",
            ]
        );
    }

    #[test]
    fn ruleset_wraps_every_four_modes() {
        assert_eq!(Mode::from_id(6).ruleset(), GameMode::Catch);
        assert_eq!(Mode::from_id(7).ruleset(), GameMode::Mania);
        assert_eq!(Mode::from_id(8).ruleset(), GameMode::Osu);
    }
}
