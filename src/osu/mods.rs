//! osu! stable mod bit flags.

use std::fmt::Display;
use std::ops::BitOr;

use crate::error::UserError;

/// A combination of mods, stored as the bit flags used by osu! stable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mods(u32);

impl Mods {
    pub const NOMOD: Mods = Mods(0);
    pub const NOFAIL: Mods = Mods(1 << 0);
    pub const EASY: Mods = Mods(1 << 1);
    pub const TOUCHSCREEN: Mods = Mods(1 << 2);
    pub const HIDDEN: Mods = Mods(1 << 3);
    pub const HARDROCK: Mods = Mods(1 << 4);
    pub const SUDDENDEATH: Mods = Mods(1 << 5);
    pub const DOUBLETIME: Mods = Mods(1 << 6);
    pub const RELAX: Mods = Mods(1 << 7);
    pub const HALFTIME: Mods = Mods(1 << 8);
    pub const NIGHTCORE: Mods = Mods(1 << 9);
    pub const FLASHLIGHT: Mods = Mods(1 << 10);
    pub const AUTOPLAY: Mods = Mods(1 << 11);
    pub const SPUNOUT: Mods = Mods(1 << 12);
    pub const AUTOPILOT: Mods = Mods(1 << 13);
    pub const PERFECT: Mods = Mods(1 << 14);
    pub const KEY4: Mods = Mods(1 << 15);
    pub const KEY5: Mods = Mods(1 << 16);
    pub const KEY6: Mods = Mods(1 << 17);
    pub const KEY7: Mods = Mods(1 << 18);
    pub const KEY8: Mods = Mods(1 << 19);
    pub const FADEIN: Mods = Mods(1 << 20);
    pub const RANDOM: Mods = Mods(1 << 21);
    pub const CINEMA: Mods = Mods(1 << 22);
    pub const TARGET: Mods = Mods(1 << 23);
    pub const KEY9: Mods = Mods(1 << 24);
    pub const KEYCOOP: Mods = Mods(1 << 25);
    pub const KEY1: Mods = Mods(1 << 26);
    pub const KEY3: Mods = Mods(1 << 27);
    pub const KEY2: Mods = Mods(1 << 28);
    pub const SCOREV2: Mods = Mods(1 << 29);
    pub const MIRROR: Mods = Mods(1 << 30);

    /// Acronyms in display order.
    const ACRONYMS: [(&'static str, Mods); 31] = [
        ("NF", Mods::NOFAIL),
        ("EZ", Mods::EASY),
        ("TD", Mods::TOUCHSCREEN),
        ("HD", Mods::HIDDEN),
        ("HR", Mods::HARDROCK),
        ("SD", Mods::SUDDENDEATH),
        ("DT", Mods::DOUBLETIME),
        ("RX", Mods::RELAX),
        ("HT", Mods::HALFTIME),
        ("NC", Mods::NIGHTCORE),
        ("FL", Mods::FLASHLIGHT),
        ("AU", Mods::AUTOPLAY),
        ("SO", Mods::SPUNOUT),
        ("AP", Mods::AUTOPILOT),
        ("PF", Mods::PERFECT),
        ("FI", Mods::FADEIN),
        ("RN", Mods::RANDOM),
        ("CN", Mods::CINEMA),
        ("TP", Mods::TARGET),
        ("V2", Mods::SCOREV2),
        ("MR", Mods::MIRROR),
        ("1K", Mods::KEY1),
        ("2K", Mods::KEY2),
        ("3K", Mods::KEY3),
        ("4K", Mods::KEY4),
        ("5K", Mods::KEY5),
        ("6K", Mods::KEY6),
        ("7K", Mods::KEY7),
        ("8K", Mods::KEY8),
        ("9K", Mods::KEY9),
        ("CO", Mods::KEYCOOP),
    ];

    /// Mods that can be written into a replay with `changemod`.
    /// Replay tools spell Autoplay as `AP`, so it differs from [Mods::ACRONYMS] there.
    const REPLAY_ACRONYMS: [(&'static str, Mods); 14] = [
        ("NF", Mods::NOFAIL),
        ("EZ", Mods::EASY),
        ("TD", Mods::TOUCHSCREEN),
        ("HD", Mods::HIDDEN),
        ("HR", Mods::HARDROCK),
        ("SD", Mods::SUDDENDEATH),
        ("DT", Mods::DOUBLETIME),
        ("RX", Mods::RELAX),
        ("HT", Mods::HALFTIME),
        ("NC", Mods::NIGHTCORE),
        ("FL", Mods::FLASHLIGHT),
        ("AP", Mods::AUTOPLAY),
        ("SO", Mods::SPUNOUT),
        ("PF", Mods::PERFECT),
    ];

    pub const fn from_bits(bits: u32) -> Mods {
        Mods(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Mods) -> bool {
        self.0 & other.0 == other.0
    }

    fn from_acronym(acronym: &str) -> Option<Mods> {
        Mods::ACRONYMS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(acronym))
            .map(|(_, mods)| *mods)
    }

    /// Reads mods from consecutive two letter acronyms like `hddt`.
    /// Unknown chunks are ignored.
    pub fn from_acronyms(input: &str) -> Mods {
        let chars: Vec<char> = input.chars().collect();

        chars
            .chunks(2)
            .map(|chunk| chunk.iter().collect::<String>())
            .filter_map(|chunk| Mods::from_acronym(&chunk))
            .fold(Mods::NOMOD, |acc, m| acc | m)
    }

    /// Stricter version of [Mods::from_acronyms] for rewriting replays.
    /// Whitespace is skipped and only mods that make sense in a replay are accepted.
    /// Note that `AP` means Autoplay here, not Autopilot.
    pub fn from_replay_acronyms(input: &str) -> Result<Mods, UserError> {
        let chars: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();

        chars
            .chunks(2)
            .map(|chunk| chunk.iter().collect::<String>())
            .try_fold(Mods::NOMOD, |acc, chunk| {
                let found = Mods::REPLAY_ACRONYMS
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(&chunk))
                    .map(|(_, mods)| *mods);

                match found {
                    Some(mods) => Ok(acc | mods),
                    None => Err(UserError::UnknownMod {
                        chunk: chunk.to_lowercase(),
                        input: input.to_string(),
                    }),
                }
            })
    }

    /// Every set mod as acronyms, e.g. `HDDTNC`.
    pub fn to_acronyms(self) -> String {
        Mods::ACRONYMS
            .iter()
            .filter(|(_, mods)| self.contains(*mods))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Like [Mods::to_acronyms] but without `DT` when `NC` is set.
    pub fn readable(self) -> String {
        let mods = if self.contains(Mods::NIGHTCORE) {
            Mods(self.0 & !Mods::DOUBLETIME.0)
        } else {
            self
        };
        mods.to_acronyms()
    }

    /// Nightcore always plays at double time speed.
    pub fn with_implied(self) -> Mods {
        if self.contains(Mods::NIGHTCORE) {
            self | Mods::DOUBLETIME
        } else {
            self
        }
    }
}

impl BitOr for Mods {
    type Output = Mods;

    fn bitor(self, rhs: Self) -> Self::Output {
        Mods(self.0 | rhs.0)
    }
}

impl Display for Mods {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.readable().as_str() {
            "" => f.write_str("NM"),
            mods => f.write_str(mods),
        }
    }
}
