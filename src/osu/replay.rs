//! Reading the header of `.osr` replay files and changing their mods.
//!
//! Only the header is decoded. The compressed replay data after it is kept as is.

use super::Mods;
use crate::error::UserError;

/// Marks a present string, `0x00` marks an empty one.
const STRING_PRESENT: u8 = 0x0b;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayHeader {
    pub mode: u8,
    pub version: i32,
    pub beatmap_md5: String,
    pub player: String,
    pub replay_md5: String,
    pub n300: u16,
    pub n100: u16,
    pub n50: u16,
    pub geki: u16,
    pub katu: u16,
    pub nmiss: u16,
    pub score: i32,
    pub max_combo: u16,
    pub perfect: bool,
    pub mods: Mods,
    /// Where the mods are in the file.
    mods_offset: usize,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], UserError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| invalid(format!("file ends before {what}")))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], UserError> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u8(&mut self, what: &str) -> Result<u8, UserError> {
        Ok(self.array::<1>(what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16, UserError> {
        Ok(u16::from_le_bytes(self.array(what)?))
    }

    fn i32(&mut self, what: &str) -> Result<i32, UserError> {
        Ok(i32::from_le_bytes(self.array(what)?))
    }

    fn uleb128(&mut self, what: &str) -> Result<usize, UserError> {
        let mut value: usize = 0;
        for shift in (0..usize::BITS).step_by(7) {
            let byte = self.u8(what)?;
            value |= usize::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(invalid(format!("length of {what} is too long")))
    }

    fn string(&mut self, what: &str) -> Result<String, UserError> {
        match self.u8(what)? {
            0x00 => Ok(String::new()),
            STRING_PRESENT => {
                let len = self.uleb128(what)?;
                let bytes = self.take(len, what)?;
                String::from_utf8(bytes.to_vec())
                    .map_err(|_| invalid(format!("{what} is not valid utf-8")))
            }
            other => Err(invalid(format!("unexpected byte {other:#04x} before {what}"))),
        }
    }
}

fn invalid(reason: String) -> UserError {
    UserError::InvalidReplay { reason }
}

impl ReplayHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, UserError> {
        let mut r = Reader { bytes, pos: 0 };

        let mode = r.u8("mode")?;
        if mode > 3 {
            return Err(invalid(format!("unknown mode {mode}")));
        }
        let version = r.i32("version")?;
        let beatmap_md5 = r.string("beatmap hash")?;
        let player = r.string("player name")?;
        let replay_md5 = r.string("replay hash")?;
        let n300 = r.u16("hit counts")?;
        let n100 = r.u16("hit counts")?;
        let n50 = r.u16("hit counts")?;
        let geki = r.u16("hit counts")?;
        let katu = r.u16("hit counts")?;
        let nmiss = r.u16("hit counts")?;
        let score = r.i32("score")?;
        let max_combo = r.u16("max combo")?;
        let perfect = r.u8("perfect flag")? != 0;
        let mods_offset = r.pos;
        let mods = r.i32("mods")?;

        Ok(Self {
            mode,
            version,
            beatmap_md5,
            player,
            replay_md5,
            n300,
            n100,
            n50,
            geki,
            katu,
            nmiss,
            score,
            max_combo,
            perfect,
            mods: Mods::from_bits(mods as u32),
            mods_offset,
        })
    }
}

/// A copy of the replay with other mods. Nothing else changes.
pub fn with_mods(bytes: &[u8], mods: Mods) -> Result<Vec<u8>, UserError> {
    let header = ReplayHeader::parse(bytes)?;

    let mut out = bytes.to_vec();
    out[header.mods_offset..header.mods_offset + 4].copy_from_slice(&mods.bits().to_le_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn push_string(out: &mut Vec<u8>, value: &str) {
        if value.is_empty() {
            out.push(0);
            return;
        }
        out.push(STRING_PRESENT);
        let mut len = value.len();
        loop {
            let byte = (len & 0x7f) as u8;
            len >>= 7;
            if len == 0 {
                out.push(byte);
                break;
            }
            out.push(byte | 0x80);
        }
        out.extend_from_slice(value.as_bytes());
    }

    fn replay(player: &str, mods: u32) -> Vec<u8> {
        let mut out = vec![0];
        out.extend_from_slice(&20240501i32.to_le_bytes());
        push_string(&mut out, "d41d8cd98f00b204e9800998ecf8427e");
        push_string(&mut out, player);
        push_string(&mut out, "");
        for count in [900u16, 20, 1, 50, 10, 2] {
            out.extend_from_slice(&count.to_le_bytes());
        }
        out.extend_from_slice(&12345678i32.to_le_bytes());
        out.extend_from_slice(&812u16.to_le_bytes());
        out.push(0);
        out.extend_from_slice(&mods.to_le_bytes());
        // Life bar, timestamp and some of the compressed data.
        out.extend_from_slice(&[0x0b, 3, b'1', b'|', b'1', 1, 2, 3, 4, 5, 6, 7, 8, 0xff, 0xfe]);
        out
    }

    #[test]
    fn reads_the_header() {
        let header = ReplayHeader::parse(&replay("ano", 8 | 16)).unwrap();

        assert_eq!(header.mode, 0);
        assert_eq!(header.version, 20240501);
        assert_eq!(header.beatmap_md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(header.player, "ano");
        assert_eq!(header.replay_md5, "");
        assert_eq!(
            (header.n300, header.n100, header.n50, header.nmiss),
            (900, 20, 1, 2)
        );
        assert_eq!(header.score, 12345678);
        assert_eq!(header.max_combo, 812);
        assert!(!header.perfect);
        assert_eq!(header.mods, Mods::HIDDEN | Mods::HARDROCK);
    }

    #[test]
    fn long_names_use_multi_byte_lengths() {
        let name = "a".repeat(200);
        let header = ReplayHeader::parse(&replay(&name, 0)).unwrap();

        assert_eq!(header.player, name);
    }

    #[test]
    fn changing_mods_keeps_everything_else() {
        let original = replay("ano", 8);
        let changed = with_mods(&original, Mods::DOUBLETIME | Mods::RELAX).unwrap();

        assert_eq!(changed.len(), original.len());
        let header = ReplayHeader::parse(&changed).unwrap();
        assert_eq!(header.mods, Mods::DOUBLETIME | Mods::RELAX);

        let offset = header.mods_offset;
        assert_eq!(changed[..offset], original[..offset]);
        assert_eq!(changed[offset + 4..], original[offset + 4..]);
    }

    #[test]
    fn truncated_files_are_rejected() {
        let original = replay("ano", 8);
        let result = ReplayHeader::parse(&original[..20]);

        assert!(matches!(result, Err(UserError::InvalidReplay { .. })));
        assert!(ReplayHeader::parse(&[]).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let mut bytes = replay("ano", 0);
        bytes[5] = 0x42;

        let err = ReplayHeader::parse(&bytes).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error processing replay: unexpected byte 0x42 before beatmap hash"
        );
    }
}
