// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lyrics3 v1 and v2 prefix detection.
//!
//! Lyrics3v2 is anchored at the start of the buffer (`"LYRICSBEGIN"`, a run of self-describing
//! fields, `"LYRICS200"`). Lyrics3v1 is anchored the same way at the start but its end marker
//! (`"LYRICSEND"`) can only be located once the whole tag, up to EOF, is buffered — optionally
//! followed by a trailing ID3v1 tag that must be looked past.

use crate::id3v1::id3v1_size;
use crate::size::SizeDetect;

const LYRICS_BEGIN: &[u8; 11] = b"LYRICSBEGIN";
const LYRICS_END: &[u8; 9] = b"LYRICSEND";
const LYRICS200: &[u8; 9] = b"LYRICS200";

/// The maximum buffer length this module will scan before giving up on a Lyrics3v2 tag that
/// never terminates (guards against pathological input, not a spec-mandated tag size).
const LYRICS3V2_SCAN_LIMIT: usize = 0x80000;

/// The largest a Lyrics3v1 tag (lyrics body plus 20-byte header/footer) may be, after stripping
/// a trailing ID3v1 tag if one is present.
const LYRICS3V1_MAX_SIZE: usize = 5220;
const LYRICS3V1_MIN_SIZE: usize = 20;

enum LyricsField {
    /// A named field (`"EAL"`, `"EAR"`, ...) with its declared byte length.
    Named(usize),
    /// The terminal `"000000"`..-style length field that ends the field run.
    End(usize),
}

fn is_upper_ascii(b: u8) -> bool {
    b > 64 && b <= 90
}

fn parse_digits(data: &[u8], pos: usize, len: usize) -> Option<usize> {
    let mut value = 0usize;
    for &b in &data[pos..pos + len] {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + (b - b'0') as usize;
    }
    Some(value)
}

/// Parses a single field of a Lyrics3v2 field run starting at `offset`. Requires at least 8
/// bytes of `data` beyond `offset`.
fn lyrics_field_info(data: &[u8], offset: usize) -> Option<LyricsField> {
    if is_upper_ascii(data[offset])
        && is_upper_ascii(data[offset + 1])
        && is_upper_ascii(data[offset + 2])
    {
        let size = parse_digits(data, offset + 3, 5)?;
        return Some(LyricsField::Named(size));
    }

    let size = parse_digits(data, offset, 6)?;
    Some(LyricsField::End(size))
}

/// Checks whether `data` begins with a Lyrics3v2 tag.
pub fn lyrics3v2_size(data: &[u8]) -> SizeDetect {
    if data.len() >= LYRICS_BEGIN.len() && &data[0..LYRICS_BEGIN.len()] != LYRICS_BEGIN {
        return SizeDetect::NotPresent;
    }

    let mut pos = LYRICS_BEGIN.len();
    while pos + 8 < data.len() {
        if pos >= LYRICS3V2_SCAN_LIMIT {
            return SizeDetect::NotPresent;
        }

        match lyrics_field_info(data, pos) {
            None => return SizeDetect::NotPresent,
            Some(LyricsField::End(size)) => {
                if pos != size {
                    return SizeDetect::NotPresent;
                }
                pos += 6;
                break;
            }
            Some(LyricsField::Named(size)) => pos += size + 8,
        }
    }

    if pos + LYRICS200.len() > data.len() {
        return SizeDetect::NeedMoreData;
    }
    if &data[pos..pos + LYRICS200.len()] == LYRICS200 {
        SizeDetect::Size(pos + LYRICS200.len())
    } else {
        SizeDetect::NotPresent
    }
}

/// Checks whether `data` begins with (and, once `eof` is true, ends in) a Lyrics3v1 tag.
pub fn lyrics3v1_size(data: &[u8], eof: bool) -> SizeDetect {
    let taglen = data.len();
    if taglen >= LYRICS_BEGIN.len() && &data[0..LYRICS_BEGIN.len()] != LYRICS_BEGIN {
        return SizeDetect::NotPresent;
    }

    let mut effective_len = taglen;
    if eof && taglen >= 128 + LYRICS3V1_MIN_SIZE {
        if id3v1_size(data, eof, taglen - 128) == SizeDetect::Size(128) {
            effective_len = taglen - 128;
        }
    }

    // Before eof, a trailing ID3v1 tag hasn't been (and can't be) stripped yet, so the cap must
    // allow the extra 128 bytes it would remove once it has.
    let max_size = if eof { LYRICS3V1_MAX_SIZE } else { LYRICS3V1_MAX_SIZE + 128 };
    if effective_len > max_size {
        return SizeDetect::NotPresent;
    }
    if !eof {
        return SizeDetect::NeedMoreData;
    }
    if effective_len < LYRICS3V1_MIN_SIZE {
        return SizeDetect::NotPresent;
    }

    if &data[effective_len - LYRICS_END.len()..effective_len] == LYRICS_END {
        SizeDetect::Size(effective_len)
    } else {
        SizeDetect::NotPresent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v2_tag() -> Vec<u8> {
        let mut data = LYRICS_BEGIN.to_vec();
        data.extend_from_slice(b"EAL00005hello");
        let end_pos = data.len();
        data.extend_from_slice(format!("{:06}", end_pos).as_bytes());
        data.extend_from_slice(LYRICS200);
        data
    }

    #[test]
    fn decodes_v2_tag() {
        let data = v2_tag();
        assert_eq!(lyrics3v2_size(&data), SizeDetect::Size(data.len()));
    }

    #[test]
    fn v2_needs_more_data_when_truncated() {
        let data = v2_tag();
        assert_eq!(lyrics3v2_size(&data[..data.len() - 1]), SizeDetect::NeedMoreData);
    }

    #[test]
    fn decodes_v1_tag_at_eof() {
        let mut data = LYRICS_BEGIN.to_vec();
        data.extend_from_slice(&[b'x'; 30]);
        data.extend_from_slice(LYRICS_END);
        assert_eq!(lyrics3v1_size(&data, true), SizeDetect::Size(data.len()));
    }

    #[test]
    fn v1_needs_more_data_before_eof() {
        let mut data = LYRICS_BEGIN.to_vec();
        data.extend_from_slice(&[b'x'; 30]);
        data.extend_from_slice(LYRICS_END);
        assert_eq!(lyrics3v1_size(&data, false), SizeDetect::NeedMoreData);
    }

    #[test]
    fn v1_strips_trailing_id3v1() {
        let mut data = LYRICS_BEGIN.to_vec();
        data.extend_from_slice(&[b'x'; 30]);
        data.extend_from_slice(LYRICS_END);
        let lyrics_len = data.len();

        data.extend_from_slice(b"TAG");
        data.extend_from_slice(&[0u8; 125]);

        assert_eq!(lyrics3v1_size(&data, true), SizeDetect::Size(lyrics_len));
    }

    #[test]
    fn rejects_oversized_v1_tag() {
        let mut data = LYRICS_BEGIN.to_vec();
        data.extend_from_slice(&[b'x'; LYRICS3V1_MAX_SIZE]);
        data.extend_from_slice(LYRICS_END);
        assert_eq!(lyrics3v1_size(&data, true), SizeDetect::NotPresent);
    }

    #[test]
    fn pre_eof_size_check_leaves_room_for_a_trailing_id3v1_tag() {
        // buffered length sits just past LYRICS3V1_MAX_SIZE, as it would while a trailing 128-byte
        // ID3v1 tag is still being fed in; since that tag hasn't been stripped yet (stripping only
        // happens once eof is true), this must still say "need more data", not "not a tag".
        let mut data = LYRICS_BEGIN.to_vec();
        data.extend_from_slice(&[b'x'; LYRICS3V1_MAX_SIZE + 10]);
        assert_eq!(lyrics3v1_size(&data, false), SizeDetect::NeedMoreData);
    }

    #[test]
    fn pre_eof_size_check_still_rejects_truly_oversized_input() {
        let mut data = LYRICS_BEGIN.to_vec();
        data.extend_from_slice(&[b'x'; LYRICS3V1_MAX_SIZE + 200]);
        assert_eq!(lyrics3v1_size(&data, false), SizeDetect::NotPresent);
    }
}
