// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dispatches a buffer prefix to each tag-format detector in turn and reports the first match.

use crate::ape::apev2_size;
use crate::id3v1::id3v1_size;
use crate::id3v2::id3v2_size;
use crate::lyrics3::{lyrics3v1_size, lyrics3v2_size};
use crate::size::SizeDetect;

/// The comment/tag formats this crate can identify at a buffer prefix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TagKind {
    Id3v2,
    Id3v1,
    Apev2,
    Lyrics3v2,
    Lyrics3v1,
}

/// Outcome of [`identify_tag`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TagDetect {
    /// A tag of the given kind occupies the first `usize` bytes of the buffer.
    Found(TagKind, usize),
    /// No detector could rule in or out a match with the data buffered so far.
    NeedMoreData,
    /// None of the known tag formats match; the buffer prefix is not a tag.
    NotATag,
}

/// Identifies the comment/tag format, if any, at the start of `data`.
///
/// `eof` must be `true` once no further bytes will be appended to `data` — some formats (notably
/// Lyrics3v1) can't be confirmed until the full tag, bounded by the end of the stream, is seen.
pub fn identify_tag(data: &[u8], eof: bool) -> TagDetect {
    let v2 = id3v2_size(data);
    if let SizeDetect::Size(n) = v2 {
        return TagDetect::Found(TagKind::Id3v2, n);
    }

    let v1 = id3v1_size(data, eof, 0);
    if let SizeDetect::Size(n) = v1 {
        return TagDetect::Found(TagKind::Id3v1, n);
    }

    let ape = apev2_size(data);
    if let SizeDetect::Size(n) = ape {
        return TagDetect::Found(TagKind::Apev2, n);
    }

    let lyr2 = lyrics3v2_size(data);
    if let SizeDetect::Size(n) = lyr2 {
        return TagDetect::Found(TagKind::Lyrics3v2, n);
    }

    let lyr1 = lyrics3v1_size(data, eof);
    if let SizeDetect::Size(n) = lyr1 {
        return TagDetect::Found(TagKind::Lyrics3v1, n);
    }

    if eof {
        return TagDetect::NotATag;
    }

    let needs_more = [v2, v1, ape, lyr2, lyr1]
        .iter()
        .any(|detect| *detect == SizeDetect::NeedMoreData);

    if needs_more {
        TagDetect::NeedMoreData
    } else {
        TagDetect::NotATag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_id3v1() {
        let mut data = vec![0u8; 128];
        data[0..3].copy_from_slice(b"TAG");
        assert_eq!(identify_tag(&data, true), TagDetect::Found(TagKind::Id3v1, 128));
    }

    #[test]
    fn identifies_apev2() {
        let mut data = vec![0u8; 16];
        data[0..8].copy_from_slice(b"APETAGEX");
        assert_eq!(identify_tag(&data, false), TagDetect::Found(TagKind::Apev2, 32));
    }

    #[test]
    fn not_a_tag_when_nothing_matches_at_eof() {
        let data = vec![0u8; 16];
        assert_eq!(identify_tag(&data, true), TagDetect::NotATag);
    }

    #[test]
    fn needs_more_data_when_undecided() {
        let data = b"ID3\x03";
        assert_eq!(identify_tag(data, false), TagDetect::NeedMoreData);
    }
}
