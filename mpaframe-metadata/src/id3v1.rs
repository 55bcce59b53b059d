// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ID3v1 prefix detection: a fixed 128-byte trailer beginning with `"TAG"`.
//!
//! This module only determines whether a tag is present and how large it is; decoding the
//! title/artist/genre fields within is out of scope.

use crate::size::SizeDetect;

const MARKER: &[u8; 3] = b"TAG";
pub const ID3V1_SIZE: usize = 128;

/// Checks whether `data[offset..]` begins with an ID3v1 tag.
///
/// `eof` must be `true` once no more bytes will be appended to `data` — an ID3v1 tag is a fixed
/// size, so without it this function can't distinguish "still buffering" from "not a tag".
pub fn id3v1_size(data: &[u8], eof: bool, offset: usize) -> SizeDetect {
    if offset > data.len() {
        return SizeDetect::NotPresent;
    }

    let taglen = data.len() - offset;

    if taglen >= MARKER.len() && &data[offset..offset + MARKER.len()] != MARKER {
        return SizeDetect::NotPresent;
    }

    if taglen == ID3V1_SIZE && eof {
        SizeDetect::Size(ID3V1_SIZE)
    } else if taglen < ID3V1_SIZE && !eof {
        SizeDetect::NeedMoreData
    } else {
        SizeDetect::NotPresent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_full_tag_at_eof() {
        let mut data = vec![0u8; ID3V1_SIZE];
        data[0..3].copy_from_slice(b"TAG");
        assert_eq!(id3v1_size(&data, true, 0), SizeDetect::Size(128));
    }

    #[test]
    fn needs_more_data_before_eof() {
        let mut data = vec![0u8; 64];
        data[0..3].copy_from_slice(b"TAG");
        assert_eq!(id3v1_size(&data, false, 0), SizeDetect::NeedMoreData);
    }

    #[test]
    fn rejects_wrong_marker() {
        let data = vec![0u8; ID3V1_SIZE];
        assert_eq!(id3v1_size(&data, true, 0), SizeDetect::NotPresent);
    }

    #[test]
    fn honours_nonzero_offset() {
        let mut data = vec![0xffu8; 16 + ID3V1_SIZE];
        data[16..19].copy_from_slice(b"TAG");
        assert_eq!(id3v1_size(&data, true, 16), SizeDetect::Size(128));
    }
}
