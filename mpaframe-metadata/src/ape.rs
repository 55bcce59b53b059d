// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! APEv2 prefix detection: `"APETAGEX"` followed by a 32-byte header whose last four bytes (of
//! the first 16) hold a little-endian tag body size.

use crate::size::SizeDetect;

const MARKER: &[u8; 8] = b"APETAGEX";
const HEADER_LEN: usize = 32;
const MIN_PROBE_LEN: usize = 16;

/// Checks whether `data` begins with an APEv2 (or APEv1, which shares this header layout) tag.
pub fn apev2_size(data: &[u8]) -> SizeDetect {
    if data.len() >= MARKER.len() && &data[0..MARKER.len()] != MARKER {
        return SizeDetect::NotPresent;
    }
    if data.len() < MIN_PROBE_LEN {
        return SizeDetect::NeedMoreData;
    }

    let body_size = u32::from_le_bytes([data[12], data[13], data[14], data[15]]) as usize;
    SizeDetect::Size(HEADER_LEN + body_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_body_size() {
        let mut data = vec![0u8; MIN_PROBE_LEN];
        data[0..8].copy_from_slice(MARKER);
        data[12..16].copy_from_slice(&100u32.to_le_bytes());
        assert_eq!(apev2_size(&data), SizeDetect::Size(32 + 100));
    }

    #[test]
    fn needs_more_data_below_probe_length() {
        let data = MARKER.to_vec();
        assert_eq!(apev2_size(&data), SizeDetect::NeedMoreData);
    }

    #[test]
    fn rejects_wrong_marker() {
        let data = vec![0u8; MIN_PROBE_LEN];
        assert_eq!(apev2_size(&data), SizeDetect::NotPresent);
    }
}
