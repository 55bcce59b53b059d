// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lookup tables for the fields packed into an MPEG audio frame header, indexed directly by the
//! raw 2-bit `version`/`layer` values from the header word (no remapping): `version_index` is
//! `0..=3` for `2.5, reserved, 2, 1` and `layer_index` is `0..=3` for `reserved, 3, 2, 1`.

use mpaframe_core::error::{reserved_error, usage_error, Result};

/// Bit-rates in bps, `None` for the free-format slot (index 0) and reserved (index 15).
type BitrateTable = [Option<u32>; 16];

fn brs(kbps: &[u32]) -> BitrateTable {
    let mut table: BitrateTable = [None; 16];
    for (i, &k) in kbps.iter().enumerate() {
        table[i + 1] = Some(k * 1000);
    }
    table
}

const BR_V1_L1: [u32; 14] =
    [32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448];
const BR_V1_L2: [u32; 14] = [32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384];
const BR_V1_L3: [u32; 14] = [32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const BR_V2_L1: [u32; 14] = [32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256];
const BR_V2_L23: [u32; 14] = [8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

/// Returns the bit-rate table for `(version_index, layer_index)`, or an error if either index is
/// reserved.
fn bitrate_table(version_index: u8, layer_index: u8) -> Result<BitrateTable> {
    if version_index == 1 {
        return reserved_error("reserved MPEG version");
    }
    match layer_index {
        0 => reserved_error("reserved MPEG layer"),
        1 if version_index == 3 => Ok(brs(&BR_V1_L3)),
        1 => Ok(brs(&BR_V2_L23)),
        2 if version_index == 3 => Ok(brs(&BR_V1_L2)),
        2 => Ok(brs(&BR_V2_L23)),
        3 if version_index == 3 => Ok(brs(&BR_V1_L1)),
        3 => Ok(brs(&BR_V2_L1)),
        _ => usage_error("layer_index must be 0..=3"),
    }
}

/// Returns the bit-rate in bps for `bitrate_index`, or `Ok(None)` for the free-format slot
/// (index 0). Index 15 is reserved.
pub fn bitrate(version_index: u8, layer_index: u8, bitrate_index: u8) -> Result<Option<u32>> {
    if bitrate_index == 15 {
        return reserved_error("reserved bit-rate index");
    }
    if bitrate_index > 15 {
        return usage_error("bitrate_index must be 0..=15");
    }
    let table = bitrate_table(version_index, layer_index)?;
    Ok(table[bitrate_index as usize])
}

const SAMPLE_RATES: [[Option<u32>; 4]; 4] = [
    [Some(11_025), Some(12_000), Some(8_000), None],
    [None, None, None, None],
    [Some(22_050), Some(24_000), Some(16_000), None],
    [Some(44_100), Some(48_000), Some(32_000), None],
];

/// Returns the sample rate in Hz for `(version_index, samplerate_index)`.
pub fn samplerate(version_index: u8, samplerate_index: u8) -> Result<u32> {
    if version_index > 3 || samplerate_index > 3 {
        return usage_error("version_index and samplerate_index must be 0..=3");
    }
    SAMPLE_RATES[version_index as usize][samplerate_index as usize]
        .ok_or(())
        .or_else(|_| reserved_error("reserved MPEG version or sample rate"))
}

const SAMPLES_PER_FRAME: [[Option<u32>; 4]; 4] = [
    [None, Some(576), Some(1152), Some(384)],
    [None, None, None, None],
    [None, Some(576), Some(1152), Some(384)],
    [None, Some(1152), Some(1152), Some(384)],
];

/// Returns the number of audio samples per channel in a frame.
pub fn samples_per_frame(version_index: u8, layer_index: u8) -> Result<u32> {
    if version_index > 3 || layer_index > 3 {
        return usage_error("version_index and layer_index must be 0..=3");
    }
    SAMPLES_PER_FRAME[version_index as usize][layer_index as usize]
        .ok_or(())
        .or_else(|_| reserved_error("reserved MPEG version or layer"))
}

/// Returns `(slot_size_bytes, frame_size_multiplier)` for the frame-size formula, resolving the
/// historical ambiguity between Layer 1's 4-byte slots and everything else's 1-byte slots, and
/// between the LSF (MPEG2/2.5) Layer 3 multiplier of 72 and the 144 used everywhere else.
fn frame_size_constants(version_index: u8, layer_index: u8) -> (u32, u32) {
    if layer_index == 3 {
        (4, 12)
    }
    else if layer_index == 1 && version_index != 3 {
        (1, 72)
    }
    else {
        (1, 144)
    }
}

/// Returns the frame size in bytes (header included), or `Ok(None)` for a free-format frame
/// whose size can't be derived from the header alone.
pub fn frame_size(
    version_index: u8,
    layer_index: u8,
    bitrate_index: u8,
    samplerate_index: u8,
    padding: bool,
) -> Result<Option<usize>> {
    let br = match bitrate(version_index, layer_index, bitrate_index)? {
        Some(br) => br,
        None => return Ok(None),
    };
    let spf = samples_per_frame(version_index, layer_index)?;
    let sr = samplerate(version_index, samplerate_index)?;
    let (ss, mult) = frame_size_constants(version_index, layer_index);
    let _ = mult;

    let size = (spf / (ss * 8)) * br / sr * ss + if padding { ss } else { 0 };
    Ok(Some(size as usize))
}

/// Finds the smallest `bitrate_index` that produces a frame of at least `min_bytes`, for
/// constructing a free-format frame's replacement header when re-encoding is ever needed.
/// Returns `(bitrate_index, padding, frame_size, bitrate_bps)`.
pub fn min_bitrate_index(
    version_index: u8,
    layer_index: u8,
    samplerate_index: u8,
    min_bytes: usize,
) -> Result<Option<(u8, bool, usize, u32)>> {
    let sr = samplerate(version_index, samplerate_index)?;
    let table = bitrate_table(version_index, layer_index)?;
    let (ss, mult) = frame_size_constants(version_index, layer_index);

    for (idx, slot) in table.iter().enumerate() {
        let br = match slot {
            Some(br) => *br,
            None => continue,
        };

        let n = (mult * br) / sr + 1;
        let size = n * ss;

        if size as usize >= min_bytes {
            let base_size = size - ss;
            let (padding, size) = if base_size as usize >= min_bytes {
                (false, base_size)
            }
            else {
                (true, size)
            };
            return Ok(Some((idx as u8, padding, size as usize, br)));
        }
    }

    Ok(None)
}

/// Side-info size in bytes for `(version_index, channel_mode)`, where `channel_mode` is the raw
/// 2-bit header value (`3` == mono).
const SIDE_INFO_SIZE: [[usize; 2]; 2] = [[32, 17], [17, 9]];

pub fn side_info_size(version_index: u8, channel_mode: u8) -> usize {
    let lsf = usize::from(version_index != 3);
    let mono = usize::from(channel_mode == 3);
    SIDE_INFO_SIZE[lsf][mono]
}

const SIDE_INFO_BIT_OFFSETS_MPEG1_STEREO: [usize; 4] = [20, 79, 138, 197];
const SIDE_INFO_BIT_OFFSETS_MPEG1_MONO: [usize; 2] = [18, 77];
const SIDE_INFO_BIT_OFFSETS_MPEG2_STEREO: [usize; 2] = [10, 73];
const SIDE_INFO_BIT_OFFSETS_MPEG2_MONO: [usize; 1] = [9];

/// Returns the bit offset, within the side-info structure, of each `(channel, granule)` slot's
/// fields. Indexed as `granule * n_channels + channel`.
pub fn side_info_bit_offsets(version_index: u8, channel_mode: u8) -> &'static [usize] {
    let lsf = version_index != 3;
    let mono = channel_mode == 3;
    match (lsf, mono) {
        (false, false) => &SIDE_INFO_BIT_OFFSETS_MPEG1_STEREO,
        (false, true) => &SIDE_INFO_BIT_OFFSETS_MPEG1_MONO,
        (true, false) => &SIDE_INFO_BIT_OFFSETS_MPEG2_STEREO,
        (true, true) => &SIDE_INFO_BIT_OFFSETS_MPEG2_MONO,
    }
}

/// Layer 2 bit-allocation table selector, indexed by `[samplerate_index][bitrate_index]`. Only
/// verified against MPEG1 streams.
const L2_ALLOC_TABLE_SEL: [[u8; 11]; 3] = [
    [1, 2, 2, 0, 0, 0, 1, 1, 1, 1, 1],
    [0, 2, 2, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 3, 3, 0, 0, 0, 1, 1, 1, 1, 1],
];

/// CRC-protected bit counts for Layer 3 and Layer 1, indexed by `[layer_index][mono]`, and for
/// Layer 2's four bit-allocation tables, indexed by `[layer_index][mono][alloc_table]`.
const PROTECTED_BITS_L3: [u32; 2] = [256, 136];
const PROTECTED_BITS_L1: [u32; 2] = [256, 128];
const PROTECTED_BITS_L2: [[u32; 4]; 2] = [[284, 308, 84, 124], [142, 154, 42, 62]];

/// Returns the number of `audio_data` bits a CRC, if present, protects. Layer 2's count depends
/// on the bit-allocation table selected by `(samplerate_index, bitrate_index)`.
pub fn protected_bit_count(
    layer_index: u8,
    bitrate_index: u8,
    samplerate_index: u8,
    channel_mode: u8,
) -> Result<u32> {
    let mono = usize::from(channel_mode == 3);
    match layer_index {
        1 => Ok(PROTECTED_BITS_L3[mono]),
        3 => Ok(PROTECTED_BITS_L1[mono]),
        2 => {
            let i = L2_ALLOC_TABLE_SEL
                .get(samplerate_index as usize)
                .and_then(|row| row.get(bitrate_index as usize))
                .copied()
                .ok_or(())
                .or_else(|_| usage_error("samplerate_index/bitrate_index out of range"))?;
            Ok(PROTECTED_BITS_L2[mono][i as usize])
        }
        _ => usage_error("layer_index must name Layer 1, 2, or 3"),
    }
}

/// Returns the number of whole `audio_data` bytes a CRC protects, for Layer 1 or Layer 3 only
/// (Layer 2's count isn't always a whole number of bytes — use [`protected_bit_count`]).
///
/// Indexes the bit table by `(layer_index, mono)` only, with no separate LSF dimension: the
/// original table this is drawn from has exactly one entry per `(layer, mono)` pair regardless
/// of MPEG version.
pub fn protected_byte_count(layer_index: u8, channel_mode: u8) -> Result<u32> {
    let mono = usize::from(channel_mode == 3);
    let bits = match layer_index {
        1 => PROTECTED_BITS_L3[mono],
        3 => PROTECTED_BITS_L1[mono],
        2 => return usage_error("use protected_bit_count for layer 2"),
        _ => return usage_error("layer_index must name Layer 1, 2, or 3"),
    };
    Ok(bits / 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitrate_table_matches_reference_values() {
        assert_eq!(bitrate(3, 1, 9).unwrap(), Some(128_000)); // MPEG1 L3
        assert_eq!(bitrate(3, 3, 1).unwrap(), Some(32_000)); // MPEG1 L1
        assert_eq!(bitrate(2, 2, 1).unwrap(), Some(8_000)); // MPEG2 L2
        assert_eq!(bitrate(3, 1, 0).unwrap(), None); // free format
        assert!(bitrate(3, 1, 15).is_err()); // reserved
        assert!(bitrate(1, 1, 1).is_err()); // reserved version
    }

    #[test]
    fn samplerate_table_matches_reference_values() {
        assert_eq!(samplerate(3, 0).unwrap(), 44_100);
        assert_eq!(samplerate(2, 2).unwrap(), 16_000);
        assert_eq!(samplerate(0, 1).unwrap(), 12_000);
        assert!(samplerate(3, 3).is_err());
    }

    #[test]
    fn frame_size_formula_agrees_across_every_version_and_layer() {
        // 128kbps/44100Hz MPEG1 Layer 3, no padding: reference value is 417 bytes.
        assert_eq!(frame_size(3, 1, 9, 0, false).unwrap(), Some(417));
        // with padding, one more byte
        assert_eq!(frame_size(3, 1, 9, 0, true).unwrap(), Some(418));
        // free-format yields no derivable size
        assert_eq!(frame_size(3, 1, 0, 0, false).unwrap(), None);

        // 128kbps/44100Hz MPEG1 Layer 1 (4-byte slots): reference value is 136 bytes. Layer 3's
        // ss == 1 masks a missing `* ss` on the quotient term, so this case matters on its own.
        assert_eq!(frame_size(3, 3, 4, 0, false).unwrap(), Some(136));
        // with padding, one more slot (4 bytes)
        assert_eq!(frame_size(3, 3, 4, 0, true).unwrap(), Some(140));
    }

    #[test]
    fn protected_byte_count_ignores_lsf() {
        // layer 3, mono and stereo, regardless of which version_index would apply
        assert_eq!(protected_byte_count(1, 3).unwrap(), 136 / 8);
        assert_eq!(protected_byte_count(1, 0).unwrap(), 256 / 8);
        assert!(protected_byte_count(2, 0).is_err());
    }

    #[test]
    fn protected_bit_count_layer2_uses_alloc_selector() {
        // samplerate_index=0, bitrate_index=1 -> selector 2 -> table[mono][2]
        assert_eq!(protected_bit_count(2, 1, 0, 0).unwrap(), PROTECTED_BITS_L2[0][2]);
    }

    #[test]
    fn min_bitrate_index_finds_smallest_sufficient_bitrate() {
        let (idx, padding, size, br) = min_bitrate_index(3, 1, 0, 400).unwrap().unwrap();
        assert_eq!(frame_size(3, 1, idx, 0, padding).unwrap(), Some(size));
        assert!(size >= 400);
        assert!(br > 0);
    }
}
