// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decodes and encodes the 4-byte MPEG audio frame header:
//!
//! ```text
//! 0b1111_1111 0b111v_vlly 0brrrr_hhpx 0bmmmm_coee
//! ```
//!
//! where `vv` is the version, `ll` the layer, `y` the CRC protection bit, `rrrr` the bit-rate
//! index, `hh` the sample-rate index, `p` the padding bit, `x` the private bit, `mmmm` the
//! channel mode and mode extension, `c` copyright, `o` original, and `ee` the emphasis.
//!
//! Unlike a pure interpreted-fields decode, [`FrameHeader`] keeps enough of the raw field values
//! around to round-trip back to the same 4 bytes, and treats bit-rate index 0 (free format) as a
//! valid header whose frame size can't be derived without scanning ahead to the next frame.

use mpaframe_core::error::{decode_error, reserved_error, usage_error, Result};
use mpaframe_core::io::bitfield::BitField;

use crate::tables;

/// Length in bytes of an MPEG audio frame header word.
pub const HEADER_LEN: usize = 4;

/// Largest possible MPEG frame, header included (Layer 1, lowest sample rate, highest bit-rate,
/// with padding).
pub const MAX_FRAME_SIZE: usize = 2881;

const SYNC: BitField = BitField::new(0, 11);
const VERSION: BitField = BitField::new(11, 2);
const LAYER: BitField = BitField::new(13, 2);
const PROTECTION_BIT: BitField = BitField::new(15, 1);
const BITRATE_INDEX: BitField = BitField::new(16, 4);
const SAMPLERATE_INDEX: BitField = BitField::new(20, 2);
const PADDING_BIT: BitField = BitField::new(22, 1);
const PRIVATE_BIT: BitField = BitField::new(23, 1);
const CHANNEL_MODE: BitField = BitField::new(24, 2);
const MODE_EXTENSION: BitField = BitField::new(26, 2);
const COPYRIGHT_BIT: BitField = BitField::new(28, 1);
const ORIGINAL_BIT: BitField = BitField::new(29, 1);
const EMPHASIS: BitField = BitField::new(30, 2);

/// `0xffe0_0000`, the bit pattern of a synced 11-bit frame sync word at the top of a big-endian
/// header word.
pub const SYNC_MASK: u32 = 0xffe0_0000;

/// MPEG version, keyed by the header's raw 2-bit `version` field (`1` is reserved).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg2p5,
    Mpeg2,
    Mpeg1,
}

impl MpegVersion {
    fn from_index(idx: u8) -> Result<Self> {
        match idx {
            0 => Ok(MpegVersion::Mpeg2p5),
            2 => Ok(MpegVersion::Mpeg2),
            3 => Ok(MpegVersion::Mpeg1),
            1 => reserved_error("reserved MPEG version"),
            _ => usage_error("version index must be 0..=3"),
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            MpegVersion::Mpeg2p5 => 0,
            MpegVersion::Mpeg2 => 2,
            MpegVersion::Mpeg1 => 3,
        }
    }

    /// `true` for MPEG 2 and 2.5, the "lower sampling frequency" streams whose Layer 3 side-info
    /// is shaped differently from MPEG 1's.
    pub fn is_lsf(&self) -> bool {
        !matches!(self, MpegVersion::Mpeg1)
    }
}

/// MPEG layer, keyed by the header's raw 2-bit `layer` field (`0` is reserved).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MpegLayer {
    Layer3,
    Layer2,
    Layer1,
}

impl MpegLayer {
    fn from_index(idx: u8) -> Result<Self> {
        match idx {
            1 => Ok(MpegLayer::Layer3),
            2 => Ok(MpegLayer::Layer2),
            3 => Ok(MpegLayer::Layer1),
            0 => reserved_error("reserved MPEG layer"),
            _ => usage_error("layer index must be 0..=3"),
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            MpegLayer::Layer3 => 1,
            MpegLayer::Layer2 => 2,
            MpegLayer::Layer1 => 3,
        }
    }
}

/// The joint-stereo coding mode in effect, decoded from the mode-extension bits. Only meaningful
/// when `channel_mode_raw == 1` (joint stereo).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JointStereoMode {
    /// Layer 3's mode extension independently toggles mid-side and intensity stereo coding.
    Layer3 { mid_side: bool, intensity: bool },
    /// Layers 1 and 2 use only intensity stereo, with the mode extension selecting the lowest
    /// sub-band it applies to.
    Intensity { bound: u32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo(JointStereoMode),
    DualMono,
    Mono,
}

impl ChannelMode {
    pub fn channels(&self) -> usize {
        match self {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }

    /// The header's raw 2-bit channel-mode value: `0` stereo, `1` joint stereo, `2` dual mono,
    /// `3` mono. Side-info and protected-bit tables are indexed by whether this equals `3`.
    pub fn raw(&self) -> u8 {
        match self {
            ChannelMode::Stereo => 0,
            ChannelMode::JointStereo(_) => 1,
            ChannelMode::DualMono => 2,
            ChannelMode::Mono => 3,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Emphasis {
    None,
    Fifty15,
    CcitJ17,
}

/// A decoded MPEG audio frame header, retaining the raw field values needed to [`encode`] it back
/// to the same 4 bytes.
///
/// [`encode`]: FrameHeader::encode
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: MpegLayer,
    pub has_crc: bool,
    pub bitrate_index: u8,
    pub sample_rate_idx: u8,
    pub has_padding: bool,
    pub private_bit: bool,
    pub channel_mode: ChannelMode,
    pub is_copyrighted: bool,
    pub is_original: bool,
    pub emphasis: Emphasis,
}

impl FrameHeader {
    /// Decodes a 4-byte frame header word. Succeeds for a free-format bit-rate index (`0`); the
    /// caller must discover the frame size by other means (see
    /// [`tables::min_bitrate_index`](crate::tables::min_bitrate_index) and the physical frame
    /// sync's resync-driven free-format search).
    pub fn decode(bytes: [u8; 4]) -> Result<FrameHeader> {
        let sync = SYNC.get(&bytes)?;
        if sync != 0x7ff {
            return decode_error("frame header sync word not found");
        }

        let version = MpegVersion::from_index(VERSION.get(&bytes)? as u8)?;
        let layer = MpegLayer::from_index(LAYER.get(&bytes)? as u8)?;
        let has_crc = PROTECTION_BIT.get(&bytes)? == 0;
        let bitrate_index = BITRATE_INDEX.get(&bytes)? as u8;
        if bitrate_index == 15 {
            return reserved_error("reserved bit-rate index");
        }

        let sample_rate_idx = SAMPLERATE_INDEX.get(&bytes)? as u8;
        if sample_rate_idx == 3 {
            return reserved_error("reserved sample-rate index");
        }

        let has_padding = PADDING_BIT.get(&bytes)? != 0;
        let private_bit = PRIVATE_BIT.get(&bytes)? != 0;

        let channel_mode_raw = CHANNEL_MODE.get(&bytes)? as u8;
        let mode_ext = MODE_EXTENSION.get(&bytes)?;
        let channel_mode = match channel_mode_raw {
            0 => ChannelMode::Stereo,
            2 => ChannelMode::DualMono,
            3 => ChannelMode::Mono,
            1 if layer == MpegLayer::Layer3 => ChannelMode::JointStereo(JointStereoMode::Layer3 {
                mid_side: mode_ext & 0x2 != 0,
                intensity: mode_ext & 0x1 != 0,
            }),
            1 => ChannelMode::JointStereo(JointStereoMode::Intensity {
                bound: (1 + mode_ext) << 2,
            }),
            _ => unreachable!(),
        };

        let is_copyrighted = COPYRIGHT_BIT.get(&bytes)? != 0;
        let is_original = ORIGINAL_BIT.get(&bytes)? != 0;
        let emphasis = match EMPHASIS.get(&bytes)? {
            1 => Emphasis::Fifty15,
            3 => Emphasis::CcitJ17,
            2 => return reserved_error("reserved emphasis value"),
            _ => Emphasis::None,
        };

        let header = FrameHeader {
            version,
            layer,
            has_crc,
            bitrate_index,
            sample_rate_idx,
            has_padding,
            private_bit,
            channel_mode,
            is_copyrighted,
            is_original,
            emphasis,
        };

        header.check_layer2_bitrate()?;

        Ok(header)
    }

    /// Some Layer 2 channel-mode/bit-rate combinations are disallowed by the format.
    fn check_layer2_bitrate(&self) -> Result<()> {
        if self.layer != MpegLayer::Layer2 {
            return Ok(());
        }

        let bitrate = match self.bitrate()? {
            Some(br) => br,
            None => return Ok(()),
        };

        let mono = self.channel_mode == ChannelMode::Mono;
        let disallowed_mono = [224_000, 256_000, 320_000, 384_000];
        let disallowed_other = [32_000, 48_000, 56_000, 80_000];

        let hit = if mono { disallowed_mono.contains(&bitrate) } else { disallowed_other.contains(&bitrate) };

        if hit {
            decode_error("invalid Layer 2 bit-rate for this channel mode")
        }
        else {
            Ok(())
        }
    }

    /// Encodes this header back into its 4-byte wire representation.
    pub fn encode(&self) -> [u8; 4] {
        let mut bytes = [0u8; 4];
        SYNC.set(&mut bytes, 0x7ff).unwrap();
        VERSION.set(&mut bytes, u32::from(self.version.index())).unwrap();
        LAYER.set(&mut bytes, u32::from(self.layer.index())).unwrap();
        PROTECTION_BIT.set(&mut bytes, u32::from(!self.has_crc)).unwrap();
        BITRATE_INDEX.set(&mut bytes, u32::from(self.bitrate_index)).unwrap();
        SAMPLERATE_INDEX.set(&mut bytes, u32::from(self.sample_rate_idx)).unwrap();
        PADDING_BIT.set(&mut bytes, u32::from(self.has_padding)).unwrap();
        PRIVATE_BIT.set(&mut bytes, u32::from(self.private_bit)).unwrap();
        CHANNEL_MODE.set(&mut bytes, u32::from(self.channel_mode.raw())).unwrap();

        let mode_ext = match self.channel_mode {
            ChannelMode::JointStereo(JointStereoMode::Layer3 { mid_side, intensity }) => {
                (u32::from(mid_side) << 1) | u32::from(intensity)
            }
            ChannelMode::JointStereo(JointStereoMode::Intensity { bound }) => (bound >> 2) - 1,
            _ => 0,
        };
        MODE_EXTENSION.set(&mut bytes, mode_ext).unwrap();

        COPYRIGHT_BIT.set(&mut bytes, u32::from(self.is_copyrighted)).unwrap();
        ORIGINAL_BIT.set(&mut bytes, u32::from(self.is_original)).unwrap();
        let emphasis = match self.emphasis {
            Emphasis::None => 0,
            Emphasis::Fifty15 => 1,
            Emphasis::CcitJ17 => 3,
        };
        EMPHASIS.set(&mut bytes, emphasis).unwrap();

        bytes
    }

    /// Bit-rate in bps, or `None` for a free-format header.
    pub fn bitrate(&self) -> Result<Option<u32>> {
        tables::bitrate(self.version.index(), self.layer.index(), self.bitrate_index)
    }

    pub fn sample_rate(&self) -> Result<u32> {
        tables::samplerate(self.version.index(), self.sample_rate_idx)
    }

    pub fn samples_per_frame(&self) -> Result<u32> {
        tables::samples_per_frame(self.version.index(), self.layer.index())
    }

    /// Frame size in bytes, header included, or `None` for a free-format header whose size can't
    /// be derived without locating the next frame.
    pub fn frame_size(&self) -> Result<Option<usize>> {
        tables::frame_size(
            self.version.index(),
            self.layer.index(),
            self.bitrate_index,
            self.sample_rate_idx,
            self.has_padding,
        )
    }

    pub fn is_free_format(&self) -> bool {
        self.bitrate_index == 0
    }

    /// Side-info size in bytes. Only meaningful for Layer 3.
    pub fn side_info_len(&self) -> usize {
        tables::side_info_size(self.version.index(), self.channel_mode.raw())
    }

    /// Number of Layer 3 granules per frame: 2 for MPEG 1, 1 for MPEG 2/2.5.
    pub fn n_granules(&self) -> usize {
        if self.version.is_lsf() {
            1
        }
        else {
            2
        }
    }

    pub fn n_channels(&self) -> usize {
        self.channel_mode.channels()
    }

    pub fn is_intensity_stereo(&self) -> bool {
        matches!(self.channel_mode, ChannelMode::JointStereo(_))
    }

    /// Duration of the frame's audio, in samples per channel.
    pub fn duration(&self) -> Result<u32> {
        self.samples_per_frame()
    }
}

/// Quickly checks whether a 32-bit big-endian header word may be valid, without fully decoding
/// it: rules out the reserved version, layer, bit-rate, and sample-rate values. Used to raise
/// confidence during sync-word scanning before a full [`FrameHeader::decode`] is attempted.
#[inline]
pub fn check_header(header: u32) -> bool {
    if (header >> 19) & 0x3 == 0x1 {
        return false;
    }
    if (header >> 17) & 0x3 == 0x0 {
        return false;
    }
    if (header >> 12) & 0xf == 0xf {
        return false;
    }
    if (header >> 10) & 0x3 == 0x3 {
        return false;
    }
    true
}

/// Returns `true` if the top 11 bits of `header` are the frame sync word.
#[inline(always)]
pub fn is_frame_header_word_synced(header: u32) -> bool {
    (header & SYNC_MASK) == SYNC_MASK
}

/// Reads a big-endian `u32` out of a 4-byte header word, for use with [`get_bits`]/[`set_bits`]
/// style helpers that expect a byte slice rather than field accessors.
pub fn header_word(bytes: [u8; 4]) -> u32 {
    u32::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header_bytes() -> [u8; 4] {
        // MPEG1, Layer3, has_crc, bitrate idx 9 (128kbps), samplerate idx 0 (44100), no padding,
        // stereo, no copyright/original, no emphasis.
        [0xff, 0xfa, 0x90, 0x00]
    }

    #[test]
    fn decodes_reference_header() {
        let header = FrameHeader::decode(sample_header_bytes()).unwrap();
        assert_eq!(header.version, MpegVersion::Mpeg1);
        assert_eq!(header.layer, MpegLayer::Layer3);
        assert!(header.has_crc);
        assert_eq!(header.channel_mode, ChannelMode::Stereo);
        assert_eq!(header.bitrate().unwrap(), Some(128_000));
        assert_eq!(header.sample_rate().unwrap(), 44_100);
        assert_eq!(header.frame_size().unwrap(), Some(417));
    }

    #[test]
    fn encode_round_trips_decode() {
        let bytes = sample_header_bytes();
        let header = FrameHeader::decode(bytes).unwrap();
        assert_eq!(header.encode(), bytes);
    }

    #[test]
    fn free_format_decodes_with_no_frame_size() {
        let mut bytes = sample_header_bytes();
        bytes[2] &= 0x0f; // zero the bitrate index
        let header = FrameHeader::decode(bytes).unwrap();
        assert!(header.is_free_format());
        assert_eq!(header.bitrate().unwrap(), None);
        assert_eq!(header.frame_size().unwrap(), None);
        assert_eq!(header.encode(), bytes);
    }

    #[test]
    fn rejects_bad_sync() {
        let mut bytes = sample_header_bytes();
        bytes[0] = 0x00;
        assert!(FrameHeader::decode(bytes).is_err());
    }

    #[test]
    fn rejects_reserved_bitrate_index() {
        let mut bytes = sample_header_bytes();
        bytes[2] |= 0xf0;
        assert!(FrameHeader::decode(bytes).is_err());
    }

    #[test]
    fn joint_stereo_layer3_round_trips() {
        let mut bytes = sample_header_bytes();
        bytes[3] = (bytes[3] & 0x3f) | (1 << 6); // channel_mode = joint stereo
        bytes[3] |= 0x30; // mode_ext = mid_side + intensity
        let header = FrameHeader::decode(bytes).unwrap();
        assert_eq!(
            header.channel_mode,
            ChannelMode::JointStereo(JointStereoMode::Layer3 { mid_side: true, intensity: true })
        );
        assert_eq!(header.encode(), bytes);
    }

    #[test]
    fn quick_check_rejects_reserved_fields() {
        assert!(!check_header(0xffe1_0000)); // reserved version
        assert!(!check_header(0xffe8_0000)); // reserved layer
        assert!(check_header(header_word(sample_header_bytes())));
    }
}
