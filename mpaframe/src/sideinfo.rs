// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layer 3 side-information: the `main_data_begin` bit-reservoir back-reference, per-channel
//! scale-factor selection info, and the per-granule fields (`part2_3_length`, `big_values`,
//! `global_gain`, ...) that drive Huffman decoding of the reservoir's main data.
//!
//! Side info is a fixed-size, densely bit-packed structure whose exact layout depends on the
//! MPEG version (MPEG 1 vs. the "LSF" MPEG 2/2.5 layout) and the channel count. Rather than a
//! distinct type per combination, [`SideInfo`] wraps the raw bytes and computes each field's bit
//! offset from `lsf`/`mono` on access.

use mpaframe_core::error::{usage_error, Result};
use mpaframe_core::io::bitfield::{get_bits, set_bits, BitField};

use crate::header::{ChannelMode, FrameHeader, MpegVersion};
use crate::tables::side_info_bit_offsets;

/// Whether `blocksplit_flag` selects the "long block" (`0`) or "short/mixed block" (`1`) field
/// layout for a granule's block-type-dependent fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockSplit {
    Long,
    Short,
}

/// The `region_address`/`table_select` fields that apply to a long-block (`blocksplit_flag == 0`)
/// granule.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LongBlockData {
    pub table_select: [u32; 3],
    pub region_address1: u32,
    pub region_address2: u32,
}

/// The `block_type`/`subblock_gain`/`table_select` fields that apply to a short- or mixed-block
/// (`blocksplit_flag == 1`) granule.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShortBlockData {
    pub block_type: u32,
    pub switch_point: bool,
    pub table_select: [u32; 2],
    pub subblock_gain: [u32; 3],
}

/// The block-type-dependent fields of a granule, selected by `blocksplit_flag`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockData {
    Long(LongBlockData),
    Short(ShortBlockData),
}

struct GranuleLayout {
    part2_3_length: BitField,
    big_values: BitField,
    global_gain: BitField,
    scalefac_compress: BitField,
    blocksplit_flag: BitField,
    table_select_long: BitField,
    region_address1: BitField,
    region_address2: BitField,
    block_type: BitField,
    switch_point: BitField,
    table_select_short: BitField,
    subblock_gain: BitField,
    preflag: Option<BitField>,
    scalefac_scale: BitField,
    count1table_select: BitField,
}

fn granule_layout(base: usize, lsf: bool) -> GranuleLayout {
    let scalefac_compress_width = if lsf { 9 } else { 4 };

    let part2_3_length = BitField::new(base, 12);
    let big_values = BitField::new(base + 12, 9);
    let global_gain = BitField::new(base + 21, 8);
    let scalefac_compress = BitField::new(base + 29, scalefac_compress_width);
    let blocksplit_flag_offset = base + 29 + scalefac_compress_width as usize;
    let blocksplit_flag = BitField::new(blocksplit_flag_offset, 1);

    let blockdata_offset = blocksplit_flag_offset + 1;
    let table_select_long = BitField::new(blockdata_offset, 15);
    let region_address1 = BitField::new(blockdata_offset + 15, 4);
    let region_address2 = BitField::new(blockdata_offset + 19, 3);
    let block_type = BitField::new(blockdata_offset, 2);
    let switch_point = BitField::new(blockdata_offset + 2, 1);
    let table_select_short = BitField::new(blockdata_offset + 3, 10);
    let subblock_gain = BitField::new(blockdata_offset + 13, 9);

    let after_blockdata = blockdata_offset + 22;
    let preflag = if lsf { None } else { Some(BitField::new(after_blockdata, 1)) };
    let scalefac_scale_offset = after_blockdata + if lsf { 0 } else { 1 };
    let scalefac_scale = BitField::new(scalefac_scale_offset, 1);
    let count1table_select = BitField::new(scalefac_scale_offset + 1, 1);

    GranuleLayout {
        part2_3_length,
        big_values,
        global_gain,
        scalefac_compress,
        blocksplit_flag,
        table_select_long,
        region_address1,
        region_address2,
        block_type,
        switch_point,
        table_select_short,
        subblock_gain,
        preflag,
        scalefac_scale,
        count1table_select,
    }
}

fn unpack_array(value: u32, bits: u32, count: usize) -> Vec<u32> {
    let mask = (1u32 << bits) - 1;
    (0..count)
        .map(|i| {
            let shift = bits * (count as u32 - 1 - i as u32);
            (value >> shift) & mask
        })
        .collect()
}

fn pack_array(values: &[u32], bits: u32) -> u32 {
    values.iter().fold(0u32, |acc, &v| (acc << bits) | (v & ((1 << bits) - 1)))
}

/// Layer 3 side information for one frame, backed by its raw packed bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SideInfo {
    lsf: bool,
    mono: bool,
    raw: Vec<u8>,
}

impl SideInfo {
    /// Builds a zeroed side-info buffer sized for `version`/`channel_mode`.
    pub fn new(version: MpegVersion, channel_mode: &ChannelMode) -> SideInfo {
        let lsf = version.is_lsf();
        let mono = channel_mode.raw() == 3;
        let len = crate::tables::side_info_size(version.index(), channel_mode.raw());
        SideInfo { lsf, mono, raw: vec![0u8; len] }
    }

    /// Wraps `raw` as side info for `version`/`channel_mode`, validating its length.
    pub fn from_bytes(version: MpegVersion, channel_mode: &ChannelMode, raw: Vec<u8>) -> Result<SideInfo> {
        let expected = crate::tables::side_info_size(version.index(), channel_mode.raw());
        if raw.len() != expected {
            return usage_error("side-info buffer length does not match version/channel mode");
        }
        Ok(SideInfo { lsf: version.is_lsf(), mono: channel_mode.raw() == 3, raw })
    }

    /// Builds side info sized and shaped for `header`.
    pub fn for_header(header: &FrameHeader, raw: Vec<u8>) -> Result<SideInfo> {
        SideInfo::from_bytes(header.version, &header.channel_mode, raw)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn n_channels(&self) -> usize {
        if self.mono {
            1
        }
        else {
            2
        }
    }

    pub fn n_granules(&self) -> usize {
        if self.lsf {
            1
        }
        else {
            2
        }
    }

    fn main_data_begin_field(&self) -> BitField {
        BitField::new(0, if self.lsf { 8 } else { 9 })
    }

    pub fn main_data_begin(&self) -> Result<u32> {
        self.main_data_begin_field().get(&self.raw)
    }

    pub fn set_main_data_begin(&mut self, value: u32) -> Result<()> {
        let field = self.main_data_begin_field();
        field.set(&mut self.raw, value)
    }

    fn private_bits_field(&self) -> BitField {
        let offset = if self.lsf { 8 } else { 9 };
        let width = match (self.lsf, self.mono) {
            (false, true) => 5,
            (false, false) => 3,
            (true, true) => 1,
            (true, false) => 2,
        };
        BitField::new(offset, width)
    }

    pub fn private_bits(&self) -> Result<u32> {
        self.private_bits_field().get(&self.raw)
    }

    pub fn set_private_bits(&mut self, value: u32) -> Result<()> {
        let field = self.private_bits_field();
        field.set(&mut self.raw, value)
    }

    fn scfsi_offset(&self, chan: usize) -> Result<usize> {
        if self.lsf {
            return usage_error("scfsi is only present in MPEG 1 side info");
        }
        match (self.mono, chan) {
            (true, 0) => Ok(14),
            (false, 0) => Ok(12),
            (false, 1) => Ok(16),
            _ => usage_error("channel index out of range"),
        }
    }

    /// Per-scale-factor-band-group selective information, carried forward from the previous
    /// granule when `true`. Not present in MPEG 2/2.5 (LSF) side info.
    pub fn scfsi(&self, chan: usize) -> Result<[bool; 4]> {
        let offset = self.scfsi_offset(chan)?;
        let bits = get_bits(&self.raw, offset, 4)?;
        Ok([bits & 0x8 != 0, bits & 0x4 != 0, bits & 0x2 != 0, bits & 0x1 != 0])
    }

    pub fn set_scfsi(&mut self, chan: usize, bands: [bool; 4]) -> Result<()> {
        let offset = self.scfsi_offset(chan)?;
        let bits = bands.iter().fold(0u32, |acc, &b| (acc << 1) | u32::from(b));
        set_bits(&mut self.raw, offset, 4, bits)
    }

    fn granule_base(&self, chan: usize, gran: usize) -> Result<usize> {
        let n_chan = self.n_channels();
        if chan >= n_chan || gran >= self.n_granules() {
            return usage_error("channel/granule index out of range for this side info");
        }
        let offsets = side_info_bit_offsets(if self.lsf { 2 } else { 3 }, if self.mono { 3 } else { 0 });
        Ok(offsets[gran * n_chan + chan])
    }

    fn layout(&self, chan: usize, gran: usize) -> Result<GranuleLayout> {
        let base = self.granule_base(chan, gran)?;
        Ok(granule_layout(base, self.lsf))
    }

    pub fn part2_3_length(&self, chan: usize, gran: usize) -> Result<u32> {
        self.layout(chan, gran)?.part2_3_length.get(&self.raw)
    }

    pub fn set_part2_3_length(&mut self, chan: usize, gran: usize, value: u32) -> Result<()> {
        let layout = self.layout(chan, gran)?;
        layout.part2_3_length.set(&mut self.raw, value)
    }

    pub fn big_values(&self, chan: usize, gran: usize) -> Result<u32> {
        self.layout(chan, gran)?.big_values.get(&self.raw)
    }

    pub fn set_big_values(&mut self, chan: usize, gran: usize, value: u32) -> Result<()> {
        let layout = self.layout(chan, gran)?;
        layout.big_values.set(&mut self.raw, value)
    }

    pub fn global_gain(&self, chan: usize, gran: usize) -> Result<u32> {
        self.layout(chan, gran)?.global_gain.get(&self.raw)
    }

    pub fn set_global_gain(&mut self, chan: usize, gran: usize, value: u32) -> Result<()> {
        let layout = self.layout(chan, gran)?;
        layout.global_gain.set(&mut self.raw, value)
    }

    pub fn scalefac_compress(&self, chan: usize, gran: usize) -> Result<u32> {
        self.layout(chan, gran)?.scalefac_compress.get(&self.raw)
    }

    pub fn set_scalefac_compress(&mut self, chan: usize, gran: usize, value: u32) -> Result<()> {
        let layout = self.layout(chan, gran)?;
        layout.scalefac_compress.set(&mut self.raw, value)
    }

    pub fn blocksplit_flag(&self, chan: usize, gran: usize) -> Result<BlockSplit> {
        let bit = self.layout(chan, gran)?.blocksplit_flag.get(&self.raw)?;
        Ok(if bit == 0 { BlockSplit::Long } else { BlockSplit::Short })
    }

    pub fn set_blocksplit_flag(&mut self, chan: usize, gran: usize, split: BlockSplit) -> Result<()> {
        let layout = self.layout(chan, gran)?;
        layout.blocksplit_flag.set(&mut self.raw, u32::from(matches!(split, BlockSplit::Short)))
    }

    /// Reads the block-type-dependent fields, dispatching on `blocksplit_flag`.
    pub fn block_data(&self, chan: usize, gran: usize) -> Result<BlockData> {
        let layout = self.layout(chan, gran)?;
        match self.blocksplit_flag(chan, gran)? {
            BlockSplit::Long => {
                let table_select_raw = layout.table_select_long.get(&self.raw)?;
                let table_select = unpack_array(table_select_raw, 5, 3);
                Ok(BlockData::Long(LongBlockData {
                    table_select: [table_select[0], table_select[1], table_select[2]],
                    region_address1: layout.region_address1.get(&self.raw)?,
                    region_address2: layout.region_address2.get(&self.raw)?,
                }))
            }
            BlockSplit::Short => {
                let table_select_raw = layout.table_select_short.get(&self.raw)?;
                let table_select = unpack_array(table_select_raw, 5, 2);
                let subblock_gain_raw = layout.subblock_gain.get(&self.raw)?;
                let subblock_gain = unpack_array(subblock_gain_raw, 3, 3);
                Ok(BlockData::Short(ShortBlockData {
                    block_type: layout.block_type.get(&self.raw)?,
                    switch_point: layout.switch_point.get(&self.raw)? != 0,
                    table_select: [table_select[0], table_select[1]],
                    subblock_gain: [subblock_gain[0], subblock_gain[1], subblock_gain[2]],
                }))
            }
        }
    }

    /// Writes the block-type-dependent fields, also updating `blocksplit_flag` to match.
    pub fn set_block_data(&mut self, chan: usize, gran: usize, data: BlockData) -> Result<()> {
        let layout = self.layout(chan, gran)?;
        match data {
            BlockData::Long(d) => {
                layout.blocksplit_flag.set(&mut self.raw, 0)?;
                layout.table_select_long.set(&mut self.raw, pack_array(&d.table_select, 5))?;
                layout.region_address1.set(&mut self.raw, d.region_address1)?;
                layout.region_address2.set(&mut self.raw, d.region_address2)?;
            }
            BlockData::Short(d) => {
                layout.blocksplit_flag.set(&mut self.raw, 1)?;
                layout.block_type.set(&mut self.raw, d.block_type)?;
                layout.switch_point.set(&mut self.raw, u32::from(d.switch_point))?;
                layout.table_select_short.set(&mut self.raw, pack_array(&d.table_select, 5))?;
                layout.subblock_gain.set(&mut self.raw, pack_array(&d.subblock_gain, 3))?;
            }
        }
        Ok(())
    }

    /// `true` unless this granule rescales via the pre-emphasis table. Not present for LSF side
    /// info, where accessing it is a usage error.
    pub fn preflag(&self, chan: usize, gran: usize) -> Result<bool> {
        let layout = self.layout(chan, gran)?;
        match layout.preflag {
            Some(field) => Ok(field.get(&self.raw)? != 0),
            None => usage_error("preflag is not present in LSF (MPEG 2/2.5) side info"),
        }
    }

    pub fn set_preflag(&mut self, chan: usize, gran: usize, value: bool) -> Result<()> {
        let layout = self.layout(chan, gran)?;
        match layout.preflag {
            Some(field) => field.set(&mut self.raw, u32::from(value)),
            None => usage_error("preflag is not present in LSF (MPEG 2/2.5) side info"),
        }
    }

    pub fn scalefac_scale(&self, chan: usize, gran: usize) -> Result<bool> {
        Ok(self.layout(chan, gran)?.scalefac_scale.get(&self.raw)? != 0)
    }

    pub fn set_scalefac_scale(&mut self, chan: usize, gran: usize, value: bool) -> Result<()> {
        let layout = self.layout(chan, gran)?;
        layout.scalefac_scale.set(&mut self.raw, u32::from(value))
    }

    pub fn count1table_select(&self, chan: usize, gran: usize) -> Result<u32> {
        self.layout(chan, gran)?.count1table_select.get(&self.raw)
    }

    pub fn set_count1table_select(&mut self, chan: usize, gran: usize, value: u32) -> Result<()> {
        let layout = self.layout(chan, gran)?;
        layout.count1table_select.set(&mut self.raw, value)
    }

    /// Number of whole bytes of bit-reservoir main data this frame's side info accounts for,
    /// across every channel and granule.
    pub fn part2_3_bytes(&self) -> Result<usize> {
        let mut total = 0u32;
        for chan in 0..self.n_channels() {
            for gran in 0..self.n_granules() {
                total += self.part2_3_length(chan, gran)?;
            }
        }
        Ok(((total + 7) / 8) as usize)
    }

    /// The byte offset, within the reassembled bit reservoir, where this frame's own main data
    /// ends. Negative when `main_data_begin` reaches back further than this frame's own
    /// contribution covers.
    pub fn part2_3_end(&self) -> Result<isize> {
        Ok(self.part2_3_bytes()? as isize - self.main_data_begin()? as isize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{ChannelMode, MpegVersion};

    #[test]
    fn mpeg1_stereo_round_trips_every_field() {
        let mut si = SideInfo::new(MpegVersion::Mpeg1, &ChannelMode::Stereo);
        si.set_main_data_begin(100).unwrap();
        si.set_private_bits(0b101).unwrap();
        si.set_scfsi(0, [true, false, true, false]).unwrap();
        si.set_scfsi(1, [false, true, false, true]).unwrap();

        for chan in 0..2 {
            for gran in 0..2 {
                si.set_part2_3_length(chan, gran, 500 + chan as u32 * 10 + gran as u32).unwrap();
                si.set_big_values(chan, gran, 200).unwrap();
                si.set_global_gain(chan, gran, 140).unwrap();
                si.set_scalefac_compress(chan, gran, 5).unwrap();
                si.set_preflag(chan, gran, true).unwrap();
                si.set_scalefac_scale(chan, gran, false).unwrap();
                si.set_count1table_select(chan, gran, 1).unwrap();
            }
        }

        si.set_block_data(
            0,
            0,
            BlockData::Long(LongBlockData { table_select: [1, 2, 3], region_address1: 9, region_address2: 5 }),
        )
        .unwrap();
        si.set_block_data(
            1,
            1,
            BlockData::Short(ShortBlockData {
                block_type: 2,
                switch_point: true,
                table_select: [4, 7],
                subblock_gain: [1, 2, 3],
            }),
        )
        .unwrap();

        assert_eq!(si.main_data_begin().unwrap(), 100);
        assert_eq!(si.private_bits().unwrap(), 0b101);
        assert_eq!(si.scfsi(0).unwrap(), [true, false, true, false]);
        assert_eq!(si.scfsi(1).unwrap(), [false, true, false, true]);
        assert_eq!(si.part2_3_length(1, 0).unwrap(), 510);
        assert_eq!(si.global_gain(0, 1).unwrap(), 140);
        assert!(si.preflag(0, 0).unwrap());
        assert_eq!(si.count1table_select(1, 1).unwrap(), 1);

        match si.block_data(0, 0).unwrap() {
            BlockData::Long(d) => {
                assert_eq!(d.table_select, [1, 2, 3]);
                assert_eq!(d.region_address1, 9);
                assert_eq!(d.region_address2, 5);
            }
            BlockData::Short(_) => panic!("expected long block data"),
        }

        match si.block_data(1, 1).unwrap() {
            BlockData::Short(d) => {
                assert_eq!(d.block_type, 2);
                assert!(d.switch_point);
                assert_eq!(d.table_select, [4, 7]);
                assert_eq!(d.subblock_gain, [1, 2, 3]);
            }
            BlockData::Long(_) => panic!("expected short block data"),
        }
    }

    #[test]
    fn lsf_mono_has_one_granule_and_no_scfsi() {
        let mut si = SideInfo::new(MpegVersion::Mpeg2, &ChannelMode::Mono);
        assert_eq!(si.n_granules(), 1);
        assert_eq!(si.n_channels(), 1);
        assert!(si.scfsi(0).is_err());

        si.set_part2_3_length(0, 0, 600).unwrap();
        si.set_scalefac_compress(0, 0, 300).unwrap();
        assert_eq!(si.scalefac_compress(0, 0).unwrap(), 300);
        assert!(si.preflag(0, 0).is_err());
    }

    #[test]
    fn part2_3_bytes_sums_every_granule_and_channel() {
        let mut si = SideInfo::new(MpegVersion::Mpeg1, &ChannelMode::Mono);
        si.set_part2_3_length(0, 0, 100).unwrap();
        si.set_part2_3_length(0, 1, 103).unwrap();
        assert_eq!(si.part2_3_bytes().unwrap(), (100 + 103 + 7) / 8);

        si.set_main_data_begin(5).unwrap();
        assert_eq!(si.part2_3_end().unwrap(), si.part2_3_bytes().unwrap() as isize - 5);
    }

    #[test]
    fn out_of_range_granule_is_usage_error() {
        let si = SideInfo::new(MpegVersion::Mpeg1, &ChannelMode::Mono);
        assert!(si.part2_3_length(0, 1).is_err());
        assert!(si.part2_3_length(1, 0).is_err());
    }

    #[test]
    fn from_bytes_validates_length() {
        let too_short = vec![0u8; 4];
        assert!(SideInfo::from_bytes(MpegVersion::Mpeg1, &ChannelMode::Stereo, too_short).is_err());
        let right_size = vec![0u8; 32];
        assert!(SideInfo::from_bytes(MpegVersion::Mpeg1, &ChannelMode::Stereo, right_size).is_ok());
    }
}
