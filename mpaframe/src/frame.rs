// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `MP3Frame`: a decoded frame's header, optional CRC, optional Layer 3 side info, and raw body,
//! with encode/decode and CRC-16 regeneration, plus VBR descriptor (Xing/Info/VBRI) location and
//! the `XingHeader` codec built on top of it.

use mpaframe_core::checksum::crc16;
use mpaframe_core::error::{decode_error, usage_error, Result};

use crate::header::{FrameHeader, MpegLayer, HEADER_LEN};
use crate::sideinfo::SideInfo;
use crate::tables;

/// A fully decoded MPEG audio frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MP3Frame {
    pub header: FrameHeader,
    pub crc16: Option<u16>,
    pub side_info: Option<SideInfo>,
    pub raw_body: Vec<u8>,
    /// `true` if this frame was recovered after a resync rather than found at the expected
    /// offset following the previous frame.
    pub resynced: bool,
    pub frame_number: u64,
    pub byte_position: u64,
}

impl MP3Frame {
    /// Total length in bytes: header + optional CRC + optional side info + body.
    pub fn len(&self) -> usize {
        HEADER_LEN + if self.crc16.is_some() { 2 } else { 0 } + self.side_info_len() + self.raw_body.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    fn side_info_len(&self) -> usize {
        self.side_info.as_ref().map_or(0, |si| si.len())
    }

    /// Encodes the frame back to bytes, recomputing the CRC if one is present.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.header.encode());

        if self.header.has_crc {
            let crc = self.calc_crc()?;
            out.extend_from_slice(&crc.to_be_bytes());
        }

        if let Some(si) = &self.side_info {
            out.extend_from_slice(si.as_bytes());
        }

        out.extend_from_slice(&self.raw_body);
        Ok(out)
    }

    /// Decodes a frame from `data`, which must hold at least `header.frame_size()` bytes (or, for
    /// a free-format header, at least `header_len + crc + side_info_len` plus whatever body the
    /// caller has already located via resync).
    pub fn decode(header: FrameHeader, data: &[u8]) -> Result<MP3Frame> {
        let mut pos = HEADER_LEN;

        let crc16 = if header.has_crc {
            if data.len() < pos + 2 {
                return decode_error("truncated frame: missing CRC");
            }
            let crc = u16::from_be_bytes([data[pos], data[pos + 1]]);
            pos += 2;
            Some(crc)
        }
        else {
            None
        };

        let side_info = if header.layer == MpegLayer::Layer3 {
            let len = header.side_info_len();
            if data.len() < pos + len {
                return decode_error("truncated frame: missing side info");
            }
            let si = SideInfo::for_header(&header, data[pos..pos + len].to_vec())?;
            pos += len;
            Some(si)
        }
        else {
            None
        };

        let raw_body = data[pos..].to_vec();

        Ok(MP3Frame {
            header,
            crc16,
            side_info,
            raw_body,
            resynced: false,
            frame_number: 0,
            byte_position: 0,
        })
    }

    /// Computes the CRC-16 that protects this frame, seeded per the format: header bytes 2-3,
    /// then layer-specific protected data (full side info for Layer 3; a fixed byte count for
    /// Layer 1; a fixed bit count, table-selected, for Layer 2).
    pub fn calc_crc(&self) -> Result<u16> {
        let header_bytes = self.header.encode();
        let mut crc = crc16::compute(&header_bytes[2..4], 0xffff);

        match self.header.layer {
            MpegLayer::Layer3 => {
                if let Some(si) = &self.side_info {
                    crc = crc16::compute(si.as_bytes(), crc);
                }
            }
            MpegLayer::Layer1 => {
                let n = tables::protected_byte_count(self.header.layer.index(), self.header.channel_mode.raw())? as usize;
                if self.raw_body.len() < n {
                    return decode_error("frame body too short for CRC-protected region");
                }
                crc = crc16::compute(&self.raw_body[..n], crc);
            }
            MpegLayer::Layer2 => {
                let n_bits = tables::protected_bit_count(
                    self.header.layer.index(),
                    self.header.bitrate_index,
                    self.header.sample_rate_idx,
                    self.header.channel_mode.raw(),
                )?;
                let n_bytes = (n_bits / 8) as usize;
                let rem_bits = n_bits % 8;
                if self.raw_body.len() < n_bytes + usize::from(rem_bits > 0) {
                    return decode_error("frame body too short for CRC-protected region");
                }
                crc = crc16::compute(&self.raw_body[..n_bytes], crc);
                if rem_bits > 0 {
                    crc = crc16::update_bits(crc, u32::from(self.raw_body[n_bytes]) >> (8 - rem_bits), rem_bits);
                }
            }
        }

        Ok(crc)
    }

    /// Logical view into the frame body that allows negative offsets reaching back into side
    /// info, for Layer 3 only (used by VBR-header detection, which can straddle the boundary
    /// when a CRC is present).
    pub fn get_body_at_offset(&self, offset: isize, len: usize) -> Result<Vec<u8>> {
        if offset >= 0 {
            let start = offset as usize;
            return self
                .raw_body
                .get(start..start + len)
                .map(<[u8]>::to_vec)
                .ok_or(())
                .or_else(|_| usage_error("offset/length out of range of raw_body"));
        }

        let si = self.side_info.as_ref().ok_or(()).or_else(|_| {
            usage_error("negative offsets are only valid for Layer 3 frames with side info")
        })?;
        let si_start = si.len() as isize + offset;
        if si_start < 0 {
            return usage_error("offset reaches before the start of side info");
        }

        let mut out = Vec::with_capacity(len);
        let si_bytes = si.as_bytes();
        let from_si = (si.len() - si_start as usize).min(len);
        out.extend_from_slice(&si_bytes[si_start as usize..si_start as usize + from_si]);
        let remaining = len - from_si;
        if remaining > 0 {
            out.extend_from_slice(
                self.raw_body
                    .get(..remaining)
                    .ok_or(())
                    .or_else(|_| usage_error("offset/length out of range of raw_body"))?,
            );
        }
        Ok(out)
    }

    pub fn set_body_at_offset(&mut self, offset: isize, data: &[u8]) -> Result<()> {
        if offset >= 0 {
            let start = offset as usize;
            let dst = self
                .raw_body
                .get_mut(start..start + data.len())
                .ok_or(())
                .or_else(|_| usage_error("offset/length out of range of raw_body"))?;
            dst.copy_from_slice(data);
            return Ok(());
        }

        let si_len = self.side_info_len();
        let si_start = si_len as isize + offset;
        if si_start < 0 {
            return usage_error("offset reaches before the start of side info");
        }
        let from_si = (si_len - si_start as usize).min(data.len());

        if let Some(si) = &mut self.side_info {
            si.as_bytes_mut()[si_start as usize..si_start as usize + from_si]
                .copy_from_slice(&data[..from_si]);
        }

        let remaining = data.len() - from_si;
        if remaining > 0 {
            let dst = self
                .raw_body
                .get_mut(..remaining)
                .ok_or(())
                .or_else(|_| usage_error("offset/length out of range of raw_body"))?;
            dst.copy_from_slice(&data[from_si..]);
        }
        Ok(())
    }

    /// Checks whether side info is all zero except possibly its last two bytes, the hallmark of
    /// an encoder that left the side-info field unused to carry a VBR descriptor tag instead.
    fn side_info_looks_unused(&self) -> bool {
        match &self.side_info {
            None => false,
            Some(si) => {
                let bytes = si.as_bytes();
                let check_len = bytes.len().saturating_sub(2);
                bytes[..check_len].iter().all(|&b| b == 0)
            }
        }
    }

    /// Looks for a Xing/Info or VBRI descriptor tag and returns its magic and the offset into
    /// `raw_body` where it starts (negative if it starts within side info).
    pub fn identify_vbr_header(&self) -> Option<(VbrKind, isize)> {
        if !self.side_info_looks_unused() {
            return None;
        }

        let crc_shift: isize = if self.header.has_crc { -2 } else { 0 };

        let vbri_offset = 32 + crc_shift;
        if let Ok(bytes) = self.get_body_at_offset(vbri_offset, 4) {
            if bytes == *b"VBRI" {
                return Some((VbrKind::Vbri, vbri_offset));
            }
        }

        for xing_offset in [0, crc_shift] {
            if let Ok(bytes) = self.get_body_at_offset(xing_offset, 4) {
                if &bytes == b"Xing" {
                    return Some((VbrKind::Xing, xing_offset));
                }
                if &bytes == b"Info" {
                    return Some((VbrKind::Info, xing_offset));
                }
            }
        }

        None
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VbrKind {
    Xing,
    Info,
    Vbri,
}

/// Xing flags bitfield (at body offset 4 of the tag): which optional fields follow the magic +
/// flags.
const XING_FRAME_COUNT_FLAG: u32 = 0x1;
const XING_BYTE_COUNT_FLAG: u32 = 0x2;
const XING_SEEK_TABLE_FLAG: u32 = 0x4;
const XING_QUALITY_FLAG: u32 = 0x8;
const XING_SEEK_TABLE_LEN: usize = 100;

/// A decoded Xing/Info VBR descriptor tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XingHeader {
    /// `true` for an "Info" tag (CBR stream annotated post-hoc), `false` for "Xing" (true VBR).
    pub cbr_mode: bool,
    pub frame_count: Option<u32>,
    pub byte_count: Option<u32>,
    pub seek_table: Option<[u8; XING_SEEK_TABLE_LEN]>,
    pub quality: Option<u32>,
    pub extended_data: Vec<u8>,
}

impl XingHeader {
    /// Decodes a Xing/Info tag located at `offset` within `frame`'s body (see
    /// [`MP3Frame::identify_vbr_header`]).
    pub fn decode(frame: &MP3Frame, offset: isize) -> Result<XingHeader> {
        let magic = frame.get_body_at_offset(offset, 4)?;
        let cbr_mode = match &magic[..] {
            b"Xing" => false,
            b"Info" => true,
            _ => return decode_error("not a Xing/Info tag"),
        };

        let flags_bytes = frame.get_body_at_offset(offset + 4, 4)?;
        let flags = u32::from_be_bytes([flags_bytes[0], flags_bytes[1], flags_bytes[2], flags_bytes[3]]);

        let mut pos = offset + 8;
        let mut read_u32 = |p: isize| -> Result<u32> {
            let b = frame.get_body_at_offset(p, 4)?;
            Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        };

        let frame_count = if flags & XING_FRAME_COUNT_FLAG != 0 {
            let v = read_u32(pos)?;
            pos += 4;
            Some(v)
        }
        else {
            None
        };

        let byte_count = if flags & XING_BYTE_COUNT_FLAG != 0 {
            let v = read_u32(pos)?;
            pos += 4;
            Some(v)
        }
        else {
            None
        };

        let seek_table = if flags & XING_SEEK_TABLE_FLAG != 0 {
            let bytes = frame.get_body_at_offset(pos, XING_SEEK_TABLE_LEN)?;
            pos += XING_SEEK_TABLE_LEN as isize;
            let mut table = [0u8; XING_SEEK_TABLE_LEN];
            table.copy_from_slice(&bytes);
            Some(table)
        }
        else {
            None
        };

        let quality = if flags & XING_QUALITY_FLAG != 0 {
            let v = read_u32(pos)?;
            pos += 4;
            Some(v)
        }
        else {
            None
        };

        let body_len = frame.raw_body.len() as isize;
        let extended_data = if pos < body_len {
            frame.get_body_at_offset(pos, (body_len - pos) as usize)?
        }
        else {
            Vec::new()
        };

        Ok(XingHeader { cbr_mode, frame_count, byte_count, seek_table, quality, extended_data })
    }

    /// Encodes this header into `frame` at `offset`, returning the offset of `extended_data`
    /// within `frame.raw_body`.
    pub fn encode(&self, frame: &mut MP3Frame, offset: isize) -> Result<usize> {
        let magic: &[u8; 4] = if self.cbr_mode { b"Info" } else { b"Xing" };
        frame.set_body_at_offset(offset, magic)?;

        let mut flags = 0u32;
        if self.frame_count.is_some() {
            flags |= XING_FRAME_COUNT_FLAG;
        }
        if self.byte_count.is_some() {
            flags |= XING_BYTE_COUNT_FLAG;
        }
        if self.seek_table.is_some() {
            flags |= XING_SEEK_TABLE_FLAG;
        }
        if self.quality.is_some() {
            flags |= XING_QUALITY_FLAG;
        }
        frame.set_body_at_offset(offset + 4, &flags.to_be_bytes())?;

        let mut pos = offset + 8;
        if let Some(v) = self.frame_count {
            frame.set_body_at_offset(pos, &v.to_be_bytes())?;
            pos += 4;
        }
        if let Some(v) = self.byte_count {
            frame.set_body_at_offset(pos, &v.to_be_bytes())?;
            pos += 4;
        }
        if let Some(table) = &self.seek_table {
            frame.set_body_at_offset(pos, table)?;
            pos += XING_SEEK_TABLE_LEN as isize;
        }
        if let Some(v) = self.quality {
            frame.set_body_at_offset(pos, &v.to_be_bytes())?;
            pos += 4;
        }

        if !self.extended_data.is_empty() {
            frame.set_body_at_offset(pos, &self.extended_data)?;
        }

        Ok(pos as usize)
    }
}
