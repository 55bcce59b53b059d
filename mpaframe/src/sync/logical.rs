// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `LogicalFrameSync`: wraps [`PhysicalFrameSync`] and reassembles Layer 3's bit reservoir, so
//! each emitted frame's main data is the logical payload decoding actually needs rather than the
//! raw per-frame body the wire format splits it into.

use mpaframe_core::error::Result;

use crate::frame::MP3Frame;
use crate::header::MpegLayer;
use crate::sync::physical::{CommentTag, PhysicalFrameSync, ReadItem as PhysicalItem, SyncConfig};

/// Reconstructs Layer 3's bit reservoir across frames. Kept separate from [`LogicalFrameSync`]
/// so the reassembly rule itself can be tested against raw bodies without a full sync pipeline.
#[derive(Default)]
pub struct LogicalFrameAssembler {
    reservoir: Vec<u8>,
    last_end: isize,
    ancillary_skipped: isize,
}

/// A reassembled logical frame: `main_data` is the reservoir-joined Layer 3 payload (or, for
/// Layer 1/2, simply the frame's own body), `None` if the reservoir couldn't supply enough bytes.
pub struct LogicalFrame {
    pub frame: MP3Frame,
    pub main_data: Option<Vec<u8>>,
    pub ancillary_skipped: isize,
}

impl LogicalFrameAssembler {
    pub fn new() -> LogicalFrameAssembler {
        LogicalFrameAssembler { reservoir: Vec::new(), last_end: 0, ancillary_skipped: 0 }
    }

    /// Folds one physical frame into the reservoir and returns its reassembled logical frame.
    pub fn push(&mut self, frame: MP3Frame) -> Result<LogicalFrame> {
        if frame.header.layer != MpegLayer::Layer3 {
            let ancillary_skipped = self.reservoir.len() as isize - self.last_end;
            self.reservoir.clear();
            self.last_end = 0;
            self.ancillary_skipped = 0;
            return Ok(LogicalFrame { main_data: Some(frame.raw_body.clone()), frame, ancillary_skipped });
        }

        let si = frame.side_info.as_ref().expect("Layer 3 frame always carries side info");
        let begin = si.main_data_begin()? as usize;
        let main_len = si.part2_3_bytes()?;
        let end: isize = main_len as isize - begin as isize;

        let main_data = if begin > self.reservoir.len() {
            None
        }
        else if end > frame.raw_body.len() as isize {
            None
        }
        else if end < 0 {
            let res_len = self.reservoir.len();
            let start = res_len - begin;
            let stop = (res_len as isize + end) as usize;
            Some(self.reservoir[start..stop].to_vec())
        }
        else if begin > 0 {
            let res_len = self.reservoir.len();
            let mut data = self.reservoir[res_len - begin..].to_vec();
            data.extend_from_slice(&frame.raw_body[..end as usize]);
            Some(data)
        }
        else {
            Some(frame.raw_body[..end as usize].to_vec())
        };

        self.ancillary_skipped = (self.reservoir.len() as isize - self.last_end) - begin as isize;

        if frame.raw_body.len() >= 511 || self.reservoir.is_empty() {
            self.reservoir = frame.raw_body.clone();
        }
        else {
            if self.reservoir.len() + frame.raw_body.len() > 4096 {
                let keep = (511usize.saturating_sub(frame.raw_body.len())).max(1);
                let trim_from = self.reservoir.len().saturating_sub(keep);
                self.reservoir.drain(0..trim_from);
            }
            self.reservoir.extend_from_slice(&frame.raw_body);
        }

        self.last_end = match &main_data {
            None => self.last_end - frame.raw_body.len() as isize,
            Some(data) => frame.raw_body.len() as isize - (data.len() as isize - end),
        };

        let ancillary_skipped = self.ancillary_skipped;
        Ok(LogicalFrame { frame, main_data, ancillary_skipped })
    }
}

/// One item emitted by [`LogicalFrameSync::read_item`].
pub enum ReadItem {
    Frame(LogicalFrame),
    Tag(CommentTag),
    Garbage(Vec<u8>),
    NeedData,
}

/// Wraps [`PhysicalFrameSync`], reassembling every emitted Layer 3 frame's bit reservoir.
pub struct LogicalFrameSync {
    physical: PhysicalFrameSync,
    assembler: LogicalFrameAssembler,
}

impl Default for LogicalFrameSync {
    fn default() -> LogicalFrameSync {
        LogicalFrameSync::new(SyncConfig::default())
    }
}

impl LogicalFrameSync {
    pub fn new(config: SyncConfig) -> LogicalFrameSync {
        LogicalFrameSync { physical: PhysicalFrameSync::new(config), assembler: LogicalFrameAssembler::new() }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        self.physical.feed(bytes)
    }

    pub fn feed_eof(&mut self) {
        self.physical.feed_eof();
    }

    pub fn read_item(&mut self) -> Result<ReadItem> {
        match self.physical.read_item()? {
            PhysicalItem::Frame(frame) => {
                log::trace!("reassembling frame #{}", frame.frame_number);
                Ok(ReadItem::Frame(self.assembler.push(frame)?))
            }
            PhysicalItem::Tag(tag) => Ok(ReadItem::Tag(tag)),
            PhysicalItem::Garbage(bytes) => Ok(ReadItem::Garbage(bytes)),
            PhysicalItem::NeedData => Ok(ReadItem::NeedData),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{ChannelMode, FrameHeader, MpegVersion};
    use crate::sideinfo::SideInfo;

    fn l3_header() -> FrameHeader {
        FrameHeader::decode([0xff, 0xfa, 0x90, 0x00]).unwrap()
    }

    fn frame_with_reservoir(main_data_begin: u32, part2_3_len_bits: u32, body: Vec<u8>) -> MP3Frame {
        let header = l3_header();
        let mut si = SideInfo::new(MpegVersion::Mpeg1, &ChannelMode::Stereo);
        si.set_main_data_begin(main_data_begin).unwrap();
        si.set_part2_3_length(0, 0, part2_3_len_bits).unwrap();
        MP3Frame {
            header,
            crc16: Some(0),
            side_info: Some(si),
            raw_body: body,
            resynced: false,
            frame_number: 0,
            byte_position: 0,
        }
    }

    #[test]
    fn first_frame_with_no_back_reference_uses_its_own_body() {
        let mut assembler = LogicalFrameAssembler::new();
        let body = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let logical = assembler.push(frame_with_reservoir(0, 8 * 8, body.clone())).unwrap();
        assert_eq!(logical.main_data, Some(body));
    }

    #[test]
    fn second_frame_reaches_back_into_the_reservoir() {
        let mut assembler = LogicalFrameAssembler::new();
        let first_body = vec![0xaa; 600];
        assembler.push(frame_with_reservoir(0, 600 * 8, first_body.clone())).unwrap();

        let second_body = vec![0xbbu8; 4];
        let logical = assembler.push(frame_with_reservoir(3, 7 * 8, second_body.clone())).unwrap();

        let expected: Vec<u8> = first_body[first_body.len() - 3..]
            .iter()
            .chain(second_body[..4].iter())
            .copied()
            .collect();
        assert_eq!(logical.main_data, Some(expected));
        // the first frame left last_end == reservoir.len() == 600, so a second frame reaching
        // back 3 bytes has *no* unused reservoir bytes left over: ancillary_skipped is negative.
        assert_eq!(logical.ancillary_skipped, -3);
    }

    #[test]
    fn insufficient_reservoir_yields_no_main_data() {
        let mut assembler = LogicalFrameAssembler::new();
        let logical = assembler.push(frame_with_reservoir(10, 8, vec![0u8; 4])).unwrap();
        assert!(logical.main_data.is_none());
        // empty reservoir (len 0, last_end 0) minus a main_data_begin of 10.
        assert_eq!(logical.ancillary_skipped, -10);
    }

    #[test]
    fn non_layer3_frame_reports_unused_reservoir_bytes() {
        let mut assembler = LogicalFrameAssembler::new();
        // leaves reservoir.len() == 4, last_end == -4 (see insufficient_reservoir_yields_no_main_data).
        assembler.push(frame_with_reservoir(10, 8, vec![0u8; 4])).unwrap();

        let mut header = l3_header();
        header.layer = crate::header::MpegLayer::Layer1;
        let frame = MP3Frame {
            header,
            crc16: None,
            side_info: None,
            raw_body: vec![1, 2, 3],
            resynced: false,
            frame_number: 0,
            byte_position: 0,
        };
        let logical = assembler.push(frame).unwrap();
        assert_eq!(logical.main_data, Some(vec![1, 2, 3]));
        assert_eq!(logical.frame.header.layer, crate::header::MpegLayer::Layer1);
        assert_eq!(logical.ancillary_skipped, 8);
    }
}
