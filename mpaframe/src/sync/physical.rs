// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `PhysicalFrameSync`: turns a [`BaseSync`] byte buffer into a stream of frames, tags, and
//! garbage runs, resolving free-format frame sizes by resyncing to the next matching header.

use mpaframe_core::error::{is_resync_signal, Result};
use mpaframe_metadata::{id3v1::id3v1_size, SizeDetect, TagKind};

use crate::frame::MP3Frame;
use crate::header::{FrameHeader, MpegLayer, HEADER_LEN, MAX_FRAME_SIZE};
use crate::sideinfo::SideInfo;
use crate::sync::base::{BaseSync, Identify};

/// A buffered byte run large enough that a free-format frame search giving up on it is assumed
/// to have locked onto noise rather than a real (if unusually long) frame.
const FREE_FORMAT_GIVE_UP: usize = 8192;

/// Options controlling resource bounds for the sync types in this module.
#[derive(Copy, Clone, Debug)]
pub struct SyncConfig {
    /// Upper bound on the internal buffer. If [`BaseSync::identify`](super::base::BaseSync::identify)
    /// stays `Undecided` once this many bytes are buffered, callers should treat it as an
    /// [`mpaframe_core::MpaError::ImplementationLimit`].
    pub max_buffer_size: usize,
}

impl Default for SyncConfig {
    fn default() -> SyncConfig {
        SyncConfig { max_buffer_size: 4 * 1024 * 1024 }
    }
}

/// A comment/tag prefix identified in the stream, with its raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentTag {
    pub kind: TagKind,
    pub bytes: Vec<u8>,
}

/// One item emitted by [`PhysicalFrameSync::read_item`].
#[derive(Debug)]
pub enum ReadItem {
    Frame(MP3Frame),
    Tag(CommentTag),
    Garbage(Vec<u8>),
    /// The caller must `feed` more bytes (or `feed_eof`) before another item can be produced.
    NeedData,
}

enum CreateOutcome {
    MoreData,
    Resync,
    Frame(MP3Frame, usize),
}

/// Turns a synchronized byte stream into a sequence of frames, interspersed tags, and garbage.
pub struct PhysicalFrameSync {
    base: BaseSync,
    config: SyncConfig,
    synced: bool,
    frames_returned: u64,
    /// `-1` autodetect, `0` disabled, `>0` known free-format unpadded frame size.
    base_framesize: isize,
}

impl Default for PhysicalFrameSync {
    fn default() -> PhysicalFrameSync {
        PhysicalFrameSync::new(SyncConfig::default())
    }
}

impl PhysicalFrameSync {
    pub fn new(config: SyncConfig) -> PhysicalFrameSync {
        PhysicalFrameSync {
            base: BaseSync::new(crate::header::SYNC_MASK, crate::header::SYNC_MASK),
            config,
            synced: true,
            frames_returned: 0,
            base_framesize: -1,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        self.base.feed(bytes)
    }

    pub fn feed_eof(&mut self) {
        self.base.feed_eof();
    }

    pub fn is_over_buffer_limit(&self) -> bool {
        self.base.len() >= self.config.max_buffer_size
    }

    /// Reads the next item from the stream. Returns [`ReadItem::NeedData`] when the caller must
    /// supply more bytes before another item can be decided.
    pub fn read_item(&mut self) -> Result<ReadItem> {
        match self.base.identify() {
            Identify::Undecided => Ok(ReadItem::NeedData),

            Identify::Tag(n, kind) => {
                if self.base.len() < n {
                    return Ok(ReadItem::NeedData);
                }
                let bytes = self.base.data()[..n].to_vec();
                self.base.advance(n)?;
                self.synced = true;
                log::debug!("identified {:?} tag, {} bytes", kind, n);
                Ok(ReadItem::Tag(CommentTag { kind, bytes }))
            }

            Identify::Garbage(n) => {
                let n = n.min(self.base.len());
                let bytes = self.base.data()[..n].to_vec();
                self.base.advance(n)?;
                self.synced = false;
                log::debug!("skipped {} bytes of garbage", n);
                Ok(ReadItem::Garbage(bytes))
            }

            Identify::Sync => match self.create_frame()? {
                CreateOutcome::MoreData if self.base.read_eof() => {
                    let n = self.base.len();
                    let bytes = self.base.data()[..n].to_vec();
                    self.base.advance(n)?;
                    self.synced = false;
                    Ok(ReadItem::Garbage(bytes))
                }
                CreateOutcome::MoreData => Ok(ReadItem::NeedData),
                CreateOutcome::Resync => {
                    let bytes = self.base.data()[..1].to_vec();
                    self.base.advance(1)?;
                    self.synced = false;
                    log::debug!("resync: dropped one byte at a false sync");
                    Ok(ReadItem::Garbage(bytes))
                }
                CreateOutcome::Frame(mut frame, size) => {
                    frame.resynced = !self.synced;
                    frame.frame_number = self.frames_returned;
                    frame.byte_position = self.base.bytes_returned();
                    self.base.advance(size)?;
                    self.synced = true;
                    self.frames_returned += 1;
                    log::trace!("emitting frame #{} at byte {}", frame.frame_number, frame.byte_position);
                    Ok(ReadItem::Frame(frame))
                }
            },
        }
    }

    fn build_frame(&self, header: &FrameHeader, size: usize) -> Result<MP3Frame> {
        MP3Frame::decode(*header, &self.base.data()[..size])
    }

    fn create_frame(&mut self) -> Result<CreateOutcome> {
        if self.base.len() < HEADER_LEN {
            return Ok(CreateOutcome::MoreData);
        }

        let word = [self.base.data()[0], self.base.data()[1], self.base.data()[2], self.base.data()[3]];
        let header = match FrameHeader::decode(word) {
            Ok(h) => h,
            Err(e) if is_resync_signal(&e) => return Ok(CreateOutcome::Resync),
            Err(e) => return Err(e),
        };

        let headsz = HEADER_LEN + if header.has_crc { 2 } else { 0 };
        let sidesz = if header.layer == MpegLayer::Layer3 { header.side_info_len() } else { 0 };

        if self.base.len() < headsz + sidesz {
            return Ok(CreateOutcome::MoreData);
        }

        if let Some(sz) = header.frame_size()? {
            if sz > MAX_FRAME_SIZE {
                // A non-free-format frame size can never legitimately exceed the largest size the
                // bitrate/samplerate tables can produce; seeing one means this sync word was a
                // false match rather than a real frame header.
                return Ok(CreateOutcome::Resync);
            }
            if self.base.len() < sz {
                return Ok(CreateOutcome::MoreData);
            }
            let frame = self.build_frame(&header, sz)?;
            return Ok(CreateOutcome::Frame(frame, sz));
        }

        self.create_free_format_frame(header, headsz, sidesz)
    }

    fn create_free_format_frame(&mut self, header: FrameHeader, headsz: usize, sidesz: usize) -> Result<CreateOutcome> {
        let sample_size: isize = if header.layer == MpegLayer::Layer1 { 4 } else { 1 };

        let part2_3_end = if header.layer == MpegLayer::Layer3 {
            let side_bytes = self.base.data()[headsz..headsz + sidesz].to_vec();
            let si = SideInfo::for_header(&header, side_bytes)?;
            si.part2_3_end()?
        }
        else {
            0
        };

        let search_start = headsz + sidesz + part2_3_end.max(0) as usize;
        let padding_bonus: isize = if header.has_padding { sample_size } else { 0 };

        let sz = if self.base_framesize > 0 {
            (self.base_framesize + padding_bonus) as usize
        }
        else if self.base_framesize == 0 {
            return Ok(CreateOutcome::Resync);
        }
        else {
            let reference = u32::from_be_bytes(header.encode()) & 0xffff_fc00;

            match self.base.resync(search_start, Some(reference), Some(0xffff_fc00)) {
                Some(pos) => {
                    self.base_framesize = pos as isize - padding_bonus;
                    pos
                }
                None if self.base.len() >= FREE_FORMAT_GIVE_UP => return Ok(CreateOutcome::Resync),
                None if !self.base.read_eof() => return Ok(CreateOutcome::MoreData),
                None => {
                    let mut end = self.base.len();
                    if end >= 128 && id3v1_size(self.base.data(), true, end - 128) == SizeDetect::Size(128) {
                        end -= 128;
                    }
                    self.base_framesize = end as isize - padding_bonus;
                    end
                }
            }
        };

        let frame = self.build_frame(&header, sz)?;
        Ok(CreateOutcome::Frame(frame, sz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ChannelMode;

    fn l3_frame_bytes() -> Vec<u8> {
        let header = FrameHeader::decode([0xff, 0xfa, 0x90, 0x00]).unwrap();
        let size = header.frame_size().unwrap().unwrap();
        let frame = MP3Frame {
            header,
            crc16: Some(0),
            side_info: Some(SideInfo::new(crate::header::MpegVersion::Mpeg1, &ChannelMode::Stereo)),
            raw_body: vec![0u8; size - HEADER_LEN - 2 - header.side_info_len()],
            resynced: false,
            frame_number: 0,
            byte_position: 0,
        };
        frame.encode().unwrap()
    }

    #[test]
    fn reads_a_single_frame() {
        let mut sync = PhysicalFrameSync::default();
        sync.feed(&l3_frame_bytes()).unwrap();
        sync.feed_eof();

        match sync.read_item().unwrap() {
            ReadItem::Frame(frame) => {
                assert_eq!(frame.frame_number, 0);
                assert_eq!(frame.byte_position, 0);
                assert!(!frame.resynced);
            }
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test]
    fn needs_data_on_partial_frame() {
        let mut sync = PhysicalFrameSync::default();
        let bytes = l3_frame_bytes();
        sync.feed(&bytes[..bytes.len() - 1]).unwrap();
        assert!(matches!(sync.read_item().unwrap(), ReadItem::NeedData));
    }

    #[test]
    fn skips_garbage_before_resyncing() {
        let mut sync = PhysicalFrameSync::default();
        let mut stream = vec![0x00, 0x01, 0x02, 0x03, 0x04];
        stream.extend_from_slice(&l3_frame_bytes());
        sync.feed(&stream).unwrap();
        sync.feed_eof();

        let garbage = match sync.read_item().unwrap() {
            ReadItem::Garbage(bytes) => bytes,
            other => panic!("expected garbage, got {:?}", other),
        };
        assert_eq!(garbage, vec![0x00, 0x01, 0x02, 0x03, 0x04]);

        match sync.read_item().unwrap() {
            ReadItem::Frame(frame) => assert!(frame.resynced),
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test]
    fn frame_numbers_and_byte_positions_are_monotonic() {
        let mut sync = PhysicalFrameSync::default();
        let one = l3_frame_bytes();
        let mut stream = one.clone();
        stream.extend_from_slice(&one);
        sync.feed(&stream).unwrap();
        sync.feed_eof();

        let first = match sync.read_item().unwrap() {
            ReadItem::Frame(f) => f,
            other => panic!("expected a frame, got {:?}", other),
        };
        let second = match sync.read_item().unwrap() {
            ReadItem::Frame(f) => f,
            other => panic!("expected a frame, got {:?}", other),
        };

        assert_eq!(first.frame_number, 0);
        assert_eq!(second.frame_number, 1);
        assert!(second.byte_position > first.byte_position);
    }
}
