// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `BaseSync`: an incrementally-fed byte buffer that classifies its own front as a frame sync
//! word, a known tag prefix, or unidentified garbage.

use mpaframe_core::error::{usage_error, Result};
use mpaframe_metadata::{identify_tag, TagDetect, TagKind};

use crate::header::SYNC_MASK;

/// What the buffer's current front looks like.
#[derive(Debug, PartialEq, Eq)]
pub enum Identify {
    /// The first 4 bytes satisfy the sync mask.
    Sync,
    /// `n` bytes of unidentifiable data precede the next sync or tag.
    Garbage(usize),
    /// A comment/tag of the given kind occupies the first `n` bytes.
    Tag(usize, TagKind),
    /// Not enough data has been buffered to decide.
    Undecided,
}

/// An incrementally-fed byte buffer with frame-sync-word detection.
pub struct BaseSync {
    data: Vec<u8>,
    bytes_returned: u64,
    read_eof: bool,
    sync_skip: usize,
    sync_header: u32,
    sync_mask: u32,
}

impl BaseSync {
    /// Builds a sync buffer matching `header` under `mask`. `mask`'s top 11 bits (the frame sync
    /// word) are always forced on, regardless of what's passed in.
    pub fn new(header: u32, mask: u32) -> BaseSync {
        let mask = mask | SYNC_MASK;
        BaseSync { data: Vec::new(), bytes_returned: 0, read_eof: false, sync_skip: 0, sync_header: header & mask, sync_mask: mask }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read_eof(&self) -> bool {
        self.read_eof
    }

    pub fn bytes_returned(&self) -> u64 {
        self.bytes_returned
    }

    /// Appends `bytes` to the buffer. Fails if called after [`feed_eof`](Self::feed_eof).
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        if self.read_eof {
            return usage_error("feed called after feed_eof");
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub fn feed_eof(&mut self) {
        self.read_eof = true;
    }

    /// Drops the first `n` bytes of the buffer, advancing `bytes_returned` and `sync_skip`.
    pub fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.data.len() {
            return usage_error("advance past the end of the buffered data");
        }
        self.data.drain(0..n);
        self.sync_skip = self.sync_skip.saturating_sub(n);
        self.bytes_returned += n as u64;
        Ok(())
    }

    /// Searches for the next candidate sync word at or after `max(offset, sync_skip)`, testing
    /// `(word & mask) == header` (defaulting to this buffer's configured header/mask). Always
    /// advances `sync_skip` past whatever was scanned, so a later call never rescans bytes that
    /// were already ruled out.
    pub fn resync(&mut self, offset: usize, header: Option<u32>, mask: Option<u32>) -> Option<usize> {
        let header = header.unwrap_or(self.sync_header);
        let mask = mask.unwrap_or(self.sync_mask);
        let mut pos = offset.max(self.sync_skip);

        loop {
            let candidate = match self.data[pos.min(self.data.len())..].iter().position(|&b| b == 0xff) {
                Some(rel) => pos + rel,
                None => {
                    self.sync_skip = self.data.len();
                    return None;
                }
            };

            if candidate + 4 > self.data.len() {
                self.sync_skip = candidate;
                return None;
            }

            let word = u32::from_be_bytes([
                self.data[candidate],
                self.data[candidate + 1],
                self.data[candidate + 2],
                self.data[candidate + 3],
            ]);

            if (word & mask) == header {
                self.sync_skip = candidate;
                return Some(candidate);
            }

            pos = candidate + 1;
        }
    }

    /// Classifies the buffer's current front.
    pub fn identify(&mut self) -> Identify {
        if self.data.len() < 4 {
            return if self.read_eof { Identify::Garbage(self.data.len()) } else { Identify::Undecided };
        }

        let word = u32::from_be_bytes([self.data[0], self.data[1], self.data[2], self.data[3]]);
        if (word & self.sync_mask) == self.sync_header {
            return Identify::Sync;
        }

        match identify_tag(&self.data, self.read_eof) {
            TagDetect::Found(kind, size) => return Identify::Tag(size, kind),
            TagDetect::NeedMoreData if !self.read_eof => return Identify::Undecided,
            TagDetect::NeedMoreData | TagDetect::NotATag => {}
        }

        match self.resync(0, None, None) {
            Some(pos) => Identify::Garbage(pos),
            None if self.sync_skip > 0 => Identify::Garbage(self.sync_skip),
            None => Identify::Undecided,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync() -> BaseSync {
        BaseSync::new(SYNC_MASK, SYNC_MASK)
    }

    #[test]
    fn undecided_until_four_bytes_buffered() {
        let mut s = sync();
        s.feed(&[0xff]).unwrap();
        assert_eq!(s.identify(), Identify::Undecided);
    }

    #[test]
    fn identifies_sync_word() {
        let mut s = sync();
        s.feed(&[0xff, 0xfa, 0x90, 0x00]).unwrap();
        assert_eq!(s.identify(), Identify::Sync);
    }

    #[test]
    fn identifies_id3v1_tag() {
        let mut s = sync();
        let mut tag = vec![0u8; 128];
        tag[0..3].copy_from_slice(b"TAG");
        s.feed(&tag).unwrap();
        s.feed_eof();
        assert_eq!(s.identify(), Identify::Tag(128, TagKind::Id3v1));
    }

    #[test]
    fn resync_finds_later_sync_word() {
        let mut s = sync();
        s.feed(&[0x00, 0x00, 0xff, 0xfa, 0x90, 0x00]).unwrap();
        assert_eq!(s.resync(0, None, None), Some(2));
    }

    #[test]
    fn advance_updates_counters_and_skip() {
        let mut s = sync();
        s.feed(&[0x00, 0xff, 0xfa, 0x90, 0x00]).unwrap();
        s.resync(0, None, None);
        s.advance(1).unwrap();
        assert_eq!(s.bytes_returned(), 1);
        assert_eq!(s.identify(), Identify::Sync);
    }

    #[test]
    fn feed_after_eof_is_usage_error() {
        let mut s = sync();
        s.feed_eof();
        assert!(s.feed(&[0]).is_err());
    }
}
