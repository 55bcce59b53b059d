// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parses and encodes the MPEG-1/2/2.5 Layer 1/2/3 audio framing layer: frame headers, Layer 3
//! side info, CRC-16 frame protection, VBR descriptor tags, and a stateful byte-stream
//! synchronizer that locates frames and interspersed comment tags and reassembles Layer 3's bit
//! reservoir. Decoding audio samples (Huffman, IMDCT, synthesis) is out of scope.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

// Justification: identity operations are allowed to vertically align, and better illustrate
// complex algorithms derived directly from the bit-layout tables they implement.
#![allow(clippy::identity_op)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::manual_range_contains)]

pub mod frame;
pub mod header;
pub mod sideinfo;
pub mod sync;
mod tables;

pub use frame::{MP3Frame, VbrKind, XingHeader};
pub use header::{ChannelMode, Emphasis, FrameHeader, JointStereoMode, MpegLayer, MpegVersion};
pub use sideinfo::SideInfo;
