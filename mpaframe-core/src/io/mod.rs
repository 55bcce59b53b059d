// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements random-access bit-field access over in-memory byte buffers.
//!
//! Frame headers and side-info fields live at fixed bit offsets known ahead of time, rather
//! than being consumed sequentially from a cursor, so this module works over `&[u8]`/`&mut [u8]`
//! directly instead of a stream abstraction.

pub mod bitfield;

pub use bitfield::{get_bits, set_bits, BitField};
