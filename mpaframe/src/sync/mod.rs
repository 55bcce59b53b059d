// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stateful, incrementally-fed stream synchronization: turning an arbitrary byte stream into
//! frames, tags, and garbage ([`physical`]), then reassembling Layer 3's bit reservoir across
//! frames into logical payloads ([`logical`]).

pub mod base;
pub mod logical;
pub mod physical;

pub use base::{BaseSync, Identify};
pub use logical::{LogicalFrame, LogicalFrameAssembler, LogicalFrameSync};
pub use logical::ReadItem as LogicalReadItem;
pub use physical::{CommentTag, PhysicalFrameSync, SyncConfig};
pub use physical::ReadItem as PhysicalReadItem;
