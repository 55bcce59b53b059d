// mpaframe
// Copyright (c) 2026 The mpaframe Authors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The outcome of a tag-prefix size probe.

/// Result of checking whether a buffer starts with (or ends in, for trailer-anchored formats)
/// a particular tag format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SizeDetect {
    /// This is not a tag of the probed kind.
    NotPresent,
    /// Not enough data has been buffered to tell either way; call again once more bytes are
    /// available, or once `eof` is true.
    NeedMoreData,
    /// This is a tag of the probed kind, occupying this many bytes.
    Size(usize),
}
