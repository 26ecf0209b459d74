// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Flag sets passed to clear and buffer write operations.

use crate::vesper_bitflags;

vesper_bitflags! {
    /// Which framebuffer planes a clear touches.
    pub struct ClearFlags: u32 {
        /// The color buffer.
        const COLOR = 1 << 0;
        /// The depth buffer.
        const DEPTH = 1 << 1;
    }
}

vesper_bitflags! {
    /// Hints for a vertex buffer write.
    pub struct LockFlags: u32 {
        /// The previous contents of the whole buffer are no longer needed.
        const DISCARD = 1 << 0;
        /// The written range does not overlap data referenced by pending draws.
        const NO_OVERWRITE = 1 << 1;
    }
}
