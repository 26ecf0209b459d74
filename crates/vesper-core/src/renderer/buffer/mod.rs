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

//! Vertex buffers and the selection of their upload strategy.
//!
//! - **[`strategy`]**: picks one [`BufferStrategy`] per buffer from capabilities, usage and hint.
//! - **[`ring`]**: the fenced slot cursor of multi-buffered persistent buffers.
//! - **[`vertex_buffer`]**: the typed buffer itself.

pub mod ring;
pub mod strategy;
pub mod vertex_buffer;

pub use self::ring::FenceRing;
pub use self::strategy::{BufferStrategy, StrategyHint, StrategySelector, UploadPath};
pub use self::vertex_buffer::VertexBuffer;
