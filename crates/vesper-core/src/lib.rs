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

//! # Vesper Core
//!
//! Foundational crate of the Vesper client renderer: math types, settings, the
//! driver contracts implemented by graphics backends, and the state-caching
//! machinery that turns gameplay/UI state requests into a minimal stream of
//! driver calls.

#![warn(missing_docs)]

pub mod diagnostics;
pub mod math;
pub mod renderer;
pub mod utils;

pub use diagnostics::{DiagnosticValue, DiagnosticsSink};
pub use renderer::{Renderer, VideoSettings};
