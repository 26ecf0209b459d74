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

//! The math types the renderer needs: matrices, pixel rectangles and colors.

pub mod color;
pub mod matrix;
pub mod rect;

pub use self::color::{Color, LinearRgba};
pub use self::matrix::Mat4;
pub use self::rect::Rect;

/// A small constant used for float comparisons.
pub const EPSILON: f32 = 1e-5;
