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

use crate::renderer::api::{DriverString, FloatQuery, IntegerQuery};

/// Read-only access to what a graphics driver supports.
///
/// The capability probe only talks to the driver through this trait, so it can
/// run against any backend and against recorded driver profiles in tests.
pub trait CapabilitySource {
    /// The version of the extension loader, or `None` if no loader could be
    /// initialized. A missing loader is fatal.
    fn loader_version(&self) -> Option<String>;

    /// Returns one of the driver identification strings.
    fn driver_string(&self, which: DriverString) -> String;

    /// The `(major, minor)` version of the context.
    fn api_version(&self) -> (u32, u32);

    /// Returns `true` if the named extension (e.g. `"GL_ARB_buffer_storage"`) is available.
    fn has_extension(&self, name: &str) -> bool;

    /// Queries an integer parameter. Unsupported queries return `0`.
    fn query_integer(&self, query: IntegerQuery) -> i32;

    /// Queries a float parameter. Unsupported queries return `0.0`.
    fn query_float(&self, query: FloatQuery) -> f32;

    /// Returns `true` if the context version is at least `major.minor`.
    fn supports_version(&self, major: u32, minor: u32) -> bool {
        self.api_version() >= (major, minor)
    }
}
