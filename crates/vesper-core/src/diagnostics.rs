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

//! Abstract contract for the crash-diagnostics collector.
//!
//! The renderer publishes facts about the graphics device (driver version,
//! vendor, VRAM) as key/value pairs so that a crash report can include them.
//! The collector itself lives outside of the core crate.

use std::fmt::{self, Display};

/// A value stored under a diagnostics key.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticValue {
    /// A free-form string.
    Text(String),
    /// An unsigned quantity, typically a size in bytes.
    Number(u64),
}

impl Display for DiagnosticValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticValue::Text(text) => write!(f, "{text}"),
            DiagnosticValue::Number(number) => write!(f, "{number}"),
        }
    }
}

/// A sink receiving key/value diagnostics.
///
/// Implementations are expected to overwrite any previous value stored under
/// the same key.
pub trait DiagnosticsSink {
    /// Stores a textual value.
    fn set_text(&mut self, key: &str, value: &str);

    /// Stores a numeric value.
    fn set_number(&mut self, key: &str, value: u64);

    /// Stores a library credit line shown in the about screen.
    ///
    /// The default implementation stores it as regular text.
    fn set_library_credits(&mut self, library: &str, credits: &str) {
        self.set_text(library, credits);
    }
}

/// A sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl DiagnosticsSink for NullDiagnostics {
    fn set_text(&mut self, _key: &str, _value: &str) {}

    fn set_number(&mut self, _key: &str, _value: u64) {}
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for &mut T {
    fn set_text(&mut self, key: &str, value: &str) {
        (**self).set_text(key, value);
    }

    fn set_number(&mut self, key: &str, value: u64) {
        (**self).set_number(key, value);
    }

    fn set_library_credits(&mut self, library: &str, credits: &str) {
        (**self).set_library_credits(library, credits);
    }
}
