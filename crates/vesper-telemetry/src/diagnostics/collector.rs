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

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{PoisonError, RwLock};

use serde_json::{Map, Value};
use vesper_core::diagnostics::{DiagnosticValue, DiagnosticsSink};

/// Thread-safe in-memory store of the facts a crash report should carry.
///
/// Entries are kept ordered by key so reports are stable. Library credit
/// lines are stored apart from the regular entries.
#[derive(Debug, Default)]
pub struct CrashDiagnostics {
    entries: RwLock<BTreeMap<String, DiagnosticValue>>,
    credits: RwLock<BTreeMap<String, String>>,
}

impl CrashDiagnostics {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn record(&self, key: &str, value: DiagnosticValue) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
    }

    /// Stores a library credit line, replacing any previous one.
    pub fn record_credits(&self, library: &str, credits: &str) {
        self.credits
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(library.to_owned(), credits.to_owned());
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<DiagnosticValue> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Returns the credit line of `library`.
    pub fn credits(&self, library: &str) -> Option<String> {
        self.credits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(library)
            .cloned()
    }

    /// Number of entries, credits excluded.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing but credits was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the entries as `key: value` lines, followed by the credits.
    ///
    /// Continuation lines of multi-line values are indented.
    pub fn report(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.entries.read().unwrap_or_else(PoisonError::into_inner).iter() {
            let value = value.to_string().replace('\n', "\n    ");
            let _ = writeln!(out, "{key}: {value}");
        }

        let credits = self.credits.read().unwrap_or_else(PoisonError::into_inner);
        if !credits.is_empty() {
            out.push_str("\nLibraries:\n");
            for (library, line) in credits.iter() {
                let line = line.replace('\n', ", ");
                let _ = writeln!(out, "  {library}: {line}");
            }
        }
        out
    }

    /// The entries and credits as a JSON object, for attaching to crash uploads.
    pub fn to_json(&self) -> Value {
        let entries: Map<String, Value> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    DiagnosticValue::Text(text) => Value::from(text.as_str()),
                    DiagnosticValue::Number(number) => Value::from(*number),
                };
                (key.clone(), value)
            })
            .collect();
        let credits: Map<String, Value> = self
            .credits
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(library, line)| (library.clone(), Value::from(line.as_str())))
            .collect();

        let mut root = Map::new();
        root.insert("entries".to_owned(), Value::Object(entries));
        root.insert("credits".to_owned(), Value::Object(credits));
        Value::Object(root)
    }
}

impl DiagnosticsSink for CrashDiagnostics {
    fn set_text(&mut self, key: &str, value: &str) {
        self.record(key, DiagnosticValue::Text(value.to_owned()));
    }

    fn set_number(&mut self, key: &str, value: u64) {
        self.record(key, DiagnosticValue::Number(value));
    }

    fn set_library_credits(&mut self, library: &str, credits: &str) {
        self.record_credits(library, credits);
    }
}

/// Lets a shared collector (e.g. behind an `Arc`) receive diagnostics.
impl DiagnosticsSink for &CrashDiagnostics {
    fn set_text(&mut self, key: &str, value: &str) {
        self.record(key, DiagnosticValue::Text(value.to_owned()));
    }

    fn set_number(&mut self, key: &str, value: u64) {
        self.record(key, DiagnosticValue::Number(value));
    }

    fn set_library_credits(&mut self, library: &str, credits: &str) {
        self.record_credits(library, credits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vesper_core::renderer::recording::{DriverProfile, RecordingDriver};
    use vesper_core::renderer::{FixedSurface, Renderer, TextureTable, VideoSettings};

    #[test]
    fn later_values_replace_earlier_ones() {
        let mut diagnostics = CrashDiagnostics::new();
        diagnostics.set_text("OpenGL vendor", "First");
        diagnostics.set_text("OpenGL vendor", "Second");
        diagnostics.set_number("VRAM size", 42);

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(
            diagnostics.get("OpenGL vendor"),
            Some(DiagnosticValue::Text("Second".to_owned()))
        );
    }

    #[test]
    fn report_is_sorted_and_lists_credits() {
        let mut diagnostics = CrashDiagnostics::new();
        diagnostics.set_number("b", 2);
        diagnostics.set_text("a", "one\ntwo");
        diagnostics.set_library_credits("graphics", "glow 0.16\nOpenGL 4.6");

        assert_eq!(
            diagnostics.report(),
            "a: one\n    two\nb: 2\n\nLibraries:\n  graphics: glow 0.16, OpenGL 4.6\n"
        );
        assert!(diagnostics.get("graphics").is_none());
    }

    #[test]
    fn json_keeps_numbers_numeric() {
        let mut diagnostics = CrashDiagnostics::new();
        diagnostics.set_number("VRAM size", 1024);
        diagnostics.set_text("OpenGL device", "Recording device");

        let json = diagnostics.to_json();
        assert_eq!(json["entries"]["VRAM size"], Value::from(1024u64));
        assert_eq!(json["entries"]["OpenGL device"], "Recording device");
        assert!(json["credits"].as_object().is_some_and(Map::is_empty));
    }

    #[test]
    fn shared_collector_receives_the_device_description() {
        let diagnostics = Arc::new(CrashDiagnostics::new());
        let mut renderer = Renderer::new(
            RecordingDriver::new(DriverProfile::modern()),
            Box::new(FixedSurface::new(640, 480)),
            VideoSettings::default(),
        );
        let mut textures = TextureTable::new();
        let mut sink: &CrashDiagnostics = &diagnostics;
        renderer
            .initialize(&mut sink, &mut textures)
            .expect("initialization");

        assert_eq!(
            diagnostics.get("OpenGL vendor"),
            Some(DiagnosticValue::Text("Vesper".to_owned()))
        );
        assert!(diagnostics
            .credits("graphics")
            .is_some_and(|line| line.starts_with("recording 1.0")));
    }
}
