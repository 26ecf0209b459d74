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

//! Process-wide logger setup.

use env_logger::{Builder, Env};
use log::SetLoggerError;

/// Installs the `env_logger` backend with an `info` default.
///
/// `RUST_LOG` overrides the default filter as usual.
///
/// ## Errors
/// Fails if a logger was already installed.
pub fn init_logging() -> Result<(), SetLoggerError> {
    init_logging_with("info")
}

/// Installs the `env_logger` backend with the given default filter directive.
///
/// ## Errors
/// Fails if a logger was already installed.
pub fn init_logging_with(default_filter: &str) -> Result<(), SetLoggerError> {
    Builder::from_env(Env::default().default_filter_or(default_filter)).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_rejected() {
        // Another test may have installed the logger first; either way the
        // last attempt must fail.
        let _ = init_logging_with("debug");
        assert!(init_logging().is_err());
        log::info!("logger reachable");
    }
}
