// Copyright 2025 Fernando Borretti
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

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::analytics::DEFAULT_MASTERY_THRESHOLD;
use crate::error::Fallible;
use crate::error::fail;
use crate::selection::DEFAULT_LIMIT;
use crate::selection::DEFAULT_UNFAMILIAR_THRESHOLD;

/// Name of the config file looked up in the data directory.
pub const CONFIG_FILE: &str = "flashdeck.toml";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Database file name, relative to the data directory.
    pub database: String,
    pub tenant: String,
    pub language: String,
    pub default_limit: usize,
    pub unfamiliar_threshold: f64,
    pub mastery_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "flashdeck.db".to_string(),
            tenant: "default".to_string(),
            language: "en".to_string(),
            default_limit: DEFAULT_LIMIT,
            unfamiliar_threshold: DEFAULT_UNFAMILIAR_THRESHOLD,
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
        }
    }
}

impl Config {
    /// Load the config from `directory`, falling back to defaults when the
    /// file does not exist.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No config file, using defaults.");
            return Ok(Self::default());
        }
        log::debug!("Loading config from {}", path.display());
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Fallible<()> {
        if self.default_limit == 0 {
            return fail("default_limit must be positive.");
        }
        for (name, value) in [
            ("unfamiliar_threshold", self.unfamiliar_threshold),
            ("mastery_threshold", self.mastery_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return fail(format!("{name} must be between 0 and 1."));
            }
        }
        Ok(())
    }
}
