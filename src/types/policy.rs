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

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use serde::Serialize;

use crate::error::EngineError;

/// A named rule deciding which cards are eligible for a session.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Every card in the pool.
    All,
    /// Cards from an explicit list of decks.
    ByDecks,
    /// Cards whose accuracy is below a threshold.
    Unfamiliar,
    /// Cards that have never been reviewed.
    NewlyAdded,
}

/// Names accepted by [`Policy::resolve`]. The `test_*` spellings are the ones
/// sent by the web frontend.
const POLICY_NAMES: [(&str, Policy); 8] = [
    ("all", Policy::All),
    ("by_decks", Policy::ByDecks),
    ("unfamiliar", Policy::Unfamiliar),
    ("newly_added", Policy::NewlyAdded),
    ("test_all", Policy::All),
    ("test_by_decks", Policy::ByDecks),
    ("test_unfamiliar", Policy::Unfamiliar),
    ("test_newly_added", Policy::NewlyAdded),
];

impl Policy {
    pub const ALL: [Policy; 4] = [
        Policy::All,
        Policy::ByDecks,
        Policy::Unfamiliar,
        Policy::NewlyAdded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::All => "all",
            Policy::ByDecks => "by_decks",
            Policy::Unfamiliar => "unfamiliar",
            Policy::NewlyAdded => "newly_added",
        }
    }

    /// Look up a policy by name.
    pub fn resolve(name: &str) -> Result<Policy, EngineError> {
        POLICY_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, policy)| *policy)
            .ok_or_else(|| EngineError::InvalidPolicy(name.to_string()))
    }
}

impl FromStr for Policy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::resolve(s)
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
