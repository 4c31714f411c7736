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

/// The tenant and language a card pool is restricted to.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Scope {
    pub tenant: String,
    pub language: String,
}

impl Scope {
    pub fn new(tenant: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            language: language.into(),
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tenant, self.language)
    }
}
