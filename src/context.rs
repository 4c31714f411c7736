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

use std::env::current_dir;
use std::path::PathBuf;

use crate::config::Config;
use crate::db::Database;
use crate::engine::Engine;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::scope::Scope;

/// Everything a command needs: the data directory's config, the scope to
/// work in, and an engine over the directory's database.
pub struct Context {
    pub config: Config,
    pub scope: Scope,
    pub engine: Engine<Database>,
}

impl Context {
    pub fn new(
        directory: Option<String>,
        tenant: Option<String>,
        language: Option<String>,
        mastery_threshold: Option<f64>,
    ) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let mut config = Config::load(&directory)?;
        if let Some(threshold) = mastery_threshold {
            config.mastery_threshold = threshold;
            config.validate()?;
        }
        let scope = Scope::new(
            tenant.unwrap_or_else(|| config.tenant.clone()),
            language.unwrap_or_else(|| config.language.clone()),
        );

        let db_path: PathBuf = directory.join(&config.database);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        log::debug!("Opening database at {db_path} for {scope}");
        let db: Database = Database::new(db_path)?;
        let engine = Engine::new(db, config.mastery_threshold);

        Ok(Self {
            config,
            scope,
            engine,
        })
    }
}
