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

//! Glue between the store and the application that hosts it: reading and
//! persisting the configuration, publishing store files to the shared media
//! directory, and the "apply settings" flow.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use log::info;
use log::warn;
use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::config::ThemePair;
use crate::config::normalize;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::fetch::Fetcher;
use crate::module::STORE_FILE_PREFIX;
use crate::store::GrammarStore;

/// Read the configuration file and normalize it. A missing or malformed
/// file yields the defaults. If normalization changed anything, the
/// normalized form is written back.
pub fn load_config(path: &Path, catalog: &Catalog) -> Fallible<Config> {
    let raw: Value = if path.exists() {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("Ignoring malformed config {}: {e}", path.display());
            Value::Null
        })
    } else {
        Value::Null
    };
    let config = normalize(&raw, catalog);
    if raw != config.to_value()? {
        save_config(path, &config)?;
    }
    Ok(config)
}

pub fn save_config(path: &Path, config: &Config) -> Fallible<()> {
    let text = serde_json::to_string_pretty(&config.to_value()?)?;
    fs::write(path, text + "\n")?;
    info!("Saved config to {}", path.display());
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateConfig<'a> {
    languages: &'a [String],
    available_languages: Vec<String>,
    themes: &'a ThemePair,
    cardless: bool,
}

/// Compact JSON describing the configuration and the grammars actually
/// available, for embedding in card templates.
pub fn config_json<F: Fetcher>(config: &Config, store: &GrammarStore<F>) -> Fallible<String> {
    let template = TemplateConfig {
        languages: &config.languages,
        available_languages: store.local_langs()?.into_iter().collect(),
        themes: &config.themes,
        cardless: config.cardless,
    };
    Ok(serde_json::to_string(&template)?)
}

/// The host's shared media directory, which store files are copied into so
/// they travel with the rest of the user's media.
pub struct MediaMirror {
    dir: PathBuf,
}

impl MediaMirror {
    pub fn new(dir: PathBuf) -> Fallible<Self> {
        if !dir.is_dir() {
            return Err(ErrorReport::new("media directory does not exist."));
        }
        Ok(Self { dir })
    }

    /// Remove `removed` from the media directory, then copy every store file
    /// over, replacing older copies. Returns the names of the copied files.
    pub fn sync(&self, store_dir: &Path, removed: &[String]) -> Fallible<Vec<String>> {
        for file_name in removed {
            let path = self.dir.join(file_name);
            if path.is_file() {
                fs::remove_file(&path)?;
                info!("Removed {file_name} from media");
            }
        }

        let mut published = Vec::new();
        for entry in WalkDir::new(store_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ErrorReport::new(format!("failed to list store: {e}")))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            if !file_name.starts_with(STORE_FILE_PREFIX) {
                continue;
            }
            let target = self.dir.join(file_name);
            if target.exists() {
                fs::remove_file(&target)?;
            }
            fs::copy(entry.path(), &target)?;
            published.push(file_name.to_string());
        }
        published.sort();
        Ok(published)
    }
}

/// What applying a configuration did.
#[derive(Debug, Default, PartialEq)]
pub struct ApplyReport {
    pub downloaded: Vec<String>,
    pub removed: Vec<String>,
    pub errors: Vec<String>,
}

impl ApplyReport {
    /// One line per fact worth telling the user. Empty if nothing happened.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.downloaded.is_empty() {
            lines.push(format!("Downloaded: {} file(s)", self.downloaded.len()));
        }
        if !self.removed.is_empty() {
            lines.push(format!("Removed: {} unused file(s)", self.removed.len()));
        }
        if !self.errors.is_empty() {
            lines.push(format!("Errors: {}", self.errors.len()));
            for err in &self.errors {
                lines.push(format!("  - {err}"));
            }
        }
        lines
    }
}

/// Bring the store in line with `config`: download, then delete what is no
/// longer needed, then publish the result to the media directory.
pub fn apply<F: Fetcher>(
    store: &GrammarStore<F>,
    config: &Config,
    media: Option<&MediaMirror>,
) -> Fallible<ApplyReport> {
    let sync = store.sync(config);
    let removed = store.cleanup(config)?;
    if let Some(media) = media {
        media.sync(store.dir(), &removed)?;
    }
    Ok(ApplyReport {
        downloaded: sync.downloaded,
        removed,
        errors: sync.errors,
    })
}
