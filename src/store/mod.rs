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

//! The grammar store: a directory of grammar and theme modules kept in sync
//! with a [`Config`].
//!
//! The store keeps no state file. Whether a grammar is usable is decided by
//! reading it and everything it imports, so an interrupted download is
//! visible on the next [`GrammarStore::sync`] and gets repaired there.

mod deps;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use log::debug;
use log::info;
use log::warn;
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::fetch::Fetcher;
use crate::module::ModuleKind;
use crate::module::local_file_name;
use crate::module::parse_local_file_name;
use crate::parser::is_alias_module;
use crate::parser::lang_deps;
use crate::parser::rewrite_lang_imports;
use crate::store::deps::DepCache;
use crate::store::deps::LangScan;

/// The state of a grammar in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// No file.
    Missing,
    /// The file exists, but it or something it imports is missing or was
    /// never rewritten.
    Broken,
    /// The file and everything it imports are in place.
    Complete,
}

impl Display for ModuleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleState::Missing => write!(f, "missing"),
            ModuleState::Broken => write!(f, "broken"),
            ModuleState::Complete => write!(f, "complete"),
        }
    }
}

/// Outcome of [`GrammarStore::sync`]. Failures do not stop the sync, they
/// are collected here.
#[derive(Debug, Default, PartialEq)]
pub struct SyncReport {
    /// File names written, one per configured grammar or theme.
    pub downloaded: Vec<String>,
    /// Human-readable messages, one per grammar or theme that failed.
    pub errors: Vec<String>,
}

pub struct GrammarStore<F> {
    dir: PathBuf,
    catalog: Catalog,
    fetcher: F,
    deps: RefCell<DepCache>,
}

impl<F: Fetcher> GrammarStore<F> {
    pub fn new(dir: PathBuf, catalog: Catalog, fetcher: F) -> Fallible<Self> {
        if !dir.exists() {
            return fail("store directory does not exist.");
        }
        if !dir.is_dir() {
            return fail("store path is not a directory.");
        }
        Ok(Self {
            dir,
            catalog,
            fetcher,
            deps: RefCell::new(DepCache::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn path(&self, kind: ModuleKind, name: &str) -> PathBuf {
        self.dir.join(local_file_name(kind, name))
    }

    fn fetch_module(&self, kind: ModuleKind, name: &str) -> Fallible<Vec<u8>> {
        let url = self.catalog.url(kind, name);
        debug!("Fetching {kind} {name} from {url}");
        let bytes = self.fetcher.fetch(&url)?;
        Ok(bytes)
    }

    /// Replace a module file in one step, so readers never see half of it.
    fn write_module(&self, kind: ModuleKind, name: &str, content: &[u8]) -> Fallible<String> {
        let file_name = local_file_name(kind, name);
        let partial = self.dir.join(format!(".{file_name}.part"));
        fs::write(&partial, content)
            .and_then(|()| fs::rename(&partial, self.dir.join(&file_name)))
            .inspect_err(|_| {
                let _ = fs::remove_file(&partial);
            })?;
        if kind == ModuleKind::Lang {
            self.deps.borrow_mut().invalidate(name);
        }
        info!("Wrote {file_name}");
        Ok(file_name)
    }

    /// Read a language file and find out what it imports. `None` if the file
    /// is absent or unreadable.
    fn scan_lang(&self, name: &str) -> Option<LangScan> {
        let path = self.path(ModuleKind::Lang, name);
        match fs::read_to_string(&path) {
            Ok(text) => Some(self.deps.borrow_mut().scan(name, &text)),
            Err(e) => {
                if path.exists() {
                    warn!("Could not read {}: {e}", path.display());
                }
                None
            }
        }
    }

    /// Download a grammar and, recursively, every grammar it imports.
    ///
    /// Names already in `seen` are skipped, and every name visited is added
    /// to it, so each grammar is fetched at most once per call tree even if
    /// the imports form a cycle. Pass an empty set for a fresh download.
    ///
    /// A grammar is written before its imports are downloaded. If one of
    /// them fails, the error is returned and the grammar stays on disk
    /// referencing a file that does not exist, which
    /// [`GrammarStore::needs_redownload`] reports.
    pub fn download_lang(&self, name: &str, seen: &mut HashSet<String>) -> Fallible<()> {
        if !seen.insert(name.to_string()) {
            return Ok(());
        }

        let mut raw = self.fetch_module(ModuleKind::Lang, name)?;
        if let Some(canonical) = is_alias_module(&raw) {
            debug!("{name} is an alias of {canonical}");
            raw = self.fetch_module(ModuleKind::Lang, &canonical)?;
            if is_alias_module(&raw).is_some() {
                warn!("{canonical} (aliased by {name}) is itself an alias, storing it as-is");
            }
        }

        let text = String::from_utf8(raw)?;
        let deps = lang_deps(&text);
        let text = rewrite_lang_imports(&text);
        self.write_module(ModuleKind::Lang, name, text.as_bytes())?;

        for dep in deps {
            self.download_lang(&dep, seen)?;
        }
        Ok(())
    }

    /// Download a theme. Themes import nothing and are stored verbatim.
    pub fn download_theme(&self, name: &str) -> Fallible<()> {
        let raw = self.fetch_module(ModuleKind::Theme, name)?;
        self.write_module(ModuleKind::Theme, name, &raw)?;
        Ok(())
    }

    /// Whether the grammar, or anything it imports at any depth, is missing
    /// or was never rewritten.
    pub fn needs_redownload(&self, name: &str) -> bool {
        let mut stack: Vec<String> = vec![name.to_string()];
        let mut seen: HashSet<String> = HashSet::new();

        while let Some(lang) = stack.pop() {
            if !seen.insert(lang.clone()) {
                continue;
            }
            let Some(scan) = self.scan_lang(&lang) else {
                return true;
            };
            if scan.has_remote_imports {
                return true;
            }
            stack.extend(scan.deps);
        }
        false
    }

    pub fn state(&self, name: &str) -> ModuleState {
        if !self.path(ModuleKind::Lang, name).exists() {
            ModuleState::Missing
        } else if self.needs_redownload(name) {
            ModuleState::Broken
        } else {
            ModuleState::Complete
        }
    }

    pub fn has_theme(&self, name: &str) -> bool {
        self.path(ModuleKind::Theme, name).exists()
    }

    /// All module files in the store directory, as (kind, name, file name).
    fn local_files(&self) -> Fallible<Vec<(ModuleKind, String, String)>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ErrorReport::new(format!("failed to list store: {e}")))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            if let Some((kind, name)) = parse_local_file_name(file_name) {
                files.push((kind, name.to_string(), file_name.to_string()));
            }
        }
        files.sort();
        Ok(files)
    }

    fn local_names(&self, kind: ModuleKind) -> Fallible<BTreeSet<String>> {
        Ok(self
            .local_files()?
            .into_iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, name, _)| name)
            .collect())
    }

    /// Names of the grammars present in the store.
    pub fn local_langs(&self) -> Fallible<BTreeSet<String>> {
        self.local_names(ModuleKind::Lang)
    }

    /// Names of the themes present in the store.
    pub fn local_themes(&self) -> Fallible<BTreeSet<String>> {
        self.local_names(ModuleKind::Theme)
    }

    /// Every grammar imported by a grammar present in the store.
    pub fn collect_deps(&self) -> Fallible<HashSet<String>> {
        let mut deps = HashSet::new();
        for lang in self.local_langs()? {
            if let Some(scan) = self.scan_lang(&lang) {
                deps.extend(scan.deps);
            }
        }
        Ok(deps)
    }

    /// Delete grammars that are neither configured nor imported by a present
    /// grammar, and themes other than the two configured ones. Returns the
    /// removed file names.
    ///
    /// Imports are collected before anything is deleted, so a grammar only
    /// kept alive by one removed in this pass goes away on the next call.
    pub fn cleanup(&self, config: &Config) -> Fallible<Vec<String>> {
        let mut keep: HashSet<String> = config.languages.iter().cloned().collect();
        keep.extend(self.collect_deps()?);
        let themes: HashSet<&str> = config.themes.names().into_iter().collect();

        let mut removed = Vec::new();
        for (kind, name, file_name) in self.local_files()? {
            let wanted = match kind {
                ModuleKind::Lang => keep.contains(&name),
                ModuleKind::Theme => themes.contains(name.as_str()),
            };
            if wanted {
                continue;
            }
            fs::remove_file(self.dir.join(&file_name))?;
            if kind == ModuleKind::Lang {
                self.deps.borrow_mut().invalidate(&name);
            }
            info!("Removed {file_name}");
            removed.push(file_name);
        }
        Ok(removed)
    }

    /// Download every configured grammar that needs it and both configured
    /// themes if absent. A failure is recorded and the sync moves on to the
    /// next item.
    pub fn sync(&self, config: &Config) -> SyncReport {
        let mut report = SyncReport::default();

        for lang in &config.languages {
            if !self.needs_redownload(lang) {
                continue;
            }
            match self.download_lang(lang, &mut HashSet::new()) {
                Ok(()) => report
                    .downloaded
                    .push(local_file_name(ModuleKind::Lang, lang)),
                Err(e) => {
                    warn!("Failed to download {lang}: {}", e.message());
                    report
                        .errors
                        .push(format!("Failed to download {lang}: {}", e.message()));
                }
            }
        }

        for theme in config.themes.names() {
            if self.has_theme(theme) {
                continue;
            }
            match self.download_theme(theme) {
                Ok(()) => report
                    .downloaded
                    .push(local_file_name(ModuleKind::Theme, theme)),
                Err(e) => {
                    warn!("Failed to download theme {theme}: {}", e.message());
                    report
                        .errors
                        .push(format!("Failed to download theme {theme}: {}", e.message()));
                }
            }
        }

        report
    }
}
