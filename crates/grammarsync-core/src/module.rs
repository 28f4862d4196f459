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

//! Module kinds and the two naming schemes a module lives under: its remote
//! registry location and its file name in the local store.

use std::fmt::Display;
use std::fmt::Formatter;

/// Prefix shared by every file the store manages. Hosts use it to tell
/// store files apart from user media.
pub const STORE_FILE_PREFIX: &str = "_";

/// Extension of files in the local store.
pub const LOCAL_EXTENSION: &str = ".js";

/// Extension of modules in the remote registry.
pub const REMOTE_EXTENSION: &str = ".mjs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleKind {
    /// A language grammar. May import sibling grammars.
    Lang,
    /// A color theme. Always a leaf.
    Theme,
}

impl ModuleKind {
    /// The registry package the module is published under.
    pub fn package(self) -> &'static str {
        match self {
            ModuleKind::Lang => "langs",
            ModuleKind::Theme => "themes",
        }
    }

    /// The local file name prefix, e.g. `_lang-`.
    pub fn file_prefix(self) -> &'static str {
        match self {
            ModuleKind::Lang => "_lang-",
            ModuleKind::Theme => "_theme-",
        }
    }
}

impl Display for ModuleKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleKind::Lang => write!(f, "lang"),
            ModuleKind::Theme => write!(f, "theme"),
        }
    }
}

/// The registry URL of a module:
/// `<base>/<langs|themes>@<version>/<target>/<name>.mjs`.
pub fn module_url(base: &str, kind: ModuleKind, version: &str, target: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    format!(
        "{base}/{}@{version}/{target}/{name}{REMOTE_EXTENSION}",
        kind.package()
    )
}

/// The file name of a module in the local store, e.g. `_lang-rust.js`.
pub fn local_file_name(kind: ModuleKind, name: &str) -> String {
    format!("{}{name}{LOCAL_EXTENSION}", kind.file_prefix())
}

/// Inverse of [`local_file_name`]. Returns `None` for files the store does
/// not manage.
pub fn parse_local_file_name(file_name: &str) -> Option<(ModuleKind, &str)> {
    let stem = file_name.strip_suffix(LOCAL_EXTENSION)?;
    for kind in [ModuleKind::Lang, ModuleKind::Theme] {
        if let Some(name) = stem.strip_prefix(kind.file_prefix()) {
            if !name.is_empty() {
                return Some((kind, name));
            }
        }
    }
    None
}
