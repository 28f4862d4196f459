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

//! Text-level operations on grammar modules as served by the registry.
//!
//! Nothing here fails: content that does not look the way we expect simply
//! yields "not an alias" or "no dependencies".

use std::sync::LazyLock;

use regex::Captures;
use regex::Regex;

use crate::module::ModuleKind;
use crate::module::local_file_name;

/// Alias stubs are tiny. Anything at or above this size is real code.
pub const ALIAS_MAX_BYTES: usize = 200;

/// A sibling import in remote form: `from "./css.mjs"`.
static REMOTE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"from\s*["']\./([^"'.]+)\.mjs["']"#).expect("valid regex")
});

/// A sibling import after rewriting: `from"./_lang-css.js"`.
static LOCAL_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"from"\./_lang-([^.]+)\.js""#).expect("valid regex"));

/// If `content` is a small stub that re-exports another module, return the
/// name of that module.
pub fn is_alias_module(content: &[u8]) -> Option<String> {
    if content.len() >= ALIAS_MAX_BYTES {
        return None;
    }
    let text = std::str::from_utf8(content).ok()?;
    REMOTE_IMPORT
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Names of the sibling grammars `content` imports, in order of appearance.
/// Duplicates are kept.
pub fn lang_deps(content: &str) -> Vec<String> {
    REMOTE_IMPORT
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Point every sibling import at the local store file of that grammar.
pub fn rewrite_lang_imports(content: &str) -> String {
    REMOTE_IMPORT
        .replace_all(content, |caps: &Captures| {
            format!(r#"from"./{}""#, local_file_name(ModuleKind::Lang, &caps[1]))
        })
        .into_owned()
}

/// Whether `content` still has imports in remote form, i.e. it was never
/// rewritten.
pub fn has_remote_imports(content: &str) -> bool {
    REMOTE_IMPORT.is_match(content)
}

/// Names of the grammars a rewritten file imports.
pub fn local_deps(content: &str) -> Vec<String> {
    LOCAL_IMPORT
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}
