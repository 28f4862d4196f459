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

use std::collections::HashMap;

use crate::parser::has_remote_imports;
use crate::parser::local_deps;

/// What a language file says about its dependencies.
#[derive(Debug, Clone, PartialEq)]
pub struct LangScan {
    /// Grammars the file imports in rewritten form.
    pub deps: Vec<String>,
    /// Whether any import was never rewritten.
    pub has_remote_imports: bool,
}

impl LangScan {
    fn of(text: &str) -> Self {
        Self {
            deps: local_deps(text),
            has_remote_imports: has_remote_imports(text),
        }
    }
}

struct Entry {
    hash: blake3::Hash,
    scan: LangScan,
}

/// Parsed dependency lists of language files, keyed by grammar name.
///
/// An entry is only reused while the file content hashes the same, so edits
/// made behind the store's back are picked up on the next lookup.
#[derive(Default)]
pub struct DepCache {
    entries: HashMap<String, Entry>,
}

impl DepCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan(&mut self, name: &str, text: &str) -> LangScan {
        let hash = blake3::hash(text.as_bytes());
        if let Some(entry) = self.entries.get(name) {
            if entry.hash == hash {
                return entry.scan.clone();
            }
        }
        let scan = LangScan::of(text);
        self.entries.insert(
            name.to_string(),
            Entry {
                hash,
                scan: scan.clone(),
            },
        );
        scan
    }

    pub fn invalidate(&mut self, name: &str) {
        self.entries.remove(name);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan() {
        let mut cache = DepCache::new();
        let scan = cache.scan("html", r#"import t from"./_lang-javascript.js";"#);
        assert_eq!(scan.deps, vec!["javascript"]);
        assert!(!scan.has_remote_imports);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_content_is_rescanned() {
        let mut cache = DepCache::new();
        cache.scan("html", r#"import t from"./_lang-javascript.js";"#);
        let scan = cache.scan("html", r#"import t from"./javascript.mjs";"#);
        assert!(scan.deps.is_empty());
        assert!(scan.has_remote_imports);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let mut cache = DepCache::new();
        cache.scan("c", "var x;");
        cache.invalidate("c");
        assert_eq!(cache.len(), 0);
    }
}
