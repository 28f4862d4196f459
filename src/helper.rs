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

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;

use tempfile::tempdir;

use crate::catalog::Catalog;
use crate::error::Fallible;
use crate::fetch::FetchError;
use crate::fetch::Fetcher;
use crate::module::ModuleKind;

pub const TEST_REGISTRY: &str = "https://registry.test/@shikijs";

/// Create a temporary directory that outlives the test's `TempDir` guard.
pub fn create_tmp_directory() -> Fallible<PathBuf> {
    let dir = tempdir()?;
    let path = dir.keep().canonicalize()?;
    Ok(path)
}

/// A catalog covering every module in [`FakeRegistry::with_fixtures`].
pub fn make_test_catalog() -> Fallible<Catalog> {
    let json = format!(
        r#"{{"version":"1.0.0","registry":"{TEST_REGISTRY}","target":"es2022",
            "languages":["bash","blade","c","css","html","javascript","lua","nginx",
                         "php","python","shellscript","vue","vue-html","zsh"],
            "themes":["nord","vitesse-dark","vitesse-light"],
            "defaults":{{"languages":["python"],
                         "themes":{{"light":"vitesse-light","dark":"vitesse-dark"}}}}}}"#
    );
    Catalog::from_json(&json)
}

/// The text of a grammar module that imports `deps`, in registry form. It is
/// always large enough not to be mistaken for an alias stub.
pub fn grammar(name: &str, deps: &[&str]) -> String {
    let mut text = String::new();
    for (i, dep) in deps.iter().enumerate() {
        text.push_str(&format!("import d{i} from\"./{dep}.mjs\";"));
    }
    text.push_str(&format!(
        "const lang=Object.freeze({{displayName:\"{name}\",name:\"{name}\",patterns:[]}});"
    ));
    text.push_str(&format!("/*{}*/", "x".repeat(256)));
    text.push_str("export default [lang];");
    text
}

/// An in-memory module registry.
///
/// Modules are looked up by kind and name, parsed out of the requested URL.
/// Every request is recorded, and names can be made to fail on demand.
pub struct FakeRegistry {
    modules: HashMap<(ModuleKind, String), Vec<u8>>,
    failing: RefCell<HashSet<String>>,
    requests: RefCell<Vec<String>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
            failing: RefCell::new(HashSet::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// A registry with a handful of grammars shaped like the real ones:
    ///
    /// - `html` imports `javascript` and `css`.
    /// - `nginx` imports `lua`, which imports `c`.
    /// - `bash` is an alias stub for `shellscript`, and `zsh` one for `bash`.
    /// - `vue` and `vue-html` import each other.
    /// - `blade` imports `html` and `php`, and `php` imports `html`.
    pub fn with_fixtures() -> Self {
        let mut registry = Self::new();
        for leaf in ["javascript", "css", "c", "python", "shellscript"] {
            registry.add(ModuleKind::Lang, leaf, &grammar(leaf, &[]));
        }
        registry.add(ModuleKind::Lang, "html", &grammar("html", &["javascript", "css"]));
        registry.add(ModuleKind::Lang, "lua", &grammar("lua", &["c"]));
        registry.add(ModuleKind::Lang, "nginx", &grammar("nginx", &["lua"]));
        registry.add(
            ModuleKind::Lang,
            "bash",
            r#"import{default as o}from"./shellscript.mjs";export{o as default};"#,
        );
        registry.add(
            ModuleKind::Lang,
            "zsh",
            r#"import{default as o}from"./bash.mjs";export{o as default};"#,
        );
        registry.add(ModuleKind::Lang, "vue", &grammar("vue", &["vue-html"]));
        registry.add(ModuleKind::Lang, "vue-html", &grammar("vue-html", &["vue"]));
        registry.add(ModuleKind::Lang, "php", &grammar("php", &["html"]));
        registry.add(ModuleKind::Lang, "blade", &grammar("blade", &["html", "php"]));
        for theme in ["nord", "vitesse-dark", "vitesse-light"] {
            registry.add(
                ModuleKind::Theme,
                theme,
                &format!("var t=Object.freeze({{name:\"{theme}\"}});export default t;"),
            );
        }
        registry
    }

    pub fn add(&mut self, kind: ModuleKind, name: &str, content: &str) {
        self.add_bytes(kind, name, content.as_bytes().to_vec());
    }

    pub fn add_bytes(&mut self, kind: ModuleKind, name: &str, content: Vec<u8>) {
        self.modules.insert((kind, name.to_string()), content);
    }

    /// Make every request for a module called `name` fail.
    pub fn fail_on(&self, name: &str) {
        self.failing.borrow_mut().insert(name.to_string());
    }

    pub fn heal(&self) {
        self.failing.borrow_mut().clear();
    }

    /// Names of every module requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// How often a module called `name` was requested.
    pub fn request_count(&self, name: &str) -> usize {
        self.requests.borrow().iter().filter(|r| *r == name).count()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    fn parse_url(url: &str) -> Option<(ModuleKind, String)> {
        let mut segments = url.rsplit('/');
        let name = segments.next()?.strip_suffix(".mjs")?;
        let _target = segments.next()?;
        let package = segments.next()?;
        let kind = if package.starts_with("langs@") {
            ModuleKind::Lang
        } else if package.starts_with("themes@") {
            ModuleKind::Theme
        } else {
            return None;
        };
        Some((kind, name.to_string()))
    }
}

impl Fetcher for FakeRegistry {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let Some((kind, name)) = Self::parse_url(url) else {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 400,
            });
        };
        self.requests.borrow_mut().push(name.clone());
        if self.failing.borrow().contains(&name) {
            return Err(FetchError::Connection {
                url: url.to_string(),
                reason: "simulated".to_string(),
            });
        }
        match self.modules.get(&(kind, name)) {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
