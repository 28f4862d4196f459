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

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::module::ModuleKind;
use crate::module::module_url;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// On-disk shape of a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: String,
    registry: String,
    target: String,
    languages: Vec<String>,
    themes: Vec<String>,
    #[serde(default)]
    defaults: DefaultsFile,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultsFile {
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default)]
    themes: DefaultThemesFile,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultThemesFile {
    light: Option<String>,
    dark: Option<String>,
}

/// The fixed, version-pinned set of grammars and themes a store knows about,
/// together with where to fetch them from.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: String,
    registry: String,
    target: String,
    language_set: HashSet<String>,
    theme_set: HashSet<String>,
    default_languages: Vec<String>,
    default_light: String,
    default_dark: String,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Fallible<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse a catalog file.
    ///
    /// Default languages that are not in the catalog are dropped. A default
    /// light theme that is not in the catalog becomes the first catalog
    /// theme, and a bad default dark theme becomes the default light theme.
    pub fn from_json(text: &str) -> Fallible<Self> {
        let file: CatalogFile = serde_json::from_str(text)?;
        if file.version.trim().is_empty() {
            return fail("catalog has an empty version.");
        }
        if file.themes.is_empty() {
            return fail("catalog has no themes.");
        }
        let language_set: HashSet<String> = file.languages.into_iter().collect();
        let theme_set: HashSet<String> = file.themes.iter().cloned().collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let default_languages: Vec<String> = file
            .defaults
            .languages
            .iter()
            .filter(|lang| language_set.contains(*lang) && seen.insert(lang.as_str()))
            .cloned()
            .collect();

        let default_light: String = match file.defaults.themes.light {
            Some(light) if theme_set.contains(&light) => light,
            _ => file.themes[0].clone(),
        };
        let default_dark: String = match file.defaults.themes.dark {
            Some(dark) if theme_set.contains(&dark) => dark,
            _ => default_light.clone(),
        };

        Ok(Self {
            version: file.version,
            registry: file.registry,
            target: file.target,
            language_set,
            theme_set,
            default_languages,
            default_light,
            default_dark,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn has_lang(&self, name: &str) -> bool {
        self.language_set.contains(name)
    }

    pub fn has_theme(&self, name: &str) -> bool {
        self.theme_set.contains(name)
    }

    /// Languages configured when the user has selected none.
    pub fn default_languages(&self) -> &[String] {
        &self.default_languages
    }

    pub fn default_light(&self) -> &str {
        &self.default_light
    }

    pub fn default_dark(&self) -> &str {
        &self.default_dark
    }

    /// Where a module of this catalog is published.
    pub fn url(&self, kind: ModuleKind, name: &str) -> String {
        module_url(&self.registry, kind, &self.version, &self.target, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin() -> Fallible<()> {
        let catalog = Catalog::builtin()?;
        assert!(catalog.has_lang("html"));
        assert!(catalog.has_lang("bash"));
        assert!(!catalog.has_lang("klingon"));
        assert!(catalog.has_theme("vitesse-light"));
        assert!(catalog.default_languages().contains(&"bash".to_string()));
        for lang in catalog.default_languages() {
            assert!(catalog.has_lang(lang));
        }
        assert_eq!(catalog.default_light(), "vitesse-light");
        assert_eq!(catalog.default_dark(), "vitesse-dark");
        Ok(())
    }

    #[test]
    fn test_url() -> Fallible<()> {
        let catalog = Catalog::from_json(
            r#"{"version":"1.0.0","registry":"https://registry.test/@x","target":"es2022",
                "languages":["html"],"themes":["nord"]}"#,
        )?;
        assert_eq!(
            catalog.url(ModuleKind::Lang, "html"),
            "https://registry.test/@x/langs@1.0.0/es2022/html.mjs"
        );
        assert_eq!(
            catalog.url(ModuleKind::Theme, "nord"),
            "https://registry.test/@x/themes@1.0.0/es2022/nord.mjs"
        );
        Ok(())
    }

    #[test]
    fn test_defaults_are_sanitized() -> Fallible<()> {
        let catalog = Catalog::from_json(
            r#"{"version":"1.0.0","registry":"r","target":"t",
                "languages":["c","lua"],"themes":["min-light","min-dark"],
                "defaults":{"languages":["lua","klingon","lua"],
                            "themes":{"light":"nope","dark":"also-nope"}}}"#,
        )?;
        assert_eq!(catalog.default_languages(), &["lua".to_string()]);
        assert_eq!(catalog.default_light(), "min-light");
        assert_eq!(catalog.default_dark(), "min-light");
        Ok(())
    }

    #[test]
    fn test_no_themes_is_rejected() {
        let result = Catalog::from_json(
            r#"{"version":"1.0.0","registry":"r","target":"t","languages":["c"],"themes":[]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_is_rejected() {
        assert!(Catalog::from_json("{").is_err());
    }
}
