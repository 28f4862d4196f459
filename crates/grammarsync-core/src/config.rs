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

//! The user-editable configuration: which grammars to keep, which themes to
//! use, and whether to render outside of card templates.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::error::Fallible;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemePair {
    pub light: String,
    pub dark: String,
}

impl ThemePair {
    /// Both slots, light first. The two may name the same theme.
    pub fn names(&self) -> [&str; 2] {
        [&self.light, &self.dark]
    }
}

/// A configuration where every name is known to belong to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub languages: Vec<String>,
    pub themes: ThemePair,
    pub cardless: bool,
}

impl Config {
    /// The configuration used when nothing usable was supplied.
    pub fn default_for(catalog: &Catalog) -> Self {
        normalize(&Value::Null, catalog)
    }

    pub fn to_value(&self) -> Fallible<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Turn whatever the host has stored into a valid [`Config`].
///
/// Languages are trimmed, filtered to the catalog and deduplicated (first
/// occurrence wins). An empty result falls back to the catalog defaults.
/// Each theme slot is validated on its own; an invalid dark theme falls
/// back to the resolved light theme.
pub fn normalize(raw: &Value, catalog: &Catalog) -> Config {
    let empty = Map::new();
    let raw: &Map<String, Value> = raw.as_object().unwrap_or(&empty);

    let mut seen: HashSet<&str> = HashSet::new();
    let mut languages: Vec<String> = Vec::new();
    if let Some(items) = raw.get("languages").and_then(Value::as_array) {
        for item in items {
            let Some(name) = item.as_str() else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() || !catalog.has_lang(name) || !seen.insert(name) {
                continue;
            }
            languages.push(name.to_string());
        }
    }
    if languages.is_empty() {
        languages = catalog.default_languages().to_vec();
    }

    let raw_themes = raw.get("themes").and_then(Value::as_object);
    let pick = |slot: &str| -> Option<String> {
        raw_themes
            .and_then(|themes| themes.get(slot))
            .and_then(Value::as_str)
            .filter(|name| catalog.has_theme(name))
            .map(str::to_string)
    };
    let light: String = pick("light").unwrap_or_else(|| catalog.default_light().to_string());
    // A bad dark theme follows light; an absent one takes the default.
    let dark: String = match raw_themes.and_then(|themes| themes.get("dark")) {
        Some(_) => pick("dark").unwrap_or_else(|| light.clone()),
        None => catalog.default_dark().to_string(),
    };

    Config {
        languages,
        themes: ThemePair { light, dark },
        cardless: raw.get("cardless").is_some_and(truthy),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
