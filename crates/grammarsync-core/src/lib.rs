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

//! grammarsync-core: pure building blocks for syncing syntax grammars.
//!
//! This library does no I/O. It provides:
//! - The version-pinned catalog of grammars and themes
//! - Remote and local naming of modules
//! - Text-level parsing and rewriting of grammar modules
//! - Normalization of the user configuration

pub mod catalog;
pub mod config;
pub mod error;
pub mod module;
pub mod parser;

// Re-exports for convenience
pub use catalog::Catalog;
pub use config::{Config, ThemePair, normalize};
pub use error::{ErrorReport, Fallible, fail};
pub use module::{ModuleKind, local_file_name, parse_local_file_name};
