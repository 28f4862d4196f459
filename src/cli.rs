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
use std::fs;
use std::path::PathBuf;

use clap::Args;
use clap::Parser;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::fetch::HttpFetcher;
use crate::host::MediaMirror;
use crate::host::apply;
use crate::host::config_json;
use crate::host::load_config;
use crate::store::GrammarStore;

const DEFAULT_CONFIG_FILE: &str = "grammarsync.json";

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Download configured grammars and themes that are missing or broken.
    Sync {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Delete grammars and themes that are no longer needed.
    Cleanup {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Sync, clean up, and publish the store to a media directory.
    Apply {
        #[command(flatten)]
        store: StoreArgs,
        /// Path to the media directory store files are copied into.
        #[arg(long)]
        media: Option<String>,
    },
    /// Show the state of every configured grammar and theme.
    Status {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Print the configuration as JSON for embedding in card templates.
    Config {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// Path to the store directory. By default, the current working directory is used.
    directory: Option<String>,
    /// Path to the configuration file. By default, `grammarsync.json` in the store directory.
    #[arg(long)]
    config: Option<String>,
    /// Path to a catalog file. By default, the built-in catalog is used.
    #[arg(long)]
    catalog: Option<String>,
}

struct Session {
    store: GrammarStore<HttpFetcher>,
    config: Config,
}

impl StoreArgs {
    fn open(self) -> Fallible<Session> {
        let directory: PathBuf = match self.directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        if !directory.exists() {
            return fail("directory does not exist.");
        }
        let catalog: Catalog = match self.catalog {
            Some(path) => Catalog::from_json(&fs::read_to_string(path)?)?,
            None => Catalog::builtin()?,
        };
        let config_path: PathBuf = match self.config {
            Some(path) => PathBuf::from(path),
            None => directory.join(DEFAULT_CONFIG_FILE),
        };
        let config = load_config(&config_path, &catalog)?;
        let store = GrammarStore::new(directory, catalog, HttpFetcher::new()?)?;
        Ok(Session { store, config })
    }
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Sync { store } => {
            let Session { store, config } = store.open()?;
            let report = store.sync(&config);
            for file_name in &report.downloaded {
                println!("Downloaded {file_name}");
            }
            for err in &report.errors {
                eprintln!("{err}");
            }
            Ok(())
        }
        Command::Cleanup { store } => {
            let Session { store, config } = store.open()?;
            for file_name in store.cleanup(&config)? {
                println!("Removed {file_name}");
            }
            Ok(())
        }
        Command::Apply { store, media } => {
            let Session { store, config } = store.open()?;
            let mirror = match media {
                Some(dir) => Some(MediaMirror::new(PathBuf::from(dir))?),
                None => None,
            };
            let report = apply(&store, &config, mirror.as_ref())?;
            let summary = report.summary();
            if summary.is_empty() {
                println!("Nothing to do.");
            }
            for line in summary {
                println!("{line}");
            }
            Ok(())
        }
        Command::Status { store } => {
            let Session { store, config } = store.open()?;
            println!("Catalog version {}", store.catalog().version());
            for lang in &config.languages {
                println!("lang  {lang}: {}", store.state(lang));
            }
            for (slot, theme) in [("light", &config.themes.light), ("dark", &config.themes.dark)] {
                let state = if store.has_theme(theme) {
                    "present"
                } else {
                    "missing"
                };
                println!("theme {theme} ({slot}): {state}");
            }
            let langs = store.local_langs()?;
            let themes = store.local_themes()?;
            println!(
                "Store holds {} grammar(s) and {} theme(s).",
                langs.len(),
                themes.len()
            );
            Ok(())
        }
        Command::Config { store } => {
            let Session { store, config } = store.open()?;
            println!("{}", config_json(&config, &store)?);
            Ok(())
        }
    }
}
