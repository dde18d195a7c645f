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

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

use crate::cmd::add::add_card;
use crate::cmd::drill::drill;
use crate::cmd::export::export;
use crate::cmd::overrides::apply_test_results;
use crate::cmd::reset::reset;
use crate::cmd::settings::settings;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::overrides::FailurePolicy;
use crate::session::mode::ReviewMode;
use crate::types::settings::Settings;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the config file. Defaults to `cardwise.toml` if present.
    #[arg(long, global = true)]
    config: Option<String>,
    /// Whose cards to work on. Overrides the config.
    #[arg(long, global = true)]
    user: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Study the cards that are due.
    Drill {
        /// Only study this deck.
        #[arg(long)]
        deck: Option<String>,
    },
    /// Browse every card without scheduling anything.
    Practice {
        #[arg(long)]
        deck: Option<String>,
        /// Visit the cards in random order.
        #[arg(long)]
        shuffle: bool,
    },
    /// Add a card.
    Add {
        #[arg(long)]
        deck: String,
        #[arg(long)]
        front: String,
        #[arg(long)]
        back: String,
    },
    /// Return cards to the never-studied state.
    Reset {
        /// Card ids, in hex.
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Reschedule cards from graded test results.
    Override {
        /// Path to a JSON array of graded results.
        results: PathBuf,
        /// Language the reasons should be written in.
        #[arg(long, default_value = "en")]
        language: String,
        /// Abort on the first failure instead of skipping the card.
        #[arg(long)]
        fail_fast: bool,
    },
    /// Show or change the interval settings.
    Settings {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        again_minutes: Option<u32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        hard_days: Option<u32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        good_days: Option<u32>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        easy_days: Option<u32>,
    },
    /// Print the user's cards and settings as JSON.
    Export {
        #[arg(long)]
        deck: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let coll = Collection::open(cli.config, cli.user)?;
    match cli.command {
        Command::Drill { deck } => drill(&coll, deck.as_deref(), ReviewMode::Study),
        Command::Practice { deck, shuffle } => {
            drill(&coll, deck.as_deref(), ReviewMode::Practice { shuffle })
        }
        Command::Add { deck, front, back } => {
            add_card(&coll, &deck, &front, &back)?;
            Ok(())
        }
        Command::Reset { ids } => {
            reset(&coll, &ids)?;
            Ok(())
        }
        Command::Override {
            results,
            language,
            fail_fast,
        } => {
            let policy = if fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::Isolate
            };
            apply_test_results(&coll, &results, &language, policy).await?;
            Ok(())
        }
        Command::Settings {
            again_minutes,
            hard_days,
            good_days,
            easy_days,
        } => {
            let changes = Settings {
                again_minutes,
                hard_days,
                good_days,
                easy_days,
            };
            settings(&coll, changes)?;
            Ok(())
        }
        Command::Export { deck } => export(&coll, deck.as_deref()),
    }
}
