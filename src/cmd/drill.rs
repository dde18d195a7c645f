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

use std::io::BufRead;
use std::io::Write;
use std::io::stdin;
use std::io::stdout;

use rand::thread_rng;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::session::mode::PracticeSession;
use crate::session::mode::ReviewMode;
use crate::session::mode::Session;
use crate::session::mode::StudySession;
use crate::session::queue::SessionStatus;
use crate::store::CardStore;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

pub fn drill(coll: &Collection, deck: Option<&str>, mode: ReviewMode) -> Fallible<()> {
    let stdin = stdin();
    let mut input = stdin.lock();
    let mut output = stdout();
    run(&coll.db, &coll.user, deck, mode, &mut input, &mut output)
}

pub fn run<S: CardStore, R: BufRead, W: Write>(
    store: &S,
    user: &str,
    deck: Option<&str>,
    mode: ReviewMode,
    input: &mut R,
    output: &mut W,
) -> Fallible<()> {
    let now = Timestamp::now();
    let session = Session::start(store, user, deck, mode, now, &mut thread_rng())?;
    log::debug!("Drilling in {:?} mode", session.mode());
    match session {
        Session::Study(session) => study(store, session, input, output),
        Session::Practice(session) => practice(session, input, output),
    }
}

fn study<S: CardStore, R: BufRead, W: Write>(
    store: &S,
    mut session: StudySession,
    input: &mut R,
    output: &mut W,
) -> Fallible<()> {
    let total = session.queue().total();
    if session.queue().status() == SessionStatus::Complete {
        writeln!(output, "No cards due.")?;
        return Ok(());
    }
    while let Some(card) = session.current() {
        let card = card.clone();
        writeln!(
            output,
            "[{}/{}] {}{}",
            session.queue().finished() + 1,
            total,
            card.deck,
            if card.state.is_new() { " (new)" } else { "" }
        )?;
        writeln!(output, "Q: {}", card.front)?;
        writeln!(output, "[press enter to reveal]")?;
        if read_line(input)?.is_none() {
            return end_early(&session, output);
        }
        writeln!(output, "A: {}", card.back)?;
        if let Some(info) = card.state.override_info() {
            writeln!(output, "Rescheduled after a test: {}", info.reason)?;
        }
        if let Some(preview) = session.preview(Timestamp::now()) {
            let labels: Vec<String> = preview
                .iter()
                .map(|(rating, due)| {
                    format!(
                        "{} = {} ({})",
                        rating.code(),
                        rating,
                        due.into_inner().format("%Y-%m-%d %H:%M")
                    )
                })
                .collect();
            writeln!(output, "{}", labels.join(", "))?;
        }
        loop {
            writeln!(output, "Rating: (1 = Again, 2 = Hard, 3 = Good, 4 = Easy)")?;
            let Some(line) = read_line(input)? else {
                return end_early(&session, output);
            };
            let rating: Rating = match line.parse() {
                Ok(rating) => rating,
                Err(_) => {
                    writeln!(output, "Invalid input. Please enter a number between 1 and 4.")?;
                    continue;
                }
            };
            match session.rate(store, rating, Timestamp::now()) {
                Ok(_) => break,
                Err(e) if e.is_retryable() => {
                    writeln!(output, "{e}. Please try again.")?;
                }
                Err(e) => return Err(e),
            }
        }
    }
    writeln!(
        output,
        "Session completed: {} cards, {} reviews.",
        total,
        session.queue().reviews()
    )?;
    Ok(())
}

fn practice<R: BufRead, W: Write>(
    mut session: PracticeSession,
    input: &mut R,
    output: &mut W,
) -> Fallible<()> {
    if session.is_empty() {
        writeln!(output, "No cards.")?;
        return Ok(());
    }
    while let Some(card) = session.current() {
        writeln!(output, "[{}/{}] {}", session.position(), session.len(), card.deck)?;
        writeln!(output, "Q: {}", card.front)?;
        writeln!(output, "A: {}", card.back)?;
        writeln!(output, "(n = next, p = previous, q = quit)")?;
        let Some(line) = read_line(input)? else {
            break;
        };
        match line.as_str() {
            "" | "n" => {
                if !session.next() {
                    writeln!(output, "End of deck.")?;
                    break;
                }
            }
            "p" => {
                if !session.previous() {
                    writeln!(output, "Already at the first card.")?;
                }
            }
            "q" => break,
            _ => writeln!(output, "Invalid input.")?,
        }
    }
    Ok(())
}

fn end_early<W: Write>(session: &StudySession, output: &mut W) -> Fallible<()> {
    writeln!(
        output,
        "Session ended with {} card(s) left.",
        session.queue().remaining()
    )?;
    Ok(())
}

/// Read a trimmed line. Returns `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Fallible<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
