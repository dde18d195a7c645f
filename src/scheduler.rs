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

//! The review scheduler: a variant of SM-2.
//!
//! Unlike textbook SM-2, the ease factor is updated on every rating,
//! including Again and Hard. This is intentional and must be preserved.

use crate::error::Fallible;
use crate::types::card_state::CardState;
use crate::types::card_state::DueSource;
use crate::types::card_state::MAX_INTERVAL_DAYS;
use crate::types::card_state::MIN_EASE;
use crate::types::rating::Rating;
use crate::types::settings::Settings;
use crate::types::timestamp::Timestamp;

/// Compute a card's next state from a raw rating code. Codes outside 1-4 are
/// rejected and no state is produced.
pub fn rate(
    state: &CardState,
    code: u8,
    settings: &Settings,
    now: Timestamp,
) -> Fallible<CardState> {
    let rating = Rating::try_from(code)?;
    Ok(next_state(state, rating, settings, now))
}

/// Compute a card's next state. Pure: `state` is not modified.
pub fn next_state(
    state: &CardState,
    rating: Rating,
    settings: &Settings,
    now: Timestamp,
) -> CardState {
    let (interval_days, repetitions, next_review_at) = match rating {
        Rating::Again => (0, 0, now.plus_minutes(settings.again_minutes())),
        Rating::Hard => {
            let interval = if state.last_rating == Some(Rating::Hard) {
                // Repeated struggle: halve, rounding up, but never below a day.
                state.interval_days.div_ceil(2).max(1)
            } else {
                settings.hard_days()
            };
            let interval = interval.min(MAX_INTERVAL_DAYS);
            (interval, 0, now.plus_days(interval))
        }
        Rating::Good | Rating::Easy => {
            let repetitions = state.repetitions.saturating_add(1);
            let interval = match repetitions {
                1 => settings.good_days(),
                2 => settings.easy_days(),
                _ => scale_interval(state.interval_days, state.ease_factor),
            };
            // A long interval left behind by an override keeps growing with
            // every success; stop it well short of the calendar's end.
            let interval = interval.min(MAX_INTERVAL_DAYS);
            (interval, repetitions, now.plus_days(interval))
        }
    };
    CardState {
        ease_factor: next_ease(state.ease_factor, rating),
        interval_days,
        repetitions,
        last_rating: Some(rating),
        next_review_at,
        due_source: DueSource::Algorithm,
    }
}

/// The SM-2 ease update, applied with the rating code as the quality.
///
/// The result is rounded to hundredths. Every step of the update is a whole
/// number of hundredths, so for eases the scheduler produced this only drops
/// float noise; an ease stored off that grid (say 2.345) is snapped onto it
/// by its next update.
pub fn next_ease(ease: f64, rating: Rating) -> f64 {
    let q = 5.0 - f64::from(rating.code());
    let ease = ease + (0.1 - q * (0.08 + q * 0.02));
    let ease = (ease * 100.0).round() / 100.0;
    ease.max(MIN_EASE)
}

/// `ceil(interval * ease)`, computed in hundredths so that exact products do
/// not round up spuriously.
fn scale_interval(interval: u32, ease: f64) -> u32 {
    let ease_hundredths = (ease * 100.0).round() as u64;
    let scaled = (u64::from(interval) * ease_hundredths).div_ceil(100);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// The due date each rating would produce, for showing interval previews
/// next to the rating buttons.
pub fn preview(
    state: &CardState,
    settings: &Settings,
    now: Timestamp,
) -> [(Rating, Timestamp); 4] {
    Rating::ALL.map(|rating| {
        let next = next_state(state, rating, settings, now);
        (rating, next.next_review_at)
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::types::card_state::INITIAL_EASE;
    use crate::types::card_state::Override;

    fn now() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 5, 10, 8, 30, 0).unwrap())
    }

    fn new_card() -> CardState {
        CardState::new(now())
    }

    fn assert_ease(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "ease {actual} != {expected}");
    }

    #[test]
    fn test_good_once() {
        let s = next_state(&new_card(), Rating::Good, &Settings::default(), now());
        assert_eq!(s.repetitions, 1);
        assert_eq!(s.interval_days, 3);
        assert_ease(s.ease_factor, 2.36);
        assert_eq!(s.next_review_at, now().plus_days(3));
        assert_eq!(s.last_rating, Some(Rating::Good));
    }

    #[test]
    fn test_good_twice() {
        let settings = Settings::default();
        let s = next_state(&new_card(), Rating::Good, &settings, now());
        let s = next_state(&s, Rating::Good, &settings, now());
        assert_eq!(s.repetitions, 2);
        assert_eq!(s.interval_days, 7);
        assert_ease(s.ease_factor, 2.22);
    }

    #[test]
    fn test_good_three_times() {
        let settings = Settings::default();
        let s = next_state(&new_card(), Rating::Good, &settings, now());
        let s = next_state(&s, Rating::Good, &settings, now());
        let s = next_state(&s, Rating::Good, &settings, now());
        assert_eq!(s.repetitions, 3);
        // ceil(7 * 2.22) = ceil(15.54)
        assert_eq!(s.interval_days, 16);
        assert_ease(s.ease_factor, 2.08);
    }

    #[test]
    fn test_again_on_new_card() {
        let s = next_state(&new_card(), Rating::Again, &Settings::default(), now());
        assert_eq!(s.repetitions, 0);
        assert_eq!(s.interval_days, 0);
        assert_eq!(s.next_review_at, now().plus_minutes(1));
        assert_ease(s.ease_factor, 1.96);
    }

    #[test]
    fn test_again_uses_minutes_setting() {
        let settings = Settings {
            again_minutes: Some(10),
            ..Settings::default()
        };
        let s = next_state(&new_card(), Rating::Again, &settings, now());
        assert_eq!(s.next_review_at, now().plus_minutes(10));
    }

    #[test]
    fn test_repeated_hard_halves_interval() {
        let state = CardState {
            interval_days: 4,
            last_rating: Some(Rating::Hard),
            ..new_card()
        };
        let s = next_state(&state, Rating::Hard, &Settings::default(), now());
        assert_eq!(s.interval_days, 2);
        assert_eq!(s.repetitions, 0);
        assert_eq!(s.next_review_at, now().plus_days(2));
    }

    #[test]
    fn test_repeated_hard_rounds_up_and_floors_at_one() {
        let settings = Settings::default();
        let odd = CardState {
            interval_days: 5,
            last_rating: Some(Rating::Hard),
            ..new_card()
        };
        let s = next_state(&odd, Rating::Hard, &settings, now());
        assert_eq!(s.interval_days, 3);
        let zero = CardState {
            interval_days: 0,
            last_rating: Some(Rating::Hard),
            ..new_card()
        };
        let s = next_state(&zero, Rating::Hard, &settings, now());
        assert_eq!(s.interval_days, 1);
    }

    #[test]
    fn test_first_hard_uses_hard_days() {
        let settings = Settings {
            hard_days: Some(2),
            ..Settings::default()
        };
        let state = CardState {
            interval_days: 30,
            repetitions: 5,
            last_rating: Some(Rating::Good),
            ..new_card()
        };
        let s = next_state(&state, Rating::Hard, &settings, now());
        assert_eq!(s.interval_days, 2);
        assert_eq!(s.repetitions, 0);
        assert_ease(s.ease_factor, 2.18);
    }

    #[test]
    fn test_two_consecutive_hards() {
        let settings = Settings {
            hard_days: Some(6),
            ..Settings::default()
        };
        let first = next_state(&new_card(), Rating::Hard, &settings, now());
        let second = next_state(&first, Rating::Hard, &settings, now());
        assert_eq!(first.interval_days, 6);
        assert_eq!(second.interval_days, first.interval_days.div_ceil(2).max(1));
    }

    #[test]
    fn test_easy_leaves_ease_unchanged() {
        let s = next_state(&new_card(), Rating::Easy, &Settings::default(), now());
        assert_ease(s.ease_factor, INITIAL_EASE);
        // The first success uses the Good interval regardless of the rating.
        assert_eq!(s.interval_days, 3);
    }

    #[test]
    fn test_exact_products_do_not_round_up() {
        let state = CardState {
            ease_factor: 2.2,
            interval_days: 5,
            repetitions: 2,
            ..new_card()
        };
        let s = next_state(&state, Rating::Good, &Settings::default(), now());
        assert_eq!(s.interval_days, 11);
    }

    #[test]
    fn test_ease_floor_holds_for_any_history() {
        let settings = Settings::default();
        let mut s = new_card();
        for rating in [Rating::Again, Rating::Hard, Rating::Again, Rating::Again] {
            s = next_state(&s, rating, &settings, now());
            assert!(s.ease_factor >= MIN_EASE);
        }
        assert_ease(s.ease_factor, MIN_EASE);
        for _ in 0..10 {
            s = next_state(&s, Rating::Again, &settings, now());
            assert_ease(s.ease_factor, MIN_EASE);
            assert_eq!(s.interval_days, 0);
            assert_eq!(s.repetitions, 0);
        }
    }

    #[test]
    fn test_interval_is_recomputed_not_accumulated() {
        let settings = Settings::default();
        let state = CardState {
            interval_days: 40,
            repetitions: 4,
            ..new_card()
        };
        let s = next_state(&state, Rating::Again, &settings, now());
        let s = next_state(&s, Rating::Good, &settings, now());
        assert_eq!(s.repetitions, 1);
        assert_eq!(s.interval_days, 3);
    }

    #[test]
    fn test_huge_intervals_are_capped() {
        for interval_days in [1_200_000, 40_000_000, u32::MAX] {
            let state = CardState {
                interval_days,
                repetitions: 3,
                ..new_card()
            };
            let s = next_state(&state, Rating::Easy, &Settings::default(), now());
            assert_eq!(s.interval_days, MAX_INTERVAL_DAYS);
            assert_eq!(s.next_review_at, now().plus_days(MAX_INTERVAL_DAYS));
            assert!(s.next_review_at.to_rfc3339().starts_with("2125-"));
        }
    }

    #[test]
    fn test_huge_settings_are_capped() {
        let settings = Settings {
            hard_days: Some(u32::MAX),
            good_days: Some(u32::MAX),
            ..Settings::default()
        };
        let hard = next_state(&new_card(), Rating::Hard, &settings, now());
        assert_eq!(hard.interval_days, MAX_INTERVAL_DAYS);
        let good = next_state(&new_card(), Rating::Good, &settings, now());
        assert_eq!(good.interval_days, MAX_INTERVAL_DAYS);
        let previews = preview(&new_card(), &settings, now());
        assert!(previews.iter().all(|(_, due)| *due >= now()));
    }

    #[test]
    fn test_off_grid_ease_snaps_to_hundredths() {
        assert_ease(next_ease(2.3449, Rating::Easy), 2.34);
        assert_ease(next_ease(2.3449, Rating::Good), 2.2);
    }

    #[test]
    fn test_rating_clears_override() {
        let state = CardState {
            due_source: DueSource::Oracle(Override {
                reason: "got it wrong".to_string(),
                previous_review_at: now(),
            }),
            ..new_card()
        };
        let s = next_state(&state, Rating::Good, &Settings::default(), now());
        assert_eq!(s.due_source, DueSource::Algorithm);
    }

    #[test]
    fn test_rate_rejects_invalid_codes() {
        let state = new_card();
        for code in [0, 5, 255] {
            assert!(rate(&state, code, &Settings::default(), now()).is_err());
        }
        assert_eq!(state, new_card());
    }

    #[test]
    fn test_rate_accepts_valid_codes() -> Fallible<()> {
        let s = rate(&new_card(), 3, &Settings::default(), now())?;
        assert_eq!(s.interval_days, 3);
        Ok(())
    }

    #[test]
    fn test_preview() {
        let preview = preview(&new_card(), &Settings::default(), now());
        assert_eq!(preview[0], (Rating::Again, now().plus_minutes(1)));
        assert_eq!(preview[1], (Rating::Hard, now().plus_days(1)));
        assert_eq!(preview[2], (Rating::Good, now().plus_days(3)));
        assert_eq!(preview[3], (Rating::Easy, now().plus_days(3)));
    }

    #[test]
    fn test_invariants_over_mixed_history() {
        let settings = Settings::default();
        let ratings = [
            Rating::Good,
            Rating::Easy,
            Rating::Good,
            Rating::Hard,
            Rating::Hard,
            Rating::Hard,
            Rating::Again,
            Rating::Easy,
            Rating::Good,
            Rating::Good,
            Rating::Good,
            Rating::Again,
        ];
        let mut s = new_card();
        for rating in ratings {
            let prev = s.clone();
            s = next_state(&s, rating, &settings, now());
            assert!(s.ease_factor >= MIN_EASE);
            if matches!(rating, Rating::Good | Rating::Easy) {
                assert_eq!(s.repetitions, prev.repetitions + 1);
            } else {
                assert_eq!(s.repetitions, 0);
            }
        }
    }
}
