//! Adaptive thumbnail review scheduling.
//!
//! Decides which thumbnails a human should rate next. Movies with the fewest
//! ratings are served first, and within a movie a single thumbnail is picked
//! by [`pick_thumbnail`]:
//!
//! 1. Edges of positive streaks are confirmed first. A good thumbnail that is
//!    not part of any run of three consecutive good thumbnails gets its
//!    unrated neighbour surfaced (previous before next).
//! 2. Otherwise an unrated thumbnail is drawn at random, preferring ones with
//!    no settled thumbnail within two positions so exploration stays spread
//!    across the timeline.
//!
//! A movie with nothing left to pick drops out of the pass.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::thumbnail::Rating;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of thumbnails handed to a rater in one pass.
pub const MAX_REVIEW_BATCH: usize = 100;

/// Neighbourhood checked when spreading exploration picks.
pub const EXPLORATION_NEIGHBOURHOOD: [isize; 4] = [-2, -1, 1, 2];

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Review state of one thumbnail during a scheduling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Never reviewed and not yet queued in this pass.
    Unrated,
    /// Picked earlier in this pass; awaiting a verdict.
    Queued,
    /// Already rated.
    Rated(Rating),
}

impl Slot {
    pub fn from_rating(rating: Option<Rating>) -> Self {
        rating.map_or(Self::Unrated, Self::Rated)
    }

    fn is_good(self) -> bool {
        self == Self::Rated(Rating::Good)
    }

    fn is_settled(self) -> bool {
        self != Self::Unrated
    }
}

fn slot_at(slots: &[Slot], i: usize, offset: isize) -> Option<Slot> {
    let idx = i.checked_add_signed(offset)?;
    slots.get(idx).copied()
}

fn good_at(slots: &[Slot], i: usize, offset: isize) -> bool {
    slot_at(slots, i, offset).is_some_and(Slot::is_good)
}

fn unrated_at(slots: &[Slot], i: usize, offset: isize) -> bool {
    slot_at(slots, i, offset) == Some(Slot::Unrated)
}

/// Whether the good thumbnail at `i` is the first, second or third element of
/// a run of three consecutive good thumbnails.
fn in_good_triple(slots: &[Slot], i: usize) -> bool {
    (good_at(slots, i, 1) && good_at(slots, i, 2))
        || (good_at(slots, i, -1) && good_at(slots, i, 1))
        || (good_at(slots, i, -2) && good_at(slots, i, -1))
}

fn any_neighbour_settled(slots: &[Slot], i: usize) -> bool {
    EXPLORATION_NEIGHBOURHOOD
        .iter()
        .any(|&off| slot_at(slots, i, off).is_some_and(Slot::is_settled))
}

// ---------------------------------------------------------------------------
// Per-movie pick
// ---------------------------------------------------------------------------

/// Pick the most informative thumbnail of one movie.
///
/// `slots` must be ordered by thumbnail index. Returns the position of the
/// chosen slot, or `None` when every thumbnail is already rated or queued.
pub fn pick_thumbnail<R: Rng + ?Sized>(slots: &[Slot], rng: &mut R) -> Option<usize> {
    for i in (0..slots.len()).filter(|&i| slots[i].is_good()) {
        if in_good_triple(slots, i) {
            continue;
        }
        if unrated_at(slots, i, -1) {
            return Some(i - 1);
        }
        if unrated_at(slots, i, 1) {
            return Some(i + 1);
        }
    }

    let mut open: Vec<usize> = (0..slots.len())
        .filter(|&i| slots[i] == Slot::Unrated)
        .collect();
    if open.is_empty() {
        return None;
    }
    open.shuffle(rng);

    open.iter()
        .copied()
        .find(|&i| !any_neighbour_settled(slots, i))
        .or_else(|| open.first().copied())
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// One movie's thumbnails as seen by the scheduler.
#[derive(Debug, Clone)]
pub struct ReviewMovie<T> {
    /// Stable identifier, also the tie-breaker between equally reviewed movies.
    pub key: String,
    /// `(reference, rating)` pairs ordered by thumbnail index.
    pub thumbnails: Vec<(T, Option<Rating>)>,
}

impl<T> ReviewMovie<T> {
    pub fn rated_count(&self) -> usize {
        self.thumbnails.iter().filter(|(_, r)| r.is_some()).count()
    }
}

/// A thumbnail chosen for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPick<T> {
    pub movie_key: String,
    pub position: usize,
    pub thumbnail: T,
}

/// Build the next review batch across all movies.
///
/// Movies are served fewest-rated first (ties by key). After each pick the
/// movie goes back into the queue with its count incremented, so the batch
/// interleaves movies while still favouring the least reviewed ones. A movie
/// with nothing left to pick is dropped for the rest of the pass.
pub fn schedule_review<T: Clone, R: Rng + ?Sized>(
    movies: &[ReviewMovie<T>],
    limit: usize,
    rng: &mut R,
) -> Vec<ReviewPick<T>> {
    let mut slots: Vec<Vec<Slot>> = movies
        .iter()
        .map(|m| {
            m.thumbnails
                .iter()
                .map(|(_, r)| Slot::from_rating(*r))
                .collect()
        })
        .collect();

    let mut queue: BinaryHeap<Reverse<(usize, &str, usize)>> = movies
        .iter()
        .enumerate()
        .map(|(idx, m)| Reverse((m.rated_count(), m.key.as_str(), idx)))
        .collect();

    let mut picks = Vec::new();
    while picks.len() < limit {
        let Some(Reverse((count, key, idx))) = queue.pop() else {
            break;
        };

        let Some(position) = pick_thumbnail(&slots[idx], rng) else {
            tracing::debug!(movie = key, "No remaining thumbnails to review");
            continue;
        };

        slots[idx][position] = Slot::Queued;
        picks.push(ReviewPick {
            movie_key: key.to_string(),
            position,
            thumbnail: movies[idx].thumbnails[position].0.clone(),
        });
        queue.push(Reverse((count + 1, key, idx)));
    }

    picks
}

/// The fewest-rated-first order in which movies are first served.
pub fn priority_order<T>(movies: &[ReviewMovie<T>]) -> Vec<String> {
    let mut keyed: Vec<(usize, &str)> = movies
        .iter()
        .map(|m| (m.rated_count(), m.key.as_str()))
        .collect();
    keyed.sort();
    keyed.into_iter().map(|(_, k)| k.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
