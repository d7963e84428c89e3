//! Clip selection for compilations.
//!
//! Turns rated thumbnails into a set of time slices:
//!
//! 1. [`bracketed_good_thumbnails`] keeps only good thumbnails corroborated
//!    by a run of good neighbours.
//! 2. Candidates from the whole collection are shuffled.
//! 3. [`ClipSelector::select`] derives a randomized slice around each
//!    candidate, drops slices that overlap previously used footage, allows at
//!    most one clip per movie and stops once the target duration is exceeded.
//! 4. [`order_for_assembly`] sorts the result by normalized position so the
//!    compilation drifts from early to late parts of movies.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::thumbnail::{Rating, Sampling};
use crate::types::{DbId, Seconds};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default number of good neighbours required on each side of a candidate.
pub const DEFAULT_BRACKET: usize = 1;

/// Default length of a compilation, in seconds.
pub const DEFAULT_TARGET_DURATION_SECS: Seconds = 8.0 * 60.0;

// ---------------------------------------------------------------------------
// Time slices
// ---------------------------------------------------------------------------

/// A closed interval `[start, end]` within a movie, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSlice {
    pub start: Seconds,
    pub end: Seconds,
}

impl TimeSlice {
    pub fn new(start: Seconds, end: Seconds) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Seconds {
        self.end - self.start
    }

    pub fn contains(&self, t: Seconds) -> bool {
        self.start <= t && t <= self.end
    }

    /// Clamp both endpoints into `[min, max]`.
    pub fn clamp(self, min: Seconds, max: Seconds) -> Self {
        Self {
            start: self.start.max(min).min(max),
            end: self.end.max(min).min(max),
        }
    }

    /// Whether this candidate overlaps `used`: either endpoint falls inside
    /// it, or this slice fully contains it.
    pub fn overlaps(&self, used: &TimeSlice) -> bool {
        used.contains(self.start)
            || used.contains(self.end)
            || (self.start <= used.start && used.end <= self.end)
    }
}

/// Whether `candidate` overlaps any of the `used` slices.
pub fn overlaps_any(candidate: &TimeSlice, used: &[TimeSlice]) -> bool {
    used.iter().any(|u| candidate.overlaps(u))
}

/// A slice of roughly one sampling interval around `ts`.
///
/// Both the lead-in and the tail are drawn independently from
/// `[F/2, 3F/2]`, so cut points never line up with the sampling grid.
pub fn random_slice<R: Rng + ?Sized>(ts: Seconds, frequency: Seconds, rng: &mut R) -> TimeSlice {
    let low = frequency - frequency / 2.0;
    let high = frequency + frequency / 2.0;
    let lead = rng.random_range(low..=high);
    let tail = rng.random_range(low..=high);
    TimeSlice::new(ts - lead, ts + tail)
}

// ---------------------------------------------------------------------------
// Bracketing
// ---------------------------------------------------------------------------

/// Indices of good thumbnails backed by a run of good neighbours.
///
/// `thumbnails` are `(index, rating)` pairs in any order. For every maximal
/// run of consecutive good ratings of length `>= 2n + 1`, the element `n`
/// positions before the end of the run is returned (the `(len - n)`-th).
pub fn bracketed_good_thumbnails(thumbnails: &[(u32, Option<Rating>)], n: usize) -> Vec<u32> {
    let mut sorted = thumbnails.to_vec();
    sorted.sort_by_key(|(index, _)| *index);

    let min_run = 2 * n + 1;
    let mut out = Vec::new();
    let mut run: Vec<u32> = Vec::new();

    let mut close_run = |run: &mut Vec<u32>| {
        if run.len() >= min_run {
            out.push(run[run.len() - n - 1]);
        }
        run.clear();
    };

    for (index, rating) in sorted {
        if rating == Some(Rating::Good) {
            run.push(index);
        } else {
            close_run(&mut run);
        }
    }
    close_run(&mut run);

    out
}

// ---------------------------------------------------------------------------
// Candidates and clips
// ---------------------------------------------------------------------------

/// A confirmed good thumbnail that may become a clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClipCandidate {
    pub movie_id: DbId,
    pub thumbnail_index: u32,
}

/// A clip accepted into a compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedClip {
    /// Thumbnail timestamp divided by the movie duration.
    pub position: f64,
    pub slice: TimeSlice,
    pub movie_id: DbId,
}

/// Collect bracketed candidates across movies.
///
/// `ratings` maps each eligible movie to its `(index, rating)` pairs.
pub fn collect_candidates(
    ratings: &HashMap<DbId, Vec<(u32, Option<Rating>)>>,
    n: usize,
) -> Vec<ClipCandidate> {
    let mut movie_ids: Vec<&DbId> = ratings.keys().collect();
    movie_ids.sort();
    movie_ids
        .into_iter()
        .flat_map(|movie_id| {
            bracketed_good_thumbnails(&ratings[movie_id], n)
                .into_iter()
                .map(move |thumbnail_index| ClipCandidate {
                    movie_id: *movie_id,
                    thumbnail_index,
                })
        })
        .collect()
}

/// Greedy clip selection over a fixed candidate order.
#[derive(Debug, Clone)]
pub struct ClipSelector<'a> {
    pub sampling: Sampling,
    /// Duration of every eligible movie. Candidates of other movies are ignored.
    pub durations: &'a HashMap<DbId, Seconds>,
    /// Slices used by previous compilations, per movie.
    pub used_cuts: &'a HashMap<DbId, Vec<TimeSlice>>,
    /// Selection stops once the accumulated duration exceeds this.
    pub target_duration: Seconds,
}

impl ClipSelector<'_> {
    /// Walk `candidates` in order and accept clips until the target is exceeded.
    pub fn select<R: Rng + ?Sized>(
        &self,
        candidates: &[ClipCandidate],
        rng: &mut R,
    ) -> Vec<SelectedClip> {
        let mut used_movies: HashSet<DbId> = HashSet::new();
        let mut total = 0.0;
        let mut clips = Vec::new();

        for candidate in candidates {
            if used_movies.contains(&candidate.movie_id) {
                continue;
            }
            let Some(&duration) = self.durations.get(&candidate.movie_id) else {
                tracing::debug!(movie_id = candidate.movie_id, "Candidate movie is not eligible");
                continue;
            };
            if duration <= 0.0 {
                continue;
            }

            let ts = self.sampling.timestamp_of(candidate.thumbnail_index);
            let slice = random_slice(ts, self.sampling.frequency_secs, rng).clamp(0.0, duration);
            if slice.duration() <= 0.0 {
                continue;
            }

            let excluded = self
                .used_cuts
                .get(&candidate.movie_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            if overlaps_any(&slice, excluded) {
                tracing::debug!(
                    movie_id = candidate.movie_id,
                    start = slice.start,
                    end = slice.end,
                    "Candidate overlaps used footage",
                );
                continue;
            }

            used_movies.insert(candidate.movie_id);
            total += slice.duration();
            clips.push(SelectedClip {
                position: ts / duration,
                slice,
                movie_id: candidate.movie_id,
            });

            if total > self.target_duration {
                break;
            }
        }

        clips
    }

    /// Shuffle `candidates`, select, and order the result for assembly.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        mut candidates: Vec<ClipCandidate>,
        rng: &mut R,
    ) -> Vec<SelectedClip> {
        candidates.shuffle(rng);
        let mut clips = self.select(&candidates, rng);
        order_for_assembly(&mut clips);
        clips
    }
}

/// Sort clips by normalized position, earliest first.
pub fn order_for_assembly(clips: &mut [SelectedClip]) {
    clips.sort_by(|a, b| {
        a.position
            .total_cmp(&b.position)
            .then(a.movie_id.cmp(&b.movie_id))
    });
}

/// Sum of clip durations.
pub fn total_duration(clips: &[SelectedClip]) -> Seconds {
    clips.iter().map(|c| c.slice.duration()).sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
