//! Triadic closure between two time windows.
//!
//! For a "before" window and a later "after" window, each window is
//! projected onto performers: two performers are linked when they appear
//! together in a production released in that window. Every pair of
//! performers present in the before projection but not linked there is
//! a candidate. Candidates are bucketed by whether they share at least
//! one before-window neighbour, and each bucket reports the fraction of
//! candidates that are linked in the after window.

use crate::error::{GraphError, Result};
use crate::graph::CastGraph;
use costar_core::PerformerId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use tracing::{debug, info};

/// A set of release years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    years: BTreeSet<i32>,
}

impl YearWindow {
    /// Years in the half-open range `start..end`.
    pub fn from_range(range: Range<i32>) -> Self {
        Self {
            years: range.collect(),
        }
    }

    pub fn from_years(years: impl IntoIterator<Item = i32>) -> Self {
        Self {
            years: years.into_iter().collect(),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years.contains(&year)
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn is_disjoint(&self, other: &YearWindow) -> bool {
        self.years.is_disjoint(&other.years)
    }
}

impl std::fmt::Display for YearWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.years.first(), self.years.last()) {
            (Some(first), Some(last)) if first == last => write!(f, "{}", first),
            (Some(first), Some(last)) => write!(f, "{}..={}", first, last),
            _ => write!(f, "(empty)"),
        }
    }
}

/// Performer co-appearance graph for one window.
#[derive(Debug, Clone, Default)]
pub struct CoStarProjection {
    adjacency: BTreeMap<PerformerId, BTreeSet<PerformerId>>,
}

impl CoStarProjection {
    /// Links every pair of performers sharing a production released in `window`.
    pub fn build(graph: &CastGraph, window: &YearWindow) -> Self {
        let mut adjacency: BTreeMap<PerformerId, BTreeSet<PerformerId>> = BTreeMap::new();

        for production in graph.productions().filter(|m| window.contains(m.year)) {
            let cast: Vec<PerformerId> = production.performers.iter().copied().collect();
            for (i, &a) in cast.iter().enumerate() {
                for &b in &cast[i + 1..] {
                    adjacency.entry(a).or_default().insert(b);
                    adjacency.entry(b).or_default().insert(a);
                }
            }
        }

        Self { adjacency }
    }

    pub fn are_linked(&self, a: PerformerId, b: PerformerId) -> bool {
        self.adjacency.get(&a).is_some_and(|n| n.contains(&b))
    }

    /// Performers with at least one co-star in the window.
    pub fn performers(&self) -> impl Iterator<Item = PerformerId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn shared_neighbors(&self, a: PerformerId, b: PerformerId) -> usize {
        match (self.adjacency.get(&a), self.adjacency.get(&b)) {
            (Some(na), Some(nb)) => na.intersection(nb).count(),
            _ => 0,
        }
    }

    pub fn performer_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn link_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}

/// Candidates in one bucket and how many of them formed a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureRatio {
    pub formed: usize,
    pub candidates: usize,
}

impl ClosureRatio {
    /// Fraction of candidates that formed a link.
    ///
    /// Fails with `UndefinedRatio` when the bucket is empty.
    pub fn fraction(&self) -> Result<f64> {
        if self.candidates == 0 {
            return Err(GraphError::UndefinedRatio {
                context: "closure bucket has no candidate pairs".to_string(),
            });
        }
        Ok(self.formed as f64 / self.candidates as f64)
    }
}

/// Closure statistics for one before/after split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureRow {
    /// Label year, normally the first year of the before window.
    pub year: i32,
    /// Candidates with no shared before-window neighbour.
    pub no_shared: ClosureRatio,
    /// Candidates with at least one shared before-window neighbour.
    pub shared: ClosureRatio,
}

impl ClosureRow {
    /// `(year, no_shared, shared)` fractions; `None` marks an empty bucket.
    pub fn as_tuple(&self) -> (i32, Option<f64>, Option<f64>) {
        (
            self.year,
            self.no_shared.fraction().ok(),
            self.shared.fraction().ok(),
        )
    }

    /// Both fractions, failing if either bucket is empty.
    pub fn fractions(&self) -> Result<(f64, f64)> {
        let no_shared = self.no_shared.fraction().map_err(|_| GraphError::UndefinedRatio {
            context: format!("{}: no candidates without a shared neighbour", self.year),
        })?;
        let shared = self.shared.fraction().map_err(|_| GraphError::UndefinedRatio {
            context: format!("{}: no candidates with a shared neighbour", self.year),
        })?;
        Ok((no_shared, shared))
    }
}

/// Measures triadic closure from `before` to `after`.
pub fn triadic_closure(
    graph: &CastGraph,
    year: i32,
    before: &YearWindow,
    after: &YearWindow,
) -> Result<ClosureRow> {
    if before.is_empty() || after.is_empty() {
        return Err(GraphError::InvalidWindow(format!(
            "{}: before {} / after {} must both be non-empty",
            year, before, after
        )));
    }
    if !before.is_disjoint(after) {
        return Err(GraphError::InvalidWindow(format!(
            "{}: before {} overlaps after {}",
            year, before, after
        )));
    }

    let earlier = CoStarProjection::build(graph, before);
    let later = CoStarProjection::build(graph, after);

    let mut no_shared = ClosureRatio::default();
    let mut shared = ClosureRatio::default();

    let performers: Vec<PerformerId> = earlier.performers().collect();
    for (i, &a) in performers.iter().enumerate() {
        for &b in &performers[i + 1..] {
            if earlier.are_linked(a, b) {
                continue;
            }
            let bucket = if earlier.shared_neighbors(a, b) == 0 {
                &mut no_shared
            } else {
                &mut shared
            };
            bucket.candidates += 1;
            if later.are_linked(a, b) {
                bucket.formed += 1;
            }
        }
    }

    debug!(
        "Closure {}: {} performers / {} links before, {} links after",
        year,
        earlier.performer_count(),
        earlier.link_count(),
        later.link_count()
    );

    Ok(ClosureRow {
        year,
        no_shared,
        shared,
    })
}

/// Widest before or after window a schedule may ask for.
pub const MAX_WINDOW_YEARS: i32 = 1000;

/// A sweep of closure measurements over a range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureSchedule {
    /// First label year.
    pub from: i32,
    /// Last label year (inclusive).
    pub to: i32,
    pub step: usize,
    /// Years in the before window, starting at the label year.
    pub before: i32,
    /// Years in the after window, starting right after the before window.
    pub after: i32,
}

impl Default for ClosureSchedule {
    fn default() -> Self {
        Self {
            from: 1940,
            to: 2010,
            step: 2,
            before: 1,
            after: 5,
        }
    }
}

impl ClosureSchedule {
    /// The (label, before, after) windows of this sweep.
    ///
    /// Fails with `InvalidWindow` when a width is not positive, wider than
    /// `MAX_WINDOW_YEARS`, or when a window would run past `i32::MAX`.
    pub fn windows(&self) -> Result<Vec<(i32, YearWindow, YearWindow)>> {
        if self.step == 0 || self.before <= 0 || self.after <= 0 {
            return Err(GraphError::InvalidWindow(format!(
                "step {}, before {} and after {} must all be positive",
                self.step, self.before, self.after
            )));
        }
        if self.before > MAX_WINDOW_YEARS || self.after > MAX_WINDOW_YEARS {
            return Err(GraphError::InvalidWindow(format!(
                "before {} and after {} must not exceed {} years",
                self.before, self.after, MAX_WINDOW_YEARS
            )));
        }

        (self.from..=self.to)
            .step_by(self.step)
            .map(|year| -> Result<(i32, YearWindow, YearWindow)> {
                let bounds = year
                    .checked_add(self.before)
                    .and_then(|split| Some((split, split.checked_add(self.after)?)));
                let (split, end) = bounds.ok_or_else(|| {
                    GraphError::InvalidWindow(format!(
                        "{}: window of {}+{} years overflows",
                        year, self.before, self.after
                    ))
                })?;
                Ok((
                    year,
                    YearWindow::from_range(year..split),
                    YearWindow::from_range(split..end),
                ))
            })
            .collect()
    }
}

/// Runs `triadic_closure` for every label year in the schedule.
pub fn closure_series(graph: &CastGraph, schedule: &ClosureSchedule) -> Result<Vec<ClosureRow>> {
    let rows = schedule
        .windows()?
        .into_iter()
        .map(|(year, before, after)| triadic_closure(graph, year, &before, &after))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "Closure series {}..={} step {}: {} rows",
        schedule.from,
        schedule.to,
        schedule.step,
        rows.len()
    );
    Ok(rows)
}
