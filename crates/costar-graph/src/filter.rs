//! Node filters used to narrow a graph.
//!
//! Filters are plain values rather than closures so they can be built
//! from configuration or CLI flags and logged. Some kinds depend on the
//! whole graph (rating percentile, top-N), so a filter is evaluated
//! against a graph and yields the set of ids it keeps.

use crate::graph::CastGraph;
use costar_core::{PerformerId, Production, ProductionId};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Selects productions.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProductionFilter {
    /// Keeps everything.
    #[default]
    All,
    /// Released in exactly this year.
    Year(i32),
    /// Released within the range.
    Years(RangeInclusive<i32>),
    /// Rated at least this many stars.
    MinStars(f64),
    /// At least this many votes.
    MinVotes(u32),
    /// Rating percentile (0-100) among all productions at least this value.
    MinStarsPercentile(f64),
    /// The N best rated productions, ties broken by votes then id.
    TopRated(usize),
    /// Every inner filter must keep the production.
    And(Vec<ProductionFilter>),
}

impl ProductionFilter {
    /// Ids of the productions in `graph` this filter keeps.
    pub fn select(&self, graph: &CastGraph) -> BTreeSet<ProductionId> {
        match self {
            Self::All => graph.productions().map(|m| m.id).collect(),
            Self::Year(year) => keep_where(graph, |m| m.year == *year),
            Self::Years(range) => keep_where(graph, |m| range.contains(&m.year)),
            Self::MinStars(min) => keep_where(graph, |m| m.stars >= *min),
            Self::MinVotes(min) => keep_where(graph, |m| m.votes >= *min),
            Self::MinStarsPercentile(min) => {
                let mut ratings: Vec<f64> = graph.productions().map(|m| m.stars).collect();
                ratings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
                keep_where(graph, |m| stars_percentile(&ratings, m.stars) >= *min)
            }
            Self::TopRated(n) => {
                let mut ranked: Vec<&Production> = graph.productions().collect();
                ranked.sort_by(|a, b| {
                    b.stars
                        .partial_cmp(&a.stars)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| b.votes.cmp(&a.votes))
                        .then_with(|| a.id.cmp(&b.id))
                });
                ranked.into_iter().take(*n).map(|m| m.id).collect()
            }
            Self::And(filters) => {
                let mut selected = Self::All.select(graph);
                for filter in filters {
                    let keep = filter.select(graph);
                    selected.retain(|id| keep.contains(id));
                }
                selected
            }
        }
    }
}

fn keep_where<F>(graph: &CastGraph, predicate: F) -> BTreeSet<ProductionId>
where
    F: Fn(&Production) -> bool,
{
    graph
        .productions()
        .filter(|m| predicate(m))
        .map(|m| m.id)
        .collect()
}

/// Percentile rank of `stars` within sorted `ratings`, on a 0-100 scale.
///
/// Ties take the midpoint of their lower and upper rank.
pub fn stars_percentile(ratings: &[f64], stars: f64) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let n = ratings.len() as f64;
    let lower = ratings.partition_point(|&r| r < stars) as f64;
    let upper = ratings.partition_point(|&r| r <= stars) as f64;
    (lower / n + upper / n) * 50.0
}

/// Selects performers.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PerformerFilter {
    #[default]
    All,
    /// Appears in at least this many productions.
    MinRoles(usize),
    /// Only performers with one of these names.
    Named(BTreeSet<String>),
}

impl PerformerFilter {
    /// Ids of the performers in `graph` this filter keeps.
    pub fn select(&self, graph: &CastGraph) -> BTreeSet<PerformerId> {
        graph
            .performers()
            .filter(|p| match self {
                Self::All => true,
                Self::MinRoles(min) => p.role_count() >= *min,
                Self::Named(names) => names.contains(&p.name),
            })
            .map(|p| p.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_ratings(ratings: &[(i32, f64, u32)]) -> CastGraph {
        let mut graph = CastGraph::new();
        for (i, &(year, stars, votes)) in ratings.iter().enumerate() {
            graph
                .add_production(Production::new(format!("P{}", i), year, stars, votes))
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_simple_filters() {
        let graph = graph_with_ratings(&[(1950, 5.0, 10), (1960, 7.5, 500), (1970, 9.0, 20)]);

        assert_eq!(ProductionFilter::All.select(&graph).len(), 3);
        assert_eq!(ProductionFilter::Year(1960).select(&graph).len(), 1);
        assert_eq!(ProductionFilter::Years(1955..=1975).select(&graph).len(), 2);
        assert_eq!(ProductionFilter::MinStars(7.5).select(&graph).len(), 2);
        assert_eq!(ProductionFilter::MinVotes(100).select(&graph).len(), 1);
    }

    #[test]
    fn test_top_rated_breaks_ties_by_votes() {
        let graph = graph_with_ratings(&[(2000, 8.0, 10), (2000, 8.0, 99), (2000, 6.0, 1000)]);
        let top = ProductionFilter::TopRated(1).select(&graph);
        assert_eq!(top.into_iter().collect::<Vec<_>>(), vec![ProductionId::new(2)]);
    }

    #[test]
    fn test_percentile_midpoint() {
        let ratings = [1.0, 2.0, 2.0, 4.0];
        assert_eq!(stars_percentile(&ratings, 1.0), 12.5);
        assert_eq!(stars_percentile(&ratings, 2.0), 50.0);
        assert_eq!(stars_percentile(&ratings, 4.0), 87.5);
        assert_eq!(stars_percentile(&[], 4.0), 0.0);
    }

    #[test]
    fn test_percentile_select_keeps_ties_together() {
        let graph = graph_with_ratings(&[
            (2000, 5.0, 1),
            (2000, 7.0, 1),
            (2001, 7.0, 1),
            (2002, 9.0, 1),
        ]);

        let kept: Vec<_> = ProductionFilter::MinStarsPercentile(50.0)
            .select(&graph)
            .into_iter()
            .collect();
        assert_eq!(
            kept,
            vec![ProductionId::new(2), ProductionId::new(3), ProductionId::new(4)]
        );

        let kept: Vec<_> = ProductionFilter::MinStarsPercentile(50.1)
            .select(&graph)
            .into_iter()
            .collect();
        assert_eq!(kept, vec![ProductionId::new(4)]);
    }

    #[test]
    fn test_and_intersects() {
        let graph = graph_with_ratings(&[(1950, 9.0, 10), (1960, 9.0, 500), (1960, 3.0, 900)]);
        let filter = ProductionFilter::And(vec![
            ProductionFilter::Year(1960),
            ProductionFilter::MinStars(8.0),
        ]);
        let kept: Vec<_> = filter.select(&graph).into_iter().collect();
        assert_eq!(kept, vec![ProductionId::new(2)]);
    }

    #[test]
    fn test_performer_filters() {
        let mut graph = graph_with_ratings(&[(1950, 5.0, 1), (1951, 5.0, 1)]);
        let a = graph.add_performer(costar_core::Performer::new("A")).unwrap();
        let b = graph.add_performer(costar_core::Performer::new("B")).unwrap();
        graph.add_role(a, ProductionId::new(1)).unwrap();
        graph.add_role(a, ProductionId::new(2)).unwrap();
        graph.add_role(b, ProductionId::new(1)).unwrap();

        let busy = PerformerFilter::MinRoles(2).select(&graph);
        assert_eq!(busy.into_iter().collect::<Vec<_>>(), vec![a]);

        let named = PerformerFilter::Named(["B".to_string()].into_iter().collect()).select(&graph);
        assert_eq!(named.into_iter().collect::<Vec<_>>(), vec![b]);
    }
}
