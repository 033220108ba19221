//! CLI command implementations.

use crate::config::{Config, CONFIG_DIR};
use colored::Colorize;
use costar_core::{NodeRef, Roster};
use costar_graph::{
    closure_series, CastGraph, GraphBuilder, GraphStore, PathStrategy, PerformerFilter,
    ProductionFilter,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Filters accepted by `costar prune`.
pub struct PruneArgs {
    pub min_stars: Option<f64>,
    pub min_votes: Option<u32>,
    pub min_percentile: Option<f64>,
    pub top: Option<usize>,
    pub min_roles: Option<usize>,
    pub dry_run: bool,
}

/// Overrides for the configured closure schedule.
pub struct ClosureArgs {
    pub from: Option<i32>,
    pub to: Option<i32>,
    pub step: Option<usize>,
    pub before: Option<i32>,
    pub after: Option<i32>,
}

/// Initialize Costar in a directory.
pub fn init(path: &Path) -> Result<()> {
    if path.join(CONFIG_DIR).exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    Config::default().save(path)?;

    println!("{} Initialized Costar in {}", "✓".green(), path.display());
    println!("  Run {} to build a graph", "costar import <roster.json>".cyan());

    Ok(())
}

/// Build the graph from a roster and save it as the project snapshot.
pub fn import(
    path: &Path,
    roster: &Path,
    roles: Option<&Path>,
    keep_isolated: bool,
) -> Result<()> {
    let config = Config::load(path)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message("Reading roster...");

    let mut records = Roster::from_path(roster)?;
    if let Some(lines) = roles {
        let added = records.extend_roles_from_lines(&fs::read_to_string(lines)?)?;
        spinner.set_message(format!("Read {} extra roles...", added));
    }

    spinner.set_message("Building graph...");
    let mut builder = GraphBuilder::new();
    builder.add_roster(records)?;
    let (mut graph, report) = builder.build();

    spinner.finish_and_clear();

    println!(
        "{} Built {} productions, {} performers, {} roles",
        "✓".green(),
        report.productions.to_string().cyan(),
        report.performers.to_string().cyan(),
        report.roles.to_string().cyan()
    );

    if !report.skipped.is_empty() {
        println!("\n{} roles skipped:", "⚠".yellow());
        for skipped in report.skipped.iter().take(5) {
            println!(
                "  {} in '{}' ({}) - {}",
                skipped.role.performer.red(),
                skipped.role.production,
                skipped.role.year,
                skipped.reason
            );
        }
        if report.skipped.len() > 5 {
            println!("  ... and {} more", report.skipped.len() - 5);
        }
    }

    if !keep_isolated {
        let cleanup = graph.cleanup();
        if !cleanup.is_noop() {
            println!(
                "{} Pruned {} isolated performers, {} empty productions",
                "✓".green(),
                cleanup.performers_removed,
                cleanup.productions_removed
            );
        }
    }

    let store = GraphStore::open(config.store_path(path))?;
    store.save_graph(&graph)?;
    println!(
        "{} Saved snapshot to {}",
        "✓".green(),
        config.store_path(path).display()
    );

    Ok(())
}

/// Show snapshot statistics.
pub fn status(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    let store = GraphStore::open(config.store_path(path))?;

    let Some(graph) = store.load_graph()? else {
        println!("{} No snapshot yet", "⚠".yellow());
        println!("  Run {} to build one", "costar import <roster.json>".cyan());
        return Ok(());
    };

    let stats = graph.stats();
    println!("{}", "Costar Status".cyan().bold());
    println!("{}", "═".repeat(40));
    println!("Performers:   {}", stats.performers.to_string().green());
    println!("Productions:  {}", stats.productions.to_string().green());
    println!("Roles:        {}", stats.roles.to_string().green());

    let first = graph.productions().map(|m| m.year).min();
    let last = graph.productions().map(|m| m.year).max();
    if let (Some(first), Some(last)) = (first, last) {
        println!("Years:        {}..={}", first, last);
    }
    println!(
        "Path search:  {} (max {} nodes)",
        config.paths.strategy, config.paths.max_nodes
    );

    Ok(())
}

/// Show the component reachable from a performer.
pub fn component(
    path: &Path,
    performer: &str,
    min_stars: Option<f64>,
    save: bool,
    json: bool,
) -> Result<()> {
    let (_, store, graph) = load_snapshot(path)?;
    let seed = graph.lookup_performer(performer)?;

    let component = match min_stars {
        Some(stars) => {
            graph.extract_component_filtered(seed, &ProductionFilter::MinStars(stars))?
        }
        None => graph.extract_component(seed)?,
    };
    let stats = component.stats();

    if json {
        let names: Vec<&str> = component.performers().map(|p| p.name.as_str()).collect();
        let output = serde_json::json!({
            "seed": performer,
            "stats": stats,
            "performers": names,
            "roles": component.role_edges(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {}", "Component of".cyan().bold(), performer.cyan().bold());
        println!("{}", "═".repeat(40));
        println!(
            "Performers:   {} of {}",
            stats.performers.to_string().green(),
            graph.performer_count()
        );
        println!(
            "Productions:  {} of {}",
            stats.productions.to_string().green(),
            graph.production_count()
        );
        println!("Roles:        {}", stats.roles.to_string().green());
    }

    if save {
        store.save_graph(&component)?;
        println!("{} Replaced snapshot with component", "✓".green());
    }

    Ok(())
}

/// Narrow the stored graph by production and performer filters.
pub fn prune(path: &Path, args: PruneArgs) -> Result<()> {
    let (_, store, mut graph) = load_snapshot(path)?;

    let productions = production_filter(&args);
    let performers = match args.min_roles {
        Some(n) => PerformerFilter::MinRoles(n),
        None => PerformerFilter::All,
    };

    let report = graph.narrow(&productions, &performers);

    println!(
        "{} Removed {} performers, {} productions, {} roles in {} passes",
        "✓".green(),
        report.performers_removed.to_string().cyan(),
        report.productions_removed.to_string().cyan(),
        report.edges_removed.to_string().cyan(),
        report.passes
    );
    println!(
        "  {} performers, {} productions remain",
        graph.performer_count(),
        graph.production_count()
    );

    if args.dry_run {
        println!("  {} nothing saved", "dry run:".yellow());
        return Ok(());
    }

    store.save_graph(&graph)?;
    Ok(())
}

fn production_filter(args: &PruneArgs) -> ProductionFilter {
    let mut filters = Vec::new();
    if let Some(stars) = args.min_stars {
        filters.push(ProductionFilter::MinStars(stars));
    }
    if let Some(votes) = args.min_votes {
        filters.push(ProductionFilter::MinVotes(votes));
    }
    if let Some(percentile) = args.min_percentile {
        filters.push(ProductionFilter::MinStarsPercentile(percentile));
    }
    if let Some(n) = args.top {
        filters.push(ProductionFilter::TopRated(n));
    }

    match filters.len() {
        0 => ProductionFilter::All,
        1 => filters.remove(0),
        _ => ProductionFilter::And(filters),
    }
}

/// Compute closeness centrality and print the most central nodes.
pub fn closeness(
    path: &Path,
    performer: Option<&str>,
    limit: usize,
    strategy: Option<PathStrategy>,
    json: bool,
) -> Result<()> {
    let (config, _, graph) = load_snapshot(path)?;

    let graph = match performer {
        Some(name) => graph.extract_component(graph.lookup_performer(name)?)?,
        None => graph,
    };

    let mut options = config.paths;
    if let Some(strategy) = strategy {
        options.strategy = strategy;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!(
        "Computing shortest paths over {} nodes...",
        graph.performer_count() + graph.production_count()
    ));

    let paths = graph.shortest_paths(&options);
    spinner.finish_and_clear();
    let paths = paths?;

    let top = paths.top_closeness(limit);
    let distribution = paths.closeness_distribution();

    if json {
        let ranked: Vec<_> = top
            .iter()
            .map(|&(node, score)| {
                serde_json::json!({
                    "node": node.to_string(),
                    "name": node_label(&graph, node),
                    "closeness": score,
                })
            })
            .collect();
        let output = serde_json::json!({
            "strategy": options.strategy,
            "nodes": paths.node_count(),
            "top": ranked,
            "distribution": distribution,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "Closeness Centrality".cyan().bold());
    println!("{}", "═".repeat(50));
    println!();

    for (i, (node, score)) in top.iter().enumerate() {
        println!(
            "{:2}. {} {:.4}",
            i + 1,
            node_label(&graph, *node).cyan(),
            score
        );
    }

    println!();
    println!("{}", "Distribution (% of nodes per decile)".cyan());
    for (decile, percent) in distribution.iter().enumerate() {
        if *percent > 0 {
            let bar = "█".repeat(*percent as usize / 2);
            println!("  {:.1}  {:3}% {}", decile as f64 / 10.0, percent, bar);
        }
    }

    Ok(())
}

/// Run the triadic closure sweep and print one row per label year.
pub fn closure(path: &Path, args: ClosureArgs, json: bool) -> Result<()> {
    let (config, _, graph) = load_snapshot(path)?;

    let mut schedule = config.closure;
    if let Some(from) = args.from {
        schedule.from = from;
    }
    if let Some(to) = args.to {
        schedule.to = to;
    }
    if let Some(step) = args.step {
        schedule.step = step;
    }
    if let Some(before) = args.before {
        schedule.before = before;
    }
    if let Some(after) = args.after {
        schedule.after = after;
    }

    let rows = closure_series(&graph, &schedule)?;

    if json {
        let output: Vec<_> = rows.iter().map(|row| row.as_tuple()).collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("year,no_shared,shared");
    for row in &rows {
        let (year, no_shared, shared) = row.as_tuple();
        println!("{},{},{}", year, fraction_cell(no_shared), fraction_cell(shared));
    }

    Ok(())
}

fn fraction_cell(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

/// Export the stored snapshot as JSON.
pub fn export(path: &Path, output: &Path) -> Result<()> {
    let (_, _, graph) = load_snapshot(path)?;
    fs::write(output, serde_json::to_string_pretty(&graph.store())?)?;
    println!("{} Exported to {}", "✓".green(), output.display());
    Ok(())
}

/// Loads the project snapshot, keeping the store open for saving.
fn load_snapshot(path: &Path) -> Result<(Config, GraphStore, CastGraph)> {
    let config = Config::load(path)?;
    let store = GraphStore::open(config.store_path(path))?;
    match store.load_graph()? {
        Some(graph) => Ok((config, store, graph)),
        None => Err(format!(
            "no snapshot in {}; run `costar import` first",
            config.store_path(path).display()
        )
        .into()),
    }
}

fn node_label(graph: &CastGraph, node: NodeRef) -> String {
    match node {
        NodeRef::Performer(id) => graph
            .performer(id)
            .map_or_else(|| id.to_string(), |p| p.name.clone()),
        NodeRef::Production(id) => graph
            .production(id)
            .map_or_else(|| id.to_string(), |m| format!("{} ({})", m.name, m.year)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ROSTER: &str = r#"{
        "productions": [
            {"name": "Harbor Lights", "year": 1950, "stars": 7.5, "votes": 900},
            {"name": "Night Train", "year": 1952, "stars": 5.0, "votes": 40},
            {"name": "Unseen", "year": 1953}
        ],
        "roles": [
            {"performer": "X", "production": "Harbor Lights", "year": 1950},
            {"performer": "Y", "production": "Harbor Lights", "year": "1950"},
            {"performer": "Y", "production": "Night Train", "year": 1952},
            {"performer": "Z", "production": "Night Train", "year": 1952}
        ]
    }"#;

    fn imported(keep_isolated: bool) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let roster = dir.path().join("roster.json");
        fs::write(&roster, ROSTER).unwrap();
        init(dir.path()).unwrap();
        import(dir.path(), &roster, None, keep_isolated).unwrap();
        dir
    }

    #[test]
    fn test_import_prunes_isolated_productions() {
        let dir = imported(false);
        let (_, _, graph) = load_snapshot(dir.path()).unwrap();
        assert_eq!(graph.performer_count(), 3);
        assert_eq!(graph.production_count(), 2);
        assert!(graph.find_production("Unseen", 1953).is_none());
    }

    #[test]
    fn test_import_keep_isolated() {
        let dir = imported(true);
        let (_, _, graph) = load_snapshot(dir.path()).unwrap();
        assert_eq!(graph.production_count(), 3);
    }

    #[test]
    fn test_import_extra_role_lines() {
        let dir = tempdir().unwrap();
        let roster = dir.path().join("roster.json");
        let lines = dir.path().join("roles.txt");
        fs::write(&roster, ROSTER).unwrap();
        fs::write(&lines, "# extra\nW;Night Train;1952\n").unwrap();

        import(dir.path(), &roster, Some(&lines), false).unwrap();
        let (_, _, graph) = load_snapshot(dir.path()).unwrap();
        assert_eq!(graph.performer_count(), 4);
    }

    #[test]
    fn test_commands_need_a_snapshot() {
        let dir = tempdir().unwrap();
        let err = closure(
            dir.path(),
            ClosureArgs {
                from: None,
                to: None,
                step: None,
                before: None,
                after: None,
            },
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("costar import"));
    }

    #[test]
    fn test_prune_dry_run_keeps_snapshot() {
        let dir = imported(false);
        let args = PruneArgs {
            min_stars: Some(7.0),
            min_votes: None,
            min_percentile: None,
            top: None,
            min_roles: None,
            dry_run: true,
        };
        prune(dir.path(), args).unwrap();
        let (_, _, graph) = load_snapshot(dir.path()).unwrap();
        assert_eq!(graph.production_count(), 2);
    }

    #[test]
    fn test_prune_saves_narrowed_graph() {
        let dir = imported(false);
        let args = PruneArgs {
            min_stars: Some(7.0),
            min_votes: Some(100),
            min_percentile: None,
            top: None,
            min_roles: None,
            dry_run: false,
        };
        prune(dir.path(), args).unwrap();
        let (_, _, graph) = load_snapshot(dir.path()).unwrap();
        assert_eq!(graph.production_count(), 1);
        assert_eq!(graph.performer_count(), 2);
        assert!(graph.lookup_performer("Z").is_err());
    }

    #[test]
    fn test_component_save_replaces_snapshot() {
        let dir = imported(false);
        component(dir.path(), "X", Some(7.0), true, true).unwrap();
        let (_, _, graph) = load_snapshot(dir.path()).unwrap();
        assert_eq!(graph.performer_count(), 2);
        assert_eq!(graph.production_count(), 1);
    }

    #[test]
    fn test_closeness_and_export() {
        let dir = imported(false);
        closeness(dir.path(), Some("X"), 3, Some(PathStrategy::Bfs), true).unwrap();

        let out = dir.path().join("graph.json");
        export(dir.path(), &out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        let stored: costar_graph::StoredGraph = serde_json::from_str(&text).unwrap();
        assert_eq!(stored.performers.len(), 3);
        stored.restore().unwrap();
    }

    #[test]
    fn test_production_filter_combines_flags() {
        let args = PruneArgs {
            min_stars: Some(6.0),
            min_votes: None,
            min_percentile: None,
            top: Some(2),
            min_roles: None,
            dry_run: false,
        };
        assert_eq!(
            production_filter(&args),
            ProductionFilter::And(vec![
                ProductionFilter::MinStars(6.0),
                ProductionFilter::TopRated(2)
            ])
        );
    }

    #[test]
    fn test_fraction_cell() {
        assert_eq!(fraction_cell(None), "n/a");
        assert_eq!(fraction_cell(Some(0.5)), "0.5000");
    }
}
