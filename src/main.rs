use anyhow::Result;
use clap::{Parser, Subcommand};

use pagelink::api::{ApiClient, Remote};
use pagelink::graph::{self, BacklinkKind, BacklinkReport, GraphFormat, LinkOutcome, RelationGraph};
use pagelink::model::{Parent, PropertyValue};
use pagelink::workspace::{self, Workspace};
use pagelink::Config;

#[derive(Debug, Parser)]
#[command(
    name = "pagelink",
    version,
    about = "Backlink and relation-graph tooling for hosted page workspaces"
)]
struct Cli {
    /// Report skipped collections and unreachable pages on stderr
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Find every page referencing the target
    Backlinks {
        page_id: String,
        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Add a reference to a relation property
    Link {
        source: String,
        target: String,
        #[arg(long)]
        property: String,
        /// Mirror the link on the target using the same property
        #[arg(long)]
        both: bool,
    },
    /// Remove a reference from a relation property
    Unlink {
        source: String,
        target: String,
        #[arg(long)]
        property: String,
        /// Mirror the removal on the target using the same property
        #[arg(long)]
        both: bool,
    },
    /// Walk relation edges outward from a page
    Graph {
        page_id: String,
        /// Maximum number of hops from the root
        #[arg(long)]
        depth: Option<usize>,
        /// Output format: json, dot or outline
        #[arg(long, default_value = "outline")]
        format: GraphFormat,
    },
    /// Fetch one page and print its title and properties
    Page { page_id: String },
    /// Search pages by text
    Search { query: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let token = config.api_token()?;
    let client = ApiClient::new(
        &config.api.base_url,
        token,
        config.api.timeout_secs,
        config.api.max_retries,
    )?;
    let ws = Workspace::new(client);

    match cli.command {
        Commands::Backlinks { page_id, json } => {
            run_backlinks(&ws, &config, &page_id, json, cli.verbose).await?;
        }
        Commands::Link {
            source,
            target,
            property,
            both,
        } => {
            let report = graph::link(&ws, &source, &target, &property, both).await?;
            print_link_report(&report, &source, &target);
        }
        Commands::Unlink {
            source,
            target,
            property,
            both,
        } => {
            let report = graph::unlink(&ws, &source, &target, &property, both).await?;
            print_link_report(&report, &source, &target);
        }
        Commands::Graph {
            page_id,
            depth,
            format,
        } => {
            let depth = depth.unwrap_or(config.graph.default_depth);
            let relation_graph = graph::traverse(&ws, &page_id, depth).await?;
            print!("{}", graph::render(&relation_graph, format)?);
            report_graph_coverage(&relation_graph, cli.verbose);
        }
        Commands::Page { page_id } => {
            run_page(&ws, &page_id).await?;
        }
        Commands::Search { query } => {
            let hits = ws.search_pages(&query, config.graph.search_page_size).await?;
            if hits.is_empty() {
                println!("No results found.");
            }
            for hit in &hits {
                println!("{}  {}", hit.id, workspace::title(hit));
            }
        }
    }

    Ok(())
}

async fn run_backlinks<R: Remote>(
    ws: &Workspace<R>,
    config: &Config,
    page_id: &str,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let report = graph::find_backlinks(
        ws,
        page_id,
        config.graph.collection_page_size,
        config.graph.search_page_size,
    )
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_backlink_report(&report);
    }
    report_backlink_coverage(&report, verbose);
    Ok(())
}

fn print_backlink_report(report: &BacklinkReport) {
    println!(
        "Backlinks for {} ({}):",
        report.target_title, report.target_id
    );
    if report.records.is_empty() {
        println!("  (none found)");
    }
    for record in &report.records {
        match &record.kind {
            BacklinkKind::Relation { property } => println!(
                "  relation  {} ({}) via '{}'",
                record.source_title, record.source_id, property
            ),
            BacklinkKind::Mention => {
                println!("  mention   {} ({})", record.source_title, record.source_id);
            }
        }
    }
}

fn report_backlink_coverage(report: &BacklinkReport, verbose: bool) {
    if !verbose || !report.partial() {
        return;
    }
    for db in &report.skipped_databases {
        eprintln!("warning: collection {} was skipped (not accessible)", db);
    }
    if report.search_failed {
        eprintln!("warning: the mention search pass failed and was skipped");
    }
    eprintln!("warning: results are incomplete");
}

fn report_graph_coverage(relation_graph: &RelationGraph, verbose: bool) {
    if !verbose || relation_graph.unreachable.is_empty() {
        return;
    }
    for id in &relation_graph.unreachable {
        eprintln!("warning: page {} was unreachable and skipped", id);
    }
}

fn print_link_report(report: &graph::LinkReport, source: &str, target: &str) {
    println!(
        "{} -> {} via '{}': {}",
        source,
        target,
        report.property,
        outcome_line(report.forward)
    );
    if let Some(reverse) = report.reverse {
        println!(
            "{} -> {} via '{}': {}",
            target,
            source,
            report.property,
            outcome_line(reverse)
        );
    }
}

fn outcome_line(outcome: LinkOutcome) -> &'static str {
    match outcome {
        LinkOutcome::Linked => "linked",
        LinkOutcome::AlreadyLinked => "already linked, nothing to do",
        LinkOutcome::Unlinked => "unlinked",
        LinkOutcome::NotLinked => "was not linked",
        LinkOutcome::SkippedNoProperty => "skipped (property missing or not a relation)",
    }
}

async fn run_page<R: Remote>(ws: &Workspace<R>, page_id: &str) -> Result<()> {
    let page = ws.page(page_id).await?;
    println!("{} ({})", workspace::title(&page), page.id);
    match &page.parent {
        Parent::DatabaseId { database_id } => println!("parent: database {}", database_id),
        Parent::PageId { page_id } => println!("parent: page {}", page_id),
        Parent::Workspace => println!("parent: workspace"),
        Parent::Other => println!("parent: (other)"),
    }
    for (name, value) in &page.properties {
        println!("  {}: {}", name, describe(value));
    }
    Ok(())
}

fn describe(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Title { .. } => "title".to_string(),
        PropertyValue::RichText { rich_text } => {
            let text: String = rich_text.iter().map(|r| r.plain_text.as_str()).collect();
            let preview: String = text.chars().take(60).collect();
            format!("text \"{}\"", preview)
        }
        PropertyValue::Relation { relation } => format!("relation ({} refs)", relation.len()),
        PropertyValue::Select { select } => match select {
            Some(option) => format!("select: {}", option.name),
            None => "select: -".to_string(),
        },
        PropertyValue::MultiSelect { multi_select } => {
            let names: Vec<&str> = multi_select.iter().map(|o| o.name.as_str()).collect();
            format!("multi-select: {}", names.join(", "))
        }
        PropertyValue::Number { number } => match number {
            Some(n) => format!("number: {}", n),
            None => "number: -".to_string(),
        },
        PropertyValue::Checkbox { checkbox } => format!("checkbox: {}", checkbox),
        PropertyValue::Url { url } => match url {
            Some(u) => format!("url: {}", u),
            None => "url: -".to_string(),
        },
        PropertyValue::Other => "(unsupported type)".to_string(),
    }
}
