use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use feedscout::config::Config;
use feedscout::discover::{DiscoveryEngine, DiscoveryResult, DiscoveryStatus, SiteTarget};
use feedscout::export;
use feedscout::storage::Database;
use feedscout::util::parse_site_url;

#[derive(Parser, Debug)]
#[command(
    name = "feedscout",
    about = "Discover RSS/Atom feeds and hub links for a list of websites"
)]
struct Args {
    /// Input file: one website URL per line ('#' lines are comments)
    input: PathBuf,

    /// Config file (TOML); a missing file means defaults
    #[arg(long, value_name = "FILE", default_value = "feedscout.toml")]
    config: PathBuf,

    /// SQLite database for discovered feeds
    #[arg(long, value_name = "FILE", default_value = "feedscout.db")]
    db: PathBuf,

    /// Skip persisting results to the database
    #[arg(long)]
    no_store: bool,

    /// Also export results to a CSV file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config).context("Failed to load configuration")?;

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read input file {}", args.input.display()))?;

    // Bad entries are reported per line; the batch keeps going.
    let mut sites = Vec::new();
    let mut rejected = 0usize;
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_site_url(line) {
            Ok(url) => sites.push(SiteTarget::new(url)),
            Err(err) => {
                rejected += 1;
                eprintln!("Skipping line {}: {line} ({err})", line_no + 1);
            }
        }
    }

    if sites.is_empty() {
        eprintln!("No valid site URLs in {}", args.input.display());
        eprintln!();
        eprintln!("Expected one website per line, e.g.:");
        eprintln!("  https://example.com");
        eprintln!("  blog.example.org");
        std::process::exit(1);
    }

    println!(
        "Loaded {} site(s) from {} ({} rejected)",
        sites.len(),
        args.input.display(),
        rejected
    );

    let engine = DiscoveryEngine::new(&config).context("Failed to build HTTP client")?;
    let results = engine.discover_all(sites).await;

    if !args.no_store {
        let db_path = args
            .db
            .to_str()
            .context("Invalid UTF-8 in database path")?;
        let db = Database::open(db_path)
            .await
            .with_context(|| format!("Failed to open database {}", args.db.display()))?;
        db.save_all(&results)
            .await
            .context("Failed to save results")?;
        println!("Saved results to {}", args.db.display());
    }

    if let Some(path) = &args.export {
        let rows = export::write_csv(path, &results)
            .with_context(|| format!("Failed to export to {}", path.display()))?;
        println!("Exported {rows} feed(s) to {}", path.display());
    }

    print_summary(&results);
    Ok(())
}

fn print_summary(results: &[DiscoveryResult]) {
    let total = results.len();
    let with_feeds = results.iter().filter(|r| !r.feeds.is_empty()).count();
    let unreachable = results
        .iter()
        .filter(|r| r.status == DiscoveryStatus::Failed)
        .count();
    let total_feeds: usize = results.iter().map(|r| r.feeds.len()).sum();
    let total_hubs: usize = results.iter().map(|r| r.hubs.len()).sum();

    println!();
    println!("{}", "=".repeat(60));
    println!("DISCOVERY SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Sites processed:        {total}");
    println!("Sites with feeds:       {with_feeds}");
    println!("Sites without feeds:    {}", total - with_feeds - unreachable);
    println!("Sites unreachable:      {unreachable}");
    println!("Feeds discovered:       {total_feeds}");
    println!("Hub links discovered:   {total_hubs}");
    if with_feeds > 0 {
        println!(
            "Average feeds per site: {:.1}",
            total_feeds as f64 / with_feeds as f64
        );
    }
    println!("{}", "=".repeat(60));
}
