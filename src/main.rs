mod db;
mod dump;
mod load;
mod parser;
mod record;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use settings::Settings;

#[derive(Parser)]
#[command(name = "wiki_people", about = "Extract person infoboxes from wiki dumps into SQLite")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Stream an XML dump (.xml or .xml.bz2) into the database
    Load {
        #[arg(value_name = "DUMP")]
        path: PathBuf,
        /// Max pages to process (default: whole dump)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Run the extractor on one markup file and print the fields as JSON
    Extract {
        file: PathBuf,
        /// Article title (default: file stem)
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Show row counts
    Stats,
    /// Search loaded people
    Search {
        /// Substring of the name
        #[arg(long)]
        name: Option<String>,
        /// Birth year, e.g. 1955
        #[arg(short, long)]
        year: Option<String>,
        /// Substring of the birth place
        #[arg(short, long)]
        place: Option<String>,
        /// Substring of an occupation (case-insensitive)
        #[arg(short, long)]
        occupation: Option<String>,
        /// Number of children: N, or N+ for at least N
        #[arg(short, long)]
        children: Option<db::ChildrenFilter>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Show spouses and partners of people whose name matches
    Relationships {
        name: String,
        /// Max people to display
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    tracing::debug!(?settings, "settings loaded");

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            println!("Schema ready in {}", settings.db_path.display());
            Ok(())
        }
        Commands::Load { path, limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let reader = dump::open_dump(&path)
                .with_context(|| format!("opening dump {}", path.display()))?;
            println!("Loading {} into {}...", path.display(), settings.db_path.display());
            let counts = load::load_dump(&conn, reader, &settings, limit)?;
            counts.print();
            Ok(())
        }
        Commands::Extract { file, title } => {
            let markup = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let title = title.unwrap_or_else(|| {
                file.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
            match parser::extract(&title, &markup, &settings.extract_config()) {
                Some(record) => {
                    let fields = record.to_fields(&settings.list_delimiter);
                    println!("{}", serde_json::to_string_pretty(&fields)?);
                }
                None => println!("No person infobox found in {}.", file.display()),
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("People:          {}", s.people);
            println!("With birth date: {}", s.with_birth_date);
            println!("With children:   {}", s.with_children);
            println!("Occupations:     {}", s.occupations);
            println!("Works:           {}", s.works);
            println!("Awards:          {}", s.awards);
            Ok(())
        }
        Commands::Search { name, year, place, occupation, children, limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let filter = db::SearchFilter { name, year, place, occupation, children, limit };
            let rows = db::search_people(&conn, &filter)?;
            if rows.is_empty() {
                println!("No people found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<28} | {:<10} | {:<24} | {:<30}",
                "#", "Name", "Born", "Birth place", "Occupations"
            );
            println!("{}", "-".repeat(106));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<28} | {:<10} | {:<24} | {:<30}",
                    i + 1,
                    truncate(&r.name, 28),
                    r.birth_date,
                    truncate(&r.birth_place, 24),
                    truncate(&r.occupations, 30),
                );
            }

            let renamed: Vec<_> = rows.iter().filter(|r| r.name != r.person_id).collect();
            if !renamed.is_empty() {
                println!("\n--- Article titles ---");
                for r in &renamed {
                    println!("  {}: {}", truncate(&r.name, 28), r.person_id);
                }
            }

            println!("\n{} people", rows.len());
            Ok(())
        }
        Commands::Relationships { name, limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let filter = db::SearchFilter { name: Some(name), limit, ..Default::default() };
            let rows: Vec<_> = db::search_people(&conn, &filter)?
                .into_iter()
                .filter(|r| r.has_relationships())
                .collect();
            if rows.is_empty() {
                println!("No relationship history found.");
                return Ok(());
            }
            for r in &rows {
                println!("{}", r.name);
                if !r.spouse.is_empty() {
                    println!("  Spouse:  {}", r.spouse);
                }
                if !r.partner.is_empty() {
                    println!("  Partner: {}", r.partner);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
