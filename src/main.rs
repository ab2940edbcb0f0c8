use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use jobtrack::db::{self, ApplicationStatus, NewApplication};
use jobtrack::extract::{extract_local, ExtractionResult};
use jobtrack::{HtmlPage, Pipeline, Settings};

#[derive(Parser)]
#[command(name = "jobtrack", about = "Extract and track job applications from job pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract title, company and location from a page (file or URL)
    Extract {
        source: String,
        /// Skip remote escalation even if an endpoint is configured
        #[arg(long)]
        no_remote: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract a page and save it as an application
    Track {
        source: String,
        /// Initial status (pending, interview, rejected)
        #[arg(short, long, default_value = "pending")]
        status: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Schedule a follow-up this many days from now
        #[arg(long)]
        follow_up_days: Option<i64>,
        #[arg(long)]
        no_remote: bool,
    },
    /// Tracked applications table
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Change an application's status
    Status { id: i64, status: String },
    /// Remove an application
    Delete { id: i64 },
    /// Local-only extraction over every .html file in a directory
    Scan {
        dir: PathBuf,
        /// Max files to scan
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("loading settings")?;

    let result = match cli.command {
        Commands::Extract {
            source,
            no_remote,
            json,
        } => {
            let result = extract_source(&settings, &source, no_remote).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
            Ok(())
        }
        Commands::Track {
            source,
            status,
            notes,
            follow_up_days,
            no_remote,
        } => {
            let status: ApplicationStatus = status.parse()?;
            let result = extract_source(&settings, &source, no_remote).await?;
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let app = NewApplication {
                url: source.clone(),
                status,
                notes,
                follow_up_at: follow_up_days.map(|d| Utc::now() + Duration::days(d)),
            };
            let id = db::insert_application(&conn, &result, &app)?;
            print_result(&result);
            println!("\nSaved application #{} ({})", id, status);
            if result.likely_applied {
                println!("Page looks like an application confirmation.");
            }
            Ok(())
        }
        Commands::List { status, limit } => {
            let status = status
                .as_deref()
                .map(str::parse::<ApplicationStatus>)
                .transpose()?;
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::list_applications(&conn, status, limit)?;
            if rows.is_empty() {
                println!("No applications found.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<28} | {:<20} | {:<18} | {:<9} | {:<10} | {:>4} | {:<10}",
                "ID", "Role", "Company", "Location", "Status", "Source", "Conf", "Follow-up"
            );
            println!("{}", "-".repeat(124));
            for r in &rows {
                let follow_up = r
                    .follow_up_at
                    .as_deref()
                    .map(|t| t.chars().take(10).collect::<String>())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:>4} | {:<28} | {:<20} | {:<18} | {:<9} | {:<10} | {:>4.2} | {:<10}",
                    r.id,
                    truncate(&r.job_title, 28),
                    truncate(&r.company, 20),
                    truncate(&r.location, 18),
                    r.status,
                    r.source,
                    r.confidence,
                    follow_up
                );
            }

            let applied = rows.iter().filter(|r| r.likely_applied).count();
            println!("\n{} applications | {} confirmed submitted", rows.len(), applied);
            Ok(())
        }
        Commands::Status { id, status } => {
            let status: ApplicationStatus = status.parse()?;
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let previous = db::status_of(&conn, id)?;
            if !db::update_status(&conn, id, status)? {
                bail!("no application with id {}", id);
            }
            println!(
                "#{}: {} -> {}",
                id,
                previous.unwrap_or_else(|| "?".into()),
                status
            );
            Ok(())
        }
        Commands::Delete { id } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            if !db::delete_application(&conn, id)? {
                bail!("no application with id {}", id);
            }
            println!("Deleted application #{}", id);
            Ok(())
        }
        Commands::Scan { dir, limit } => {
            let mut files = html_files(&dir)?;
            if let Some(n) = limit {
                files.truncate(n);
            }
            if files.is_empty() {
                println!("No .html files in {}", dir.display());
                return Ok(());
            }
            println!("Scanning {} pages...", files.len());
            let results = scan_pages(&files);

            println!(
                "{:<28} | {:<28} | {:<20} | {:<18} | {:<10} | {:>4} | {:<7}",
                "File", "Role", "Company", "Location", "Source", "Conf", "Applied"
            );
            println!("{}", "-".repeat(128));
            let mut failed = 0;
            for (path, result) in files.iter().zip(&results) {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match result {
                    Ok(r) => println!(
                        "{:<28} | {:<28} | {:<20} | {:<18} | {:<10} | {:>4.2} | {:<7}",
                        truncate(&name, 28),
                        truncate(&r.job_title, 28),
                        truncate(&r.company, 20),
                        truncate(&r.location, 18),
                        r.source.as_str(),
                        r.confidence,
                        if r.likely_applied { "yes" } else { "" }
                    ),
                    Err(e) => {
                        failed += 1;
                        println!("{:<28} | error: {}", truncate(&name, 28), e);
                    }
                }
            }

            let ok: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
            let structured = ok
                .iter()
                .filter(|r| r.source == jobtrack::Source::Structured)
                .count();
            let strong = ok.iter().filter(|r| r.confidence >= settings.confidence_threshold).count();
            println!(
                "\n{} pages | {} structured | {} at or above {:.2} | {} unreadable",
                results.len(),
                structured,
                strong,
                settings.confidence_threshold,
                failed
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn extract_source(
    settings: &Settings,
    source: &str,
    no_remote: bool,
) -> anyhow::Result<ExtractionResult> {
    let html = load_source(source).await?;
    let pipeline = if no_remote {
        Pipeline::local_only()
    } else {
        Pipeline::from_settings(settings)
    };
    // HtmlPage is not Send, so the sync half runs before any await.
    let pass = {
        let page = HtmlPage::parse(&html, source);
        pipeline.prepare(&page)
    };
    if pass.payload.is_some() {
        info!(source, "local confidence {:.2}, escalating", pass.local.confidence);
    }
    Ok(pipeline.finish(pass).await)
}

async fn load_source(source: &str) -> anyhow::Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = reqwest::get(source)
            .await
            .with_context(|| format!("fetching {}", source))?
            .error_for_status()?;
        Ok(response.text().await?)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {}", source))
    }
}

fn html_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let is_html = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
            .unwrap_or(false);
        if path.is_file() && is_html {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn scan_pages(files: &[PathBuf]) -> Vec<anyhow::Result<ExtractionResult>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let results = files
        .par_iter()
        .map(|path| -> anyhow::Result<ExtractionResult> {
            let html = std::fs::read_to_string(path)?;
            let page = HtmlPage::parse(&html, format!("file://{}", path.display()));
            let result = extract_local(&page);
            pb.inc(1);
            Ok(result)
        })
        .collect();

    pb.finish_and_clear();
    results
}

fn print_result(r: &ExtractionResult) {
    println!("Role:       {}", or_dash(&r.job_title));
    println!("Company:    {}", or_dash(&r.company));
    println!("Location:   {}", or_dash(&r.location));
    println!("Source:     {}", r.source.as_str());
    println!("Confidence: {:.2}", r.confidence);
    println!("Applied:    {}", if r.likely_applied { "likely" } else { "no" });
    println!("Status:     {}", r.status_hint.as_str());
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
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
