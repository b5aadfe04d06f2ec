mod browser;
mod capture;
mod engine;
mod output;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;

use capture::PageCapture;
use engine::aggregate::ResultDocument;

#[derive(Parser)]
#[command(name = "fbpage_scraper", about = "Public Facebook business page scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the page, scroll it out, and save a raw capture (no extraction)
    Fetch {
        /// Public page URL, e.g. https://www.facebook.com/your-business-page
        url: String,
        /// Where to write the capture JSON
        #[arg(short, long, default_value = "output/capture.json")]
        capture: PathBuf,
        /// Override the detected business name
        #[arg(short, long)]
        name: Option<String>,
        /// Run the browser with a visible window
        #[arg(long)]
        headful: bool,
    },
    /// Run the extraction engine over a saved capture
    Process {
        /// Capture JSON produced by `fetch`
        capture: PathBuf,
        /// Output directory for result documents
        #[arg(short, long, default_value = "output")]
        out_dir: PathBuf,
        /// Override the capture's business name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Fetch + process in one pipeline
    Run {
        /// Public page URL
        url: String,
        /// Output directory for result documents
        #[arg(short, long, default_value = "output")]
        out_dir: PathBuf,
        /// Override the detected business name
        #[arg(short, long)]
        name: Option<String>,
        /// Run the browser with a visible window
        #[arg(long)]
        headful: bool,
        /// Also save the raw capture next to the results
        #[arg(long)]
        keep_capture: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch {
            url,
            capture,
            name,
            headful,
        } => {
            let mut cap = fetch(&url, headful).await?;
            if let Some(name) = name {
                cap.business_name = Some(name);
            }
            if let Some(parent) = capture.parent() {
                std::fs::create_dir_all(parent)?;
            }
            cap.save(&capture)?;
            println!(
                "Captured {} blocks and {} images to {}",
                cap.blocks.len(),
                cap.images.len(),
                capture.display()
            );
            Ok(())
        }
        Commands::Process {
            capture,
            out_dir,
            name,
        } => {
            let cap = PageCapture::load(&capture)?;
            let doc = process(&cap, name.as_deref());
            output::write_results(&doc, &out_dir)?;
            print_summary(&doc);
            Ok(())
        }
        Commands::Run {
            url,
            out_dir,
            name,
            headful,
            keep_capture,
        } => {
            let mut cap = fetch(&url, headful).await?;
            if let Some(name) = name.clone() {
                cap.business_name = Some(name);
            }
            if keep_capture {
                std::fs::create_dir_all(&out_dir)?;
                cap.save(&out_dir.join("capture.json"))?;
            }
            let doc = process(&cap, name.as_deref());
            output::write_results(&doc, &out_dir)?;
            print_summary(&doc);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn fetch(url: &str, headful: bool) -> Result<PageCapture> {
    let driver = browser::PaginationDriver::launch(!headful).await?;
    let capture = driver.capture_page(url).await;
    driver.close().await;
    capture
}

fn process(capture: &PageCapture, name_override: Option<&str>) -> ResultDocument {
    let business_name = match name_override.or(capture.business_name.as_deref()) {
        Some(name) => name.to_string(),
        None => {
            warn!("No business name available; reply and recommendation heuristics degrade");
            String::new()
        }
    };
    engine::process_capture(capture, &business_name)
}

fn print_summary(doc: &ResultDocument) {
    println!("Business: {}", doc.business_name);
    println!(
        "Saved {} reviews, {} posts, {} images, {} metadata fields.",
        doc.reviews.len(),
        doc.posts.len(),
        doc.images.len(),
        doc.metadata.len()
    );
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
