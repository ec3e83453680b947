use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use waste_report::{FontResolver, FontSource, ReportBuilder, ReportPayload};

mod invocation;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "WASTE_REPORT_LOG";

/// Renders waste management reports from analytics payloads.
///
/// Fonts are looked up in `$WASTE_REPORT_FONTS_DIR`, then `assets/fonts` next to the binary;
/// the builtin Helvetica faces are used when neither holds the report fonts.
#[derive(Parser)]
#[command(author, version, about = "Render waste management reports as PDF")]
struct Cli {
    /// Extra directory searched for the report fonts before the defaults.
    #[arg(long, global = true)]
    fonts_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a payload (bare, `{"data": ...}` or a gateway envelope) to a PDF file.
    Render {
        /// Path to the JSON payload.
        input: PathBuf,
        /// Output path; defaults to the suggested timestamped file name.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Cover image; overrides `$WASTE_REPORT_COVER_IMAGE`.
        #[arg(long)]
        cover: Option<PathBuf>,
    },

    /// Handle an invocation event and print the JSON response.
    Invoke {
        /// Path to the JSON event.
        event: PathBuf,
    },

    /// Show which fonts would be used.
    Fonts,
}

fn main() {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Warn)
        .parse_env(env_logger::Env::default().filter_or(LOG_ENV, "warn,waste_report=info"))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        print_error_sources(&*err);
        std::process::exit(1);
    }
}

fn font_resolver(fonts_dir: Option<PathBuf>) -> FontResolver {
    let defaults = FontResolver::new();
    match fonts_dir {
        Some(dir) => {
            let sources = std::iter::once(FontSource::Directory(dir))
                .chain(defaults.sources().iter().cloned())
                .collect::<Vec<_>>();
            defaults.with_sources(sources)
        }
        None => defaults,
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn run(cli: Cli) -> Result<()> {
    let resolver = font_resolver(cli.fonts_dir);
    match cli.command {
        Commands::Render {
            input,
            output,
            cover,
        } => {
            let mut builder = ReportBuilder::new().with_font_resolver(resolver);
            if let Some(cover) = cover {
                builder = builder.with_cover_image(cover);
            }
            let renderer = builder.build();

            let payload = invocation::extract_payload(read_json(&input)?)?;
            let payload = ReportPayload::from_value(payload).context("invalid report payload")?;
            let report = renderer.render(&payload).context("report rendering failed")?;

            let output = output.unwrap_or_else(|| PathBuf::from(&report.filename));
            report
                .save(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("{} ({} pages)", output.display(), report.page_count);
        }
        Commands::Invoke { event } => {
            let renderer = ReportBuilder::new().with_font_resolver(resolver).build();
            let response = invocation::handle(&renderer, read_json(&event)?);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Fonts => {
            for source in resolver.sources() {
                println!("candidate: {}", source);
            }
            println!("resolved: {}", resolver.resolve().describe());
        }
    }
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
