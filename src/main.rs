use clap::Parser;

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod diagnostics;
mod event;
mod hierarchy;
mod ingest;
mod printer;
mod render;

pub type Result<T> = anyhow::Result<T>;

const SUNBURST_PAGE: &str = "sunburst.html";

#[derive(Parser, Debug)]
#[command(name = "buildops-viz")]
#[command(about = "Turn a build operation event log into sunburst data", long_about = None)]
struct Cli {
    /// Build operation events, one JSON object per line.
    input: PathBuf,

    /// Directory the data file is written to.
    #[arg(short = 'o', long, default_value = ".")]
    output: PathBuf,

    /// Name of the generated data file.
    #[arg(long, default_value = "data.js")]
    data_file: String,

    /// JS variable the operation tree is assigned to.
    #[arg(long, default_value = "data", value_parser = parse_identifier)]
    variable: String,

    /// Only print this many levels of the operation tree.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    depth: Option<u64>,

    /// Also write a sunburst page next to the data file.
    #[arg(long)]
    html: bool,

    /// Do not print a progress symbol per input line.
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn parse_identifier(s: &str) -> std::result::Result<String, String> {
    let mut chars = s.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    if starts_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        Ok(s.to_string())
    } else {
        Err(format!("'{}' is not a valid JavaScript identifier", s))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let written = if cli.quiet {
        run(&cli, diagnostics::Progress::<io::Stdout>::disabled())?
    } else {
        run(&cli, diagnostics::Progress::new(io::stdout()))?
    };
    for path in written {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

/// Ingest the input file and write the output files. Returns the paths written.
fn run<W: io::Write>(cli: &Cli, mut progress: diagnostics::Progress<W>) -> Result<Vec<PathBuf>> {
    let file = File::open(&cli.input).with_context(|| {
        diagnostics::error_message(format!(
            "could not open input file {}",
            cli.input.display()
        ))
    })?;

    // 1) Rebuild the operation tree.
    let mut hierarchy = hierarchy::Hierarchy::new();
    let summary = ingest::ingest(BufReader::new(file), &mut hierarchy, |status| {
        progress.symbol(status.symbol())
    })?;
    progress.finish()?;

    let skipped = summary.malformed + summary.rejected;
    if skipped > 0 {
        diagnostics::warn(format!(
            "{} of {} lines were skipped",
            skipped, summary.lines
        ));
    }
    if hierarchy.is_empty() {
        diagnostics::warn("no build operations found in input");
    }
    tracing::info!(
        operations = hierarchy.len(),
        roots = hierarchy.roots().len(),
        "operation tree rebuilt"
    );

    // 2) Write the data file.
    fs::create_dir_all(&cli.output).with_context(|| {
        diagnostics::error_message(format!(
            "could not create output directory {}",
            cli.output.display()
        ))
    })?;

    let options = printer::PrintOptions {
        variable: cli.variable.clone(),
        max_depth: cli.depth.map(|d| d as usize),
    };
    let data_path = cli.output.join(&cli.data_file);
    write_data_file(&hierarchy, &options, &data_path)?;
    let mut written = vec![data_path];

    // 3) Optional companion page.
    if cli.html {
        let page_path = cli.output.join(SUNBURST_PAGE);
        let page = render::render_sunburst_page(&cli.data_file, &cli.variable);
        fs::write(&page_path, page).with_context(|| {
            diagnostics::error_message(format!("could not write {}", page_path.display()))
        })?;
        written.push(page_path);
    }

    Ok(written)
}

fn write_data_file(
    hierarchy: &hierarchy::Hierarchy,
    options: &printer::PrintOptions,
    path: &Path,
) -> Result<()> {
    let context = || diagnostics::error_message(format!("could not write {}", path.display()));
    let file = File::create(path).with_context(context)?;
    printer::HierarchyPrinter::new(hierarchy, options, BufWriter::new(file))
        .print()
        .with_context(context)?;
    Ok(())
}
