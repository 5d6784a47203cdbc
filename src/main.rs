use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use stylefix::diff::{GitChangeSource, DEFAULT_BASE_REF};
use stylefix::options::{StyleOptions, DEFAULT_COLUMN_LIMIT, DEFAULT_INDENT_WIDTH};
use stylefix::session::{FileOutcome, FormatSession, NoHunkPolicy};
use stylefix::tracking::{JsonTrackingStore, DEFAULT_TRACKING_FILE};

#[derive(Parser)]
#[command(name = "stylefix")]
#[command(about = "Diff-scoped style corrector for C++ sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Maximum column limit before split rules trigger
    #[arg(short = 'c', long, default_value_t = DEFAULT_COLUMN_LIMIT)]
    column_limit: usize,

    /// Indentation width for continuation lines
    #[arg(short = 'i', long, default_value_t = DEFAULT_INDENT_WIDTH)]
    indent_width: usize,

    /// Baseline git reference to compare the working tree against
    #[arg(long, default_value = DEFAULT_BASE_REF)]
    base_ref: String,

    /// Location of the tracking record
    #[arg(long, default_value = DEFAULT_TRACKING_FILE)]
    tracking_file: PathBuf,

    /// Format whole files when the diff provides no hunk information
    /// (default is to skip them)
    #[arg(long)]
    format_all: bool,

    /// Report what would change without writing any file
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show a unified diff of the changes
    #[arg(short, long)]
    diff: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // Rejects non-positive values before any file processing
    let options = StyleOptions::new(cli.column_limit, cli.indent_width)?;

    let source = GitChangeSource::new(&cli.base_ref);
    let mut store = JsonTrackingStore::new(&cli.tracking_file);

    let policy = if cli.format_all {
        NoHunkPolicy::FormatAll
    } else {
        NoHunkPolicy::Skip
    };

    if cli.dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }

    let summary = FormatSession::new(options, &source, &mut store)
        .no_hunk_policy(policy)
        .dry_run(cli.dry_run)
        .run()?;

    for outcome in &summary.outcomes {
        match outcome {
            FileOutcome::AlreadyTracked { path } => {
                println!("{} has already been formatted.", path.display());
            }
            FileOutcome::SkippedNoHunks { path } => {
                println!(
                    "{} {}: no hunk information, skipped (use --format-all to format anyway)",
                    "⊘".cyan(),
                    path.display()
                );
            }
            FileOutcome::Missing { path } => {
                println!(
                    "{} {}: in the diff but not on disk, skipped",
                    "⊘".yellow(),
                    path.display()
                );
            }
            FileOutcome::Formatted {
                path,
                before,
                after,
            } => {
                println!("{} {}", "✓".green(), path.display());
                if cli.diff && before != after {
                    display_diff(path, before, after);
                }
            }
        }
    }

    println!(
        "Files have been properly formatted, {} have been formatted!",
        summary.formatted_count()
    );

    Ok(())
}

/// Show a unified diff between original and formatted content.
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (formatted)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
