use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use rayon::prelude::*;
use tracing::{error, Level};

use umatl::config::CONFIG_FILE;
use umatl::search::{search_files, TRANSLATION_FOLDER};
use umatl::text_process::ProcessStats;
use umatl::{
    process_file, ProcessOptions, ProcessingContext, ReplaceMode, StoryId, TextType, ToolConfig,
    TranslationFile,
};

#[derive(Parser)]
#[command(name = "umatl")]
#[command(about = "Process translation files for line breaks, common errors and standardized formatting")]
#[command(version)]
struct Cli {
    /// Single translation file, overrides the search options
    #[arg(long)]
    src: Option<PathBuf>,

    /// Text type to search
    #[arg(short = 't', long = "type", default_value = "story")]
    text_type: TextType,

    /// Set (home only)
    #[arg(short, long)]
    set: Option<String>,

    /// Story group
    #[arg(short, long)]
    group: Option<String>,

    /// Story id
    #[arg(long)]
    id: Option<String>,

    /// Chapter index
    #[arg(long)]
    idx: Option<String>,

    /// Root of the translation tree
    #[arg(long, default_value = TRANSLATION_FOLDER)]
    root: PathBuf,

    /// Characters per line, -1 derives it per file, 0 disables length adjustment
    #[arg(long = "ll", allow_negative_numbers = true)]
    line_length: Option<i64>,

    /// Remove existing newlines for complete reformatting
    #[arg(long = "nl")]
    redo_newlines: bool,

    /// Mode of replacements: all, limit or none
    #[arg(long = "rep")]
    replace_mode: Option<ReplaceMode>,

    /// Normalize letter stutters
    #[arg(long)]
    extrarep: bool,

    /// Target lines; texts within -ll and -tl are left alone
    #[arg(long = "tl")]
    target_lines: Option<usize>,

    /// Regenerate existing size tags
    #[arg(long)]
    force_resize: bool,

    /// Skip texts that already contain line breaks
    #[arg(long)]
    exclusive_newlines: bool,

    /// Replacement table to use instead of the bundled one
    #[arg(long)]
    replacements: Option<PathBuf>,

    /// Read option defaults from the config file
    #[arg(long)]
    read_defaults: bool,

    /// Config file
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Print translation progress instead of processing
    #[arg(long)]
    stats: bool,

    /// Print additional info
    #[arg(short, long)]
    verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let files = collect_files(&cli)?;

    if cli.stats {
        return handle_stats(&files);
    }

    handle_processing(&cli, &files)
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Files named by `--src` or matched by the search options
fn collect_files(cli: &Cli) -> anyhow::Result<Vec<PathBuf>> {
    if let Some(src) = &cli.src {
        if !src.exists() {
            bail!("File not found: {:?}", src);
        }
        return Ok(vec![src.clone()]);
    }
    if cli.group.is_none() && cli.id.is_none() && cli.set.is_none() {
        bail!("At least one of --src, --set, --group or --id is required.");
    }
    let query = StoryId::new(
        cli.text_type,
        cli.set.clone(),
        cli.group.clone(),
        cli.id.clone(),
        cli.idx.clone(),
    );
    Ok(search_files(&cli.root, &query))
}

/// Options from the defaults, the config file and the flags, in that order
fn build_options(cli: &Cli) -> anyhow::Result<ProcessOptions> {
    let mut opts = if cli.read_defaults {
        ToolConfig::load(&cli.config)
            .and_then(|config| config.section("textprocess"))
            .with_context(|| format!("Reading defaults from {:?}", cli.config))?
            .unwrap_or_default()
    } else {
        ProcessOptions::default()
    };

    if let Some(ll) = cli.line_length {
        opts.line_length = ll;
    }
    if let Some(mode) = cli.replace_mode {
        opts.replace_mode = mode;
    }
    if let Some(tl) = cli.target_lines {
        opts.target_lines = tl;
    }
    opts.redo_newlines |= cli.redo_newlines;
    opts.extrarep |= cli.extrarep;
    opts.force_resize |= cli.force_resize;
    opts.exclusive_newlines |= cli.exclusive_newlines;
    Ok(opts)
}

fn build_context(replacements: Option<&Path>) -> anyhow::Result<ProcessingContext> {
    let ctx = match replacements {
        Some(path) => ProcessingContext::with_table_file(path)
            .with_context(|| format!("Loading replacements from {:?}", path))?,
        None => ProcessingContext::with_builtin().context("Loading bundled replacements")?,
    };
    Ok(ctx)
}

fn handle_processing(cli: &Cli, files: &[PathBuf]) -> anyhow::Result<()> {
    let opts = build_options(cli)?;
    let ctx = build_context(cli.replacements.as_deref())?;

    if !cli.quiet {
        println!("Processing {} files...", files.len());
        if opts.line_length < 0 {
            println!("Automatically setting line length based on story type/id");
        }
    }

    let results: Vec<(&PathBuf, umatl::Result<ProcessStats>)> = files
        .par_iter()
        .map_init(
            || ctx.clone(),
            |ctx, path| {
                let result = TranslationFile::load(path)
                    .and_then(|mut file| process_file(ctx, &mut file, &opts));
                (path, result)
            },
        )
        .collect();

    let mut saved = 0;
    let mut failed = 0;
    let mut overflowing = 0;
    for (path, result) in &results {
        match result {
            Ok(stats) => {
                if stats.saved {
                    saved += 1;
                }
                overflowing += stats.overflowing;
                if !cli.quiet {
                    println!(
                        "{}: {} texts, {} changed{}",
                        path.display(),
                        stats.containers,
                        stats.changed,
                        if stats.saved { "" } else { " (unchanged)" }
                    );
                }
            }
            Err(e) => {
                failed += 1;
                error!("Failed to process {}: {}", path.display(), e);
            }
        }
    }

    if !cli.quiet {
        println!(
            "Files processed: {} ({} saved, {} texts over the line target).",
            results.len() - failed,
            saved,
            overflowing
        );
    }
    if failed > 0 {
        bail!("{failed} of {} files failed", results.len());
    }
    Ok(())
}

fn handle_stats(files: &[PathBuf]) -> anyhow::Result<()> {
    let mut total = 0;
    let mut translated = 0;
    for path in files {
        let file = TranslationFile::load_read_only(path)
            .with_context(|| format!("Loading {}", path.display()))?;
        let stats = file.stats();
        total += stats.containers;
        translated += stats.translated;
        println!(
            "{}: {}/{}{}",
            path.display(),
            stats.translated,
            stats.containers,
            if stats.is_complete() { " (done)" } else { "" }
        );
    }
    let pct = if total > 0 {
        translated as f64 * 100.0 / total as f64
    } else {
        100.0
    };
    println!("{} files, {translated}/{total} texts translated ({pct:.1}%)", files.len());
    Ok(())
}
