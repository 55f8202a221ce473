//! Codepane - load a source file into an editor pane and inspect its
//! highlighting, or normalize and save it.
//!
//! # Usage
//!
//! ```bash
//! codepane Main.java
//! codepane --json Main.java
//! codepane --normalize --yes Main.java
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use codepane::config::{
    ConfigFlags, clear_config_flags, default_sandbox_dir, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use codepane::editor::{EditorPane, FsStorage, SaveOutcome};
use codepane::highlight::StyleSpans;
use codepane::host::TerminalHost;

/// Inspect and normalize source files with the codepane editor core
#[derive(Parser, Debug)]
#[command(name = "codepane", version, about, long_about = None)]
struct Cli {
    /// Source file to load
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print spans as JSON
    #[arg(long)]
    json: bool,

    /// Rewrite the file with tabs expanded and surrounding whitespace trimmed
    #[arg(long)]
    normalize: bool,

    /// Answer yes to the save prompt
    #[arg(short, long)]
    yes: bool,

    /// Directory offered when saving a new document
    #[arg(long, value_name = "DIR")]
    sandbox_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Save current command-line flags as defaults in the global config
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn print_spans(out: &mut impl Write, text: &str, spans: &StyleSpans) -> io::Result<()> {
    for span in spans.visible() {
        let category = span.category.map_or("-", |c| c.as_str());
        writeln!(
            out,
            "{:>6} {:>5} {:<9} {:?}",
            span.start,
            span.len,
            category,
            &text[span.range()]
        )?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let level = if effective.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let host = TerminalHost::new(io::stdin().lock(), io::stdout()).with_assume_yes(cli.yes);
    let mut pane = EditorPane::new(FsStorage, host).with_sandbox_dir(
        effective
            .sandbox_dir
            .clone()
            .unwrap_or_else(default_sandbox_dir),
    );

    if let Err(err) = pane.load(&cli.file) {
        tracing::warn!("{err}; starting a new document");
    }

    if cli.normalize {
        let source = pane.source();
        pane.on_text_changed(&source);
        match pane.prompt_save() {
            Ok(SaveOutcome::Declined) => eprintln!("No destination chosen, nothing saved"),
            Ok(_) => {}
            Err(err) => return Err(err).context("Normalize failed"),
        }
        return Ok(());
    }

    let text = pane.text();
    let mut out = io::stdout().lock();
    if effective.json {
        serde_json::to_writer_pretty(&mut out, pane.spans()).context("Failed to write spans")?;
        writeln!(out)?;
    } else {
        writeln!(out, "{} ({} lines)", pane.display_name(), pane.line_count())?;
        print_spans(&mut out, &text, pane.spans())?;
    }
    Ok(())
}
