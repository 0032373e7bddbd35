use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use seesay::app::{run_pipeline_command, run_say_command};
use seesay::cli::{Cli, Commands, ConfigAction};
use seesay::config::Config;
use seesay::diagnostics::check_dependencies;
use seesay::logging;
use seesay::pipeline::{RunEnd, RunSummary};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        None => {
            let config = load_config(&cli)?;
            init_logging(&cli, &config);
            tracing::info!(version = %seesay::version_string(), "seesay starting");

            let summary = run_pipeline_command(config, cli.max_frames).await?;
            if !cli.quiet {
                print_summary(&summary);
            }
        }
        Some(Commands::Check) => {
            let config = load_config(&cli)?;
            if !check_dependencies(&config) {
                std::process::exit(1);
            }
        }
        Some(Commands::Say { text }) => {
            let config = load_config(&cli)?;
            init_logging(&cli, &config);
            run_say_command(&config, text)?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, &cli)?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "seesay",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

fn config_path(custom_path: Option<&Path>) -> Result<PathBuf> {
    match custom_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::default_path().context("could not determine config directory"),
    }
}

/// File (or defaults) → environment → command line, then validate.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(path) = cli.config.as_deref() {
        Config::load(path).with_context(|| format!("failed to load {}", path.display()))?
    } else {
        match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        }
    };

    config = config.with_env_overrides()?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn init_logging(cli: &Cli, config: &Config) {
    logging::init(&logging::level_for(
        cli.verbose,
        cli.quiet,
        &config.logging.level,
    ));
}

fn handle_config_command(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(cli)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", config_path(cli.config.as_deref())?.display());
        }
        ConfigAction::Init { force } => {
            let path = config_path(cli.config.as_deref())?;
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, Config::default().to_toml()?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    let end = match summary.end {
        RunEnd::Quit => summary.end.to_string().yellow().to_string(),
        RunEnd::EndOfStream | RunEnd::FrameLimit => summary.end.to_string().green().to_string(),
    };
    eprintln!();
    eprintln!("{} {}", "Stopped:".bold(), end);
    eprintln!(
        "  frames {} (processed {}), detector failures {}",
        stats.frames, stats.processed_frames, stats.detector_failures
    );
    eprintln!(
        "  announcements {} queued, {} dropped",
        stats.announcements_accepted, stats.announcements_dropped
    );
    if let Some(last) = &stats.last_announcement {
        eprintln!("  last: \"{}\"", last.dimmed());
    }
}
