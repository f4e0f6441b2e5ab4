use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use reptrack::RepTrackError;
use reptrack::classifier::ModelBundle;
use reptrack::cli::{Cli, Commands, ConfigAction};
use reptrack::config::Config;
use reptrack::pose::{AngleExtractor, AngleTable};
use reptrack::replay::{self, FrameStream, ReplayMessage};
use reptrack::session::PoseProcessor;
use reptrack::sink::{StdoutSink, tally_line};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

/// RUST_LOG wins over -v/-q when set.
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    tracing::debug!("reptrack {}", reptrack::version_string());
    match cli.command {
        Commands::Replay {
            input,
            models,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            handle_replay(&config, &input, models, json, cli.quiet)
        }
        Commands::Angles { input } => {
            let config = load_config(cli.config.as_deref())?;
            handle_angles(&config, &input)
        }
        Commands::Config { action } => handle_config_command(action, cli.config.as_deref()),
    }
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/reptrack/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        if !path.exists() {
            return Err(RepTrackError::ConfigFileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path()?)?
    };

    // Apply environment variable overrides
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn handle_replay(
    config: &Config,
    input: &Path,
    models: Option<PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let models_path = models
        .or_else(|| config.models.path.clone())
        .context("No classifier models configured: pass --models or set [models] path")?;
    let classifiers = ModelBundle::load(&models_path)
        .and_then(ModelBundle::into_classifier_set)
        .with_context(|| format!("Failed to load models from {}", models_path.display()))?;

    let mut processor = PoseProcessor::from_config(config, classifiers)?;
    let mut sink = StdoutSink::new(json);
    let reader = replay::open_input(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let summary = replay::run(reader, &mut processor, &mut sink)?;

    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else if !quiet {
        let exercise = summary
            .tally
            .exercise
            .as_ref()
            .map(|e| tally_line(e, summary.tally.reps))
            .unwrap_or_else(|| "no exercise detected".to_string());
        eprintln!(
            "{} {} ({} frames, {} skipped, {} malformed)",
            "Done:".green(),
            exercise,
            summary.frames,
            summary.skipped,
            summary.malformed
        );
    }
    Ok(())
}

fn handle_angles(config: &Config, input: &Path) -> Result<()> {
    let extractor = AngleExtractor::new(AngleTable::reference())
        .with_min_confidence(config.pose.min_confidence);
    let reader = replay::open_input(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut stream = FrameStream::spawn(reader, reptrack::defaults::REPLAY_CHANNEL_CAPACITY)?;

    let names: Vec<&str> = extractor.table().names().collect();
    println!("line\t{}", names.join("\t"));
    for message in stream.by_ref() {
        match message {
            ReplayMessage::Frame(frame) => match extractor.extract(&frame.pose) {
                Ok(features) => {
                    let cells: Vec<String> = features.iter().map(|a| format!("{:.4}", a)).collect();
                    println!("{}\t{}", frame.line, cells.join("\t"));
                }
                Err(e) => eprintln!("{}", format!("line {}: {}", frame.line, e).yellow()),
            },
            ReplayMessage::Malformed { line, message } => {
                eprintln!("{}", format!("line {}: {}", line, message).yellow());
            }
        }
    }
    stream.finish()?;
    Ok(())
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let path = match custom_path {
                Some(path) => path.to_path_buf(),
                None => Config::default_path()?,
            };
            println!("{}", path.display());
        }
    }
    Ok(())
}
