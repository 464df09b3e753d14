use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use lexvox::cache::AudioLayout;
use lexvox::cli::{Cli, Commands, ConfigAction, log_filter};
use lexvox::config::Config;
use lexvox::lexicon::{RowLayout, parse_file};
use lexvox::output::{format_segmented, format_summary, format_voices};
use lexvox::pipeline::Pipeline;
use lexvox::render::{Renderer, write_json_lines};
use lexvox::segment::{DictionaryRomanizer, Segmenter};
use lexvox::tts::{MockSynthesizer, Synthesizer, select_voices};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    tracing::debug!(version = %lexvox::version_string(), "starting");

    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        tracing::warn!(error = %e, "failed to read .env");
    }

    match cli.command {
        Commands::Synth {
            input,
            voices,
            batch_size,
            audio_dir,
            dry_run,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(size) = batch_size {
                config.audio.batch_size = size;
            }
            if let Some(dir) = audio_dir {
                config.audio.dir = dir;
            }
            let input = input.unwrap_or_else(|| config.input.path.clone());
            let clean = handle_synth(config, &input, &voices, dry_run, cli.quiet).await?;
            if !clean {
                std::process::exit(1);
            }
        }
        Commands::Parse { input, romanizer } => {
            let config = load_config(cli.config.as_deref())?;
            let input = input.unwrap_or_else(|| config.input.path.clone());
            handle_parse(&config, &input, romanizer)?;
        }
        Commands::Segment { text, romanizer } => {
            let config = load_config(cli.config.as_deref())?;
            let segmenter = build_segmenter(romanizer.or(config.romanization.dictionary))?;
            print!("{}", format_segmented(&segmenter.segment(&text)));
        }
        Commands::Voices => {
            let config = load_config(cli.config.as_deref())?;
            let layout = AudioLayout::new(
                &config.audio.dir,
                config.per_profile_dirs(),
                config.audio.format.extension(),
            );
            print!(
                "{}",
                format_voices(&config.voices, &layout, std::io::stdout().is_terminal())
            );
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "lexvox", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` takes precedence over the verbosity flags.
fn init_tracing(quiet: bool, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(quiet, verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/lexvox/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// Run the pipeline. Returns whether the run finished without failures.
async fn handle_synth(
    mut config: Config,
    input: &Path,
    voice_names: &[String],
    dry_run: bool,
    quiet: bool,
) -> Result<bool> {
    config.validate()?;

    let (voices, unknown) = select_voices(&config.voices, voice_names);
    if !unknown.is_empty() {
        let configured: Vec<&str> = config.voices.iter().map(|v| v.name.as_str()).collect();
        bail!(
            "Unknown voice profile(s): {} (configured: {})",
            unknown.join(", "),
            configured.join(", ")
        );
    }

    // Dry runs write into a scratch tree so mock audio never lands in the real cache.
    let scratch = if dry_run {
        Some(tempfile::TempDir::new().context("Failed to create scratch directory")?)
    } else {
        None
    };
    let synthesizer: Arc<dyn Synthesizer> = match &scratch {
        Some(dir) => {
            config.audio.dir = dir.path().to_path_buf();
            Arc::new(MockSynthesizer::new().with_sample_rate(config.audio.sample_rate))
        }
        None => service_synthesizer(&config)?,
    };

    let pipeline = Pipeline::from_config(&config, synthesizer, config.codec(), voices)?;

    let started = Instant::now();
    let summary = pipeline
        .run_file(input)
        .await
        .with_context(|| format!("Failed to synthesize {}", input.display()))?;

    if !quiet {
        print!(
            "{}",
            format_summary(&summary, started.elapsed(), std::io::stdout().is_terminal())
        );
        if scratch.is_some() {
            println!("{}", "Dry run: scratch audio discarded".dimmed());
        }
    }

    Ok(summary.is_clean())
}

#[cfg(feature = "azure")]
fn service_synthesizer(config: &Config) -> Result<Arc<dyn Synthesizer>> {
    use lexvox::tts::azure::{AzureCredentials, AzureSynthesizer};
    use std::time::Duration;

    let credentials = AzureCredentials::from_env()?;
    let mut synthesizer = AzureSynthesizer::new(
        credentials,
        Duration::from_secs(config.synthesis.timeout_secs),
    )?
    .with_output_format(config.output_format());
    if let Some(endpoint) = &config.synthesis.endpoint {
        synthesizer = synthesizer.with_endpoint(endpoint.clone());
    }
    Ok(Arc::new(synthesizer))
}

#[cfg(not(feature = "azure"))]
fn service_synthesizer(_config: &Config) -> Result<Arc<dyn Synthesizer>> {
    bail!("lexvox was built without the `azure` feature; use --dry-run")
}

/// Print render hand-off entries for a table.
fn handle_parse(config: &Config, input: &Path, romanizer: Option<PathBuf>) -> Result<()> {
    let report = parse_file(input, RowLayout::Display, &config.input.header_sentinel)?;
    for rejection in &report.rejected {
        tracing::warn!(
            line = rejection.line_number,
            columns = rejection.columns,
            expected = rejection.expected,
            "skipping malformed row"
        );
    }

    let segmenter = build_segmenter(romanizer.or_else(|| config.romanization.dictionary.clone()))?;
    let layout = AudioLayout::new(
        &config.audio.dir,
        config.per_profile_dirs(),
        config.audio.format.extension(),
    );
    let renderer = Renderer::new(&segmenter, &layout, &config.voices, config.audio.batch_size);
    let entries = renderer.entries(&report.records);

    write_json_lines(&entries, std::io::stdout().lock())?;
    Ok(())
}

fn build_segmenter(dictionary: Option<PathBuf>) -> Result<Segmenter> {
    let romanizer = match dictionary {
        Some(path) => {
            let romanizer = DictionaryRomanizer::from_file(&path)?;
            tracing::debug!(path = %path.display(), entries = romanizer.len(), "loaded dictionary");
            romanizer
        }
        None => {
            tracing::warn!("no romanization dictionary configured, romanizations will be blank");
            DictionaryRomanizer::default()
        }
    };
    Ok(Segmenter::new(Arc::new(romanizer)))
}

/// Handle config subcommands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    let config_path = custom_path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    config_path.display()
                );
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&config_path, Config::default().to_toml()?)
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            println!("{}", format!("Wrote {}", config_path.display()).green());
        }
    }
    Ok(())
}
