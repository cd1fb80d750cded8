//! CLI entry point for `spamextract`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser};

use spamextract::config::{self, Config};
use spamextract::deliver::CommandDelivery;
use spamextract::processor::MailProcessor;
use spamextract::watch::{NotifySource, WatchLoop};

/// Extract the original message from spam reports and redeliver it.
#[derive(Parser)]
#[command(name = "spamextract", version)]
struct Cli {
    /// Seconds to sleep before injecting extracted mail
    #[arg(short, long, value_name = "SECS", allow_negative_numbers = true)]
    sleep: Option<i64>,

    /// The mail message file to process
    #[arg(short, long, value_name = "PATH", conflicts_with = "watch")]
    file: Option<PathBuf>,

    /// Watch a directory for changes and process them
    #[arg(short, long, value_name = "DIR")]
    watch: Option<PathBuf>,

    /// Configuration file (default: $SPAMEXTRACT_CONFIG or the user config dir)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_report) = config::load_config(cli.config.as_deref());

    let log_level = match cli.verbose {
        0 => config.general.log_level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    setup_logging(&log_level, &config);
    config_report.log();

    if let Some(secs) = cli.sleep {
        config.delivery.sleep_secs = config::clamp_sleep(secs);
    }

    match (cli.file, cli.watch) {
        (Some(file), _) => cmd_file(&file, &config),
        (None, Some(dir)) => cmd_watch(&dir, &config),
        (None, None) => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let file_target = config.general.log_file.as_deref().and_then(|path| {
        let dir = path.parent().filter(|d| !d.as_os_str().is_empty())?;
        let name = path.file_name()?;
        std::fs::create_dir_all(dir).ok()?;
        Some((dir.to_path_buf(), name.to_os_string()))
    });

    if let Some((dir, name)) = file_target {
        let file_appender = tracing_appender::rolling::never(dir, name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Process a single file and print the extracted message path, if any.
fn cmd_file(path: &Path, config: &Config) -> anyhow::Result<()> {
    if path
        .to_string_lossy()
        .ends_with(config.watch.deleted_marker)
    {
        tracing::info!(path = %path.display(), "Refusing message marked as deleted");
        std::process::exit(1);
    }

    let processor = MailProcessor::new(config.extract_options());
    let extraction = processor
        .process(path)
        .with_context(|| format!("Failed to process {}", path.display()))?;

    if let Some(out) = extraction.path() {
        println!("{}", out.display());
    }
    Ok(())
}

/// Watch a directory until interrupted.
fn cmd_watch(dir: &Path, config: &Config) -> anyhow::Result<()> {
    let mut source = NotifySource::new(dir)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;

    let interrupter = source.interrupter();
    ctrlc::set_handler(move || interrupter.interrupt())
        .context("Failed to install interrupt handler")?;

    let processor = MailProcessor::new(config.extract_options());
    let delivery = CommandDelivery::new(
        config.delivery.command.clone(),
        config.delivery.args.clone(),
    );

    let mut watch = WatchLoop::new(dir, processor, delivery, config.watch_options());
    watch.run(&mut source);
    Ok(())
}
