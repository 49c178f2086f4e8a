//! CLI for Hearth.
//!
//! Lifecycle: build registry -> start text I/O worker -> run command ->
//! `shutdown_all` exactly once, whatever the command's outcome.

use clap::{Parser, Subcommand};
use hearth_core::{HearthError, Locale, OwnerId};
use hearth_provider::DirectorySource;
use hearth_runtime::{ResourceCache, ShutdownRegistry, TextIo};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "hearth", version, about = "Localized text bundles and queued text-file I/O")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve keys from an owner's resource bundle.
    Text {
        /// Owner identity, e.g. com.acme.ui.MainWindow.
        owner: String,

        /// Keys to resolve. Missing keys are echoed back.
        #[arg(required = true)]
        keys: Vec<String>,

        #[arg(short, long, env = "HEARTH_BUNDLE_DIR", default_value = "resources/bundles")]
        bundle_dir: PathBuf,

        /// Requested locale. Falls back to $LANG, then `en`.
        #[arg(short, long, env = "HEARTH_LOCALE")]
        locale: Option<String>,

        /// Locale tried when nothing matches the requested one.
        #[arg(long, env = "HEARTH_DEFAULT_LOCALE", default_value = "en")]
        default_locale: String,

        /// Append a trailing space to every value.
        #[arg(long, default_value_t = false)]
        spaced: bool,

        /// Print the resolved bundle as JSON instead.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the lines of a text file.
    Read { path: PathBuf },

    /// Replace a text file with the given lines.
    Write {
        path: PathBuf,
        lines: Vec<String>,
    },

    /// Copy a text file line by line through the I/O queue.
    Copy { src: PathBuf, dst: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let registry = Arc::new(ShutdownRegistry::new());
    let io = TextIo::spawn(&registry)?;

    let outcome = run(cli.command, &io).await;

    // Joins the worker thread, so keep it off the async executor.
    let report = tokio::task::spawn_blocking(move || registry.shutdown_all()).await?;
    for (name, error) in &report.failed {
        tracing::error!(participant = %name, error = %error, "unclean shutdown");
    }

    outcome
}

async fn run(command: Commands, io: &TextIo) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Text {
            owner,
            keys,
            bundle_dir,
            locale,
            default_locale,
            spaced,
            json,
        } => {
            let requested = resolve_locale(locale)?;
            let fallback: Locale = default_locale.parse()?;
            let source = DirectorySource::new(bundle_dir, fallback);
            tracing::info!(
                owner = %owner,
                locale = %requested,
                fallback = %source.default_locale(),
                dir = %source.base_dir().display(),
                "resolving text"
            );

            let cache = ResourceCache::new(Arc::new(source), requested);
            let handle = cache.get_default(&OwnerId::from(owner));

            if json {
                println!("{}", serde_json::to_string_pretty(handle.as_ref())?);
            } else {
                for key in &keys {
                    if spaced {
                        println!("{}", handle.text_spaced(key));
                    } else {
                        println!("{}", handle.text(key));
                    }
                }
            }
        }

        Commands::Read { path } => {
            for line in io.submit_read(&path).await? {
                println!("{line}");
            }
        }

        Commands::Write { path, lines } => {
            let count = lines.len();
            io.submit_write(lines, &path).await?;
            tracing::info!(path = %path.display(), lines = count, "wrote file");
        }

        Commands::Copy { src, dst } => {
            let lines = io.submit_read(&src).await?;
            let count = lines.len();
            io.submit_write(lines, &dst).await?;
            tracing::info!(
                src = %src.display(),
                dst = %dst.display(),
                lines = count,
                "copied file"
            );
        }
    }

    Ok(())
}

/// Explicit flag/env first, then the host's `LANG`, then `en`.
fn resolve_locale(explicit: Option<String>) -> Result<Locale, HearthError> {
    if let Some(tag) = explicit {
        return tag.parse();
    }
    let from_env = std::env::var("LANG")
        .ok()
        .and_then(|tag| tag.parse::<Locale>().ok())
        .filter(|locale| !locale.is_root());
    Ok(from_env.unwrap_or_else(|| Locale::new("en", None, None)))
}
