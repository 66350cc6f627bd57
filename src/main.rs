//! tube-genius: analyze a script, pick a suggested topic, get a full script.
//!
//! Usage:
//!   tube-genius                       # interactive TUI
//!   tube-genius run -i draft.txt      # analysis only
//!   tube-genius run -i draft.txt -t 2 -o script.md
//!   tube-genius keys set --gemini <KEY>

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tube_genius::clients::{ScriptProvider, select_provider};
use tube_genius::config::Config;
use tube_genius::credentials::{CredentialStore, Credentials, is_placeholder, mask_key};
use tube_genius::tui::TuiApp;
use tube_genius::{AppController, AppStep, ProviderKind, TubeGeniusError, views};

#[derive(Parser)]
#[command(name = "tube-genius")]
#[command(about = "AI YouTube script generator (Gemini / OpenAI)", long_about = None)]
struct Cli {
    /// Force a provider when both keys are available
    #[arg(long, global = true)]
    provider: Option<ProviderKind>,

    /// Path to tube_genius.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Tui,
    /// Analyze a script and optionally generate one topic without the UI
    Run {
        /// Input file, or "-" for stdin
        #[arg(short, long)]
        input: String,
        /// 1-based topic number to generate a script for
        #[arg(short, long)]
        topic: Option<usize>,
        /// Write the generated script to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage stored API keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// Store one or both keys
    Set {
        #[arg(long)]
        gemini: Option<String>,
        #[arg(long)]
        openai: Option<String>,
    },
    /// Show which keys are available (masked)
    Show,
    /// Delete the stored key file
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tube_genius::load_env();
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Tui));
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(interactive, &config.runtime.log_level);
    config.log_startup();

    let store = CredentialStore::open_default(config.runtime.credentials_file.as_deref())?;

    match cli.command {
        None | Some(Commands::Tui) => {
            let controller = build_controller(&store, &config, cli.provider)?;
            let save_dir = std::env::current_dir().context("Failed to resolve current directory")?;
            TuiApp::new(controller, save_dir).run().await
        }
        Some(Commands::Run {
            input,
            topic,
            output,
        }) => {
            let controller = build_controller(&store, &config, cli.provider)?;
            run_headless(controller, &input, topic, output.as_deref()).await
        }
        Some(Commands::Keys { action }) => keys(&store, action),
    }
}

fn init_tracing(interactive: bool, level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("tube_genius=info"));

    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return;
    }

    // The TUI owns the screen, so logs go to a file
    let Some(dir) = dirs::data_dir().map(|d| d.join("tube-genius")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("tube-genius.log"))
    {
        Ok(f) => f,
        Err(_) => return,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn build_controller(
    store: &CredentialStore,
    config: &Config,
    preferred: Option<ProviderKind>,
) -> Result<AppController> {
    let creds = store.load()?.with_env_overrides();
    let provider: Option<Arc<dyn ScriptProvider>> =
        match select_provider(&creds, config, preferred) {
            Ok(p) => Some(p),
            Err(TubeGeniusError::MissingCredential { message }) => {
                warn!("No provider available: {}", message);
                None
            }
            Err(e) => return Err(e.into()),
        };
    Ok(AppController::new(provider, config.generation.clone()))
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
    }
}

async fn run_headless(
    mut controller: AppController,
    input: &str,
    topic: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    controller.set_input(read_input(input)?);

    eprintln!("{}", views::busy_label(AppStep::Input));
    if controller.analyze().await != AppStep::Selecting {
        bail!("{}", controller.error().unwrap_or("analysis failed"));
    }
    let Some(analysis) = controller.analysis() else {
        bail!("analysis finished without a result");
    };
    println!("{}\n", views::render_step_indicator_plain(controller.step()));
    println!("{}", views::render_analysis_plain(analysis));

    let Some(number) = topic else {
        return Ok(());
    };
    let count = analysis.topics.len();
    if number == 0 || number > count {
        bail!("topic must be between 1 and {}", count);
    }

    eprintln!("{}", views::busy_label(AppStep::Generating));
    if controller.select_topic(number - 1).await != AppStep::Result {
        bail!("{}", controller.error().unwrap_or("generation failed"));
    }
    println!("{}\n", views::render_step_indicator_plain(controller.step()));
    println!(
        "{}",
        views::render_script_plain(controller.selected_topic(), controller.generated_script())
    );

    if let Some(path) = output {
        let saved = views::save_script(
            Some(path),
            Path::new("."),
            controller.selected_topic(),
            controller.generated_script(),
        )?;
        info!("Script written to {}", saved.display());
    }
    Ok(())
}

fn keys(store: &CredentialStore, action: KeysAction) -> Result<()> {
    match action {
        KeysAction::Set { gemini, openai } => {
            if gemini.is_none() && openai.is_none() {
                bail!("pass --gemini and/or --openai");
            }
            let mut creds = store.load()?;
            for (slot, value) in [
                (&mut creds.gemini_api_key, gemini),
                (&mut creds.openai_api_key, openai),
            ] {
                if let Some(v) = value {
                    if is_placeholder(&v) {
                        bail!("refusing to store an empty or placeholder key");
                    }
                    *slot = Some(v.trim().to_string());
                }
            }
            store.save(&creds)?;
            println!("Saved keys to {}", store.path().display());
        }
        KeysAction::Show => {
            let stored = store.load()?;
            let effective = stored.clone().with_env_overrides();
            println!("Credential file: {}", store.path().display());
            for kind in [ProviderKind::Gemini, ProviderKind::OpenAi] {
                println!("  {:<7} {}", kind, describe_key(&stored, &effective, kind));
            }
            if !effective.has_any() {
                println!("No keys available; run `tube-genius keys set`");
            } else if let Some(kind) = effective.select_provider(None) {
                println!("Default provider: {}", kind);
            }
        }
        KeysAction::Clear => {
            store.clear()?;
            println!("Removed {}", store.path().display());
        }
    }
    Ok(())
}

fn describe_key(stored: &Credentials, effective: &Credentials, kind: ProviderKind) -> String {
    match (stored.key_for(kind), effective.key_for(kind)) {
        (_, None) => "not set".to_string(),
        (Some(s), Some(e)) if s == e => format!("{} (stored)", mask_key(e)),
        (_, Some(e)) => format!("{} (environment)", mask_key(e)),
    }
}
