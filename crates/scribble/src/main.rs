//! scribble - Draw the prompt, let the judge score it, spend points on colors

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scribble_core::{CoreError, GameConfig, GameSession, JudgeClient, PromptSource};
use scribble_web::api::DEFAULT_PROMPTS;
use scribble_web::ServerConfig;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "scribble",
    version,
    about = "Draw the prompt, let the judge score it, spend points on colors",
    long_about = "A terminal drawing game. Draw the prompt with the mouse, submit it to a\n\
                  vision-model judge that rates it 1-100, and spend the points on new colors.\n\
                  \n\
                  Examples:\n\
                    scribble                         # Play in the terminal (default)\n\
                    scribble serve --port 3333       # Run the judge server only\n\
                    scribble both                    # Judge server + local game\n\
                    scribble judge cat.png -p Cat    # Score an existing PNG\n\
                    scribble prompts --pick          # Print one random prompt\n\
                    scribble shop                    # Show the color catalog\n\
                  \n\
                  Environment Variables:\n\
                    OPENAI_API_KEY                   # Upstream credential (server side)\n\
                    SCRIBBLE_CONFIG                  # Config file path\n\
                    SCRIBBLE_JUDGE_URL               # Judge endpoint used by the game\n\
                    SCRIBBLE_PROMPTS                 # Prompt list URL or file\n\
                    RUST_LOG                         # Log filter (default scribble=info)"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Path to config.toml (default: <config_dir>/scribble/config.toml)
    #[arg(long, env = "SCRIBBLE_CONFIG")]
    config: Option<PathBuf>,

    /// Judge endpoint used when submitting drawings
    #[arg(long, env = "SCRIBBLE_JUDGE_URL")]
    judge_url: Option<String>,

    /// Prompt list source: http(s) URL or local file
    #[arg(long, env = "SCRIBBLE_PROMPTS")]
    prompts: Option<String>,

    /// Disable ANSI colors in tables
    #[arg(long)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Play in the terminal (default)
    Play,
    /// Run the judge server
    Serve {
        /// Port for the judge server
        #[arg(long, default_value_t = scribble_web::DEFAULT_PORT)]
        port: u16,
        /// Serve this file as /prompts.txt instead of the bundled list
        #[arg(long)]
        prompts_file: Option<PathBuf>,
    },
    /// Run the judge server and play against it
    Both {
        /// Port for the judge server
        #[arg(long, default_value_t = scribble_web::DEFAULT_PORT)]
        port: u16,
    },
    /// Score a PNG file against a prompt and exit
    Judge {
        /// PNG image to score
        image: PathBuf,
        /// What the image is supposed to show
        #[arg(long, short = 'p')]
        prompt: String,
    },
    /// Print the prompt list and exit
    Prompts {
        /// Print a single random prompt instead
        #[arg(long)]
        pick: bool,
    },
    /// Print the color catalog and exit
    Shop,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(hint) = suggestion_for(&e) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Hint from the first `CoreError` in the cause chain
fn suggestion_for(err: &anyhow::Error) -> Option<String> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CoreError>())
        .and_then(CoreError::suggestion)
}

async fn run(cli: Cli) -> Result<()> {
    let mode = cli.mode.unwrap_or(Mode::Play);

    let interactive = matches!(mode, Mode::Play | Mode::Both { .. });
    init_logging(interactive)?;

    let mut config = GameConfig::load(cli.config.as_deref()).with_context(|| {
        cli.config
            .as_ref()
            .map(|p| format!("Failed to load config from {}", p.display()))
            .unwrap_or_else(|| "Failed to load config".to_string())
    })?;
    if let Some(url) = cli.judge_url.clone() {
        config.judge_endpoint = url;
    }
    if let Some(source) = cli.prompts.clone() {
        config.prompts_source = source;
    }

    match mode {
        Mode::Play => run_play(config).await,
        Mode::Serve { port, prompts_file } => run_serve(port, prompts_file).await,
        Mode::Both { port } => {
            run_both(config, port, cli.judge_url.is_some(), cli.prompts.is_some()).await
        }
        Mode::Judge { image, prompt } => run_judge(&config, &image, &prompt).await,
        Mode::Prompts { pick } => run_prompts(&config, pick).await,
        Mode::Shop => {
            println!("{}", cli::format_shop_table(cli.no_color));
            Ok(())
        }
    }
}

/// Logs go to a file while the alternate screen is up, stderr otherwise
fn init_logging(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scribble=info"));

    if !to_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    let log_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("scribble");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("scribble.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn judge_client(config: &GameConfig) -> Result<JudgeClient> {
    JudgeClient::new(config.judge_endpoint.clone(), config.request_timeout())
        .context("Failed to create judge client")
}

async fn run_play(config: GameConfig) -> Result<()> {
    let mut prompts = PromptSource::new();
    let loaded = prompts.load(&config.prompts_source).await;
    if loaded == 0 {
        warn!(source = %config.prompts_source, "Playing with the default prompt only");
    }

    let gateway = judge_client(&config)?;
    let session = GameSession::new(&config, prompts);
    info!(endpoint = %gateway.endpoint(), prompts = loaded, "Starting game");

    scribble_tui::run(session, gateway, config.export_dir.clone()).await
}

async fn run_serve(port: u16, prompts_file: Option<PathBuf>) -> Result<()> {
    let config = ServerConfig::from_env()
        .with_port(port)
        .with_prompts_path(prompts_file);
    scribble_web::serve(config).await
}

async fn run_both(
    mut config: GameConfig,
    port: u16,
    judge_url_overridden: bool,
    prompts_overridden: bool,
) -> Result<()> {
    if !judge_url_overridden {
        config.judge_endpoint = format!("http://127.0.0.1:{}/api/ai", port);
    }

    let server = ServerConfig::from_env().with_port(port);
    let web_handle = tokio::spawn(async move {
        if let Err(e) = scribble_web::serve(server).await {
            tracing::error!(error = %e, "Judge server stopped");
        }
    });

    // The local server would only hand back the bundled list
    let mut prompts = PromptSource::new();
    if prompts_overridden {
        prompts.load(&config.prompts_source).await;
    } else {
        prompts.load_text("bundled", DEFAULT_PROMPTS);
    }

    let gateway = judge_client(&config)?;
    let session = GameSession::new(&config, prompts);
    let tui_result = scribble_tui::run(session, gateway, config.export_dir.clone()).await;

    web_handle.abort();

    tui_result
}

async fn run_judge(config: &GameConfig, image: &Path, prompt: &str) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::Duration;

    let gateway = judge_client(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .context("Invalid spinner template")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(format!("Judging {} as \"{}\"...", image.display(), prompt));

    let result = cli::judge_file(&gateway, image, prompt).await;
    spinner.finish_and_clear();

    let response = result?;
    println!("{}", cli::format_judgement(prompt, &response));
    Ok(())
}

async fn run_prompts(config: &GameConfig, pick: bool) -> Result<()> {
    let mut prompts = PromptSource::new();
    if prompts.load(&config.prompts_source).await == 0 {
        prompts.load_text("bundled", DEFAULT_PROMPTS);
    }

    if pick {
        let prompt = prompts
            .next()
            .unwrap_or_else(|| config.default_prompt.clone());
        println!("{}", prompt);
    } else {
        println!("{}", cli::format_prompt_list(prompts.prompts()));
    }
    Ok(())
}
