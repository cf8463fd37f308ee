//! `ai-summarizer` — command-line front end for the file summarizer.
//!
//! ```bash
//! ai-summarizer summarize ./lecture.mp3 --prompt "Transcribe this"
//! ai-summarizer check ./scan.png
//! ai-summarizer formats
//! ```
//!
//! After a summary is printed, the session reads follow-up questions from
//! stdin. `:regenerate` re-runs the original prompt, `:export <path>` saves
//! the current response, `:quit` (or EOF) ends the session.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use ai_summarizer::ai::gemini::GeminiClient;
use ai_summarizer::query_task::{self, QueryTask};
use ai_summarizer::settings::{default_config_path, Settings};
use ai_summarizer::workflow::{export_response, ConversationState};
use ai_summarizer::{connectivity, files, Phase, QueryWorkflow};

#[derive(Parser)]
#[command(
    name = "ai-summarizer",
    version,
    about = "Summarize, transcribe, or ask questions about a local file using a generative-AI service"
)]
struct Cli {
    /// Settings file (TOML). Defaults to `<config dir>/ai-summarizer/settings.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a file, then answer follow-up questions from stdin.
    Summarize {
        file: PathBuf,
        /// How the AI should summarize the content.
        #[arg(long, short)]
        prompt: String,
        /// Write the first response to this path as UTF-8 text.
        #[arg(long)]
        export: Option<PathBuf>,
        /// Skip the advisory internet connectivity check.
        #[arg(long)]
        skip_connectivity_check: bool,
    },
    /// Validate a file without contacting the service.
    Check { file: PathBuf },
    /// List supported formats and size limits.
    Formats,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Formats => {
            println!("{}", files::describe_supported());
            Ok(())
        }
        Commands::Check { file } => {
            let attached = files::validate(&file)?;
            println!("File: {}", attached.path.display());
            println!("Type: {} ({})", attached.content_type, attached.category);
            println!("Size: {} bytes", attached.size);
            Ok(())
        }
        Commands::Summarize {
            file,
            prompt,
            export,
            skip_connectivity_check,
        } => {
            let config_path = match cli.config {
                Some(p) => p,
                None => default_config_path()?,
            };
            let settings = Settings::load(&config_path)?;
            summarize(settings, file, prompt, export, skip_connectivity_check).await
        }
    }
}

async fn summarize(
    settings: Settings,
    file: PathBuf,
    prompt: String,
    export: Option<PathBuf>,
    skip_connectivity_check: bool,
) -> Result<(), Box<dyn Error>> {
    // Fail on a bad file before touching the network.
    let attached = files::validate(&file)?;
    println!("File attached: {}", attached.file_name());

    if !skip_connectivity_check
        && !connectivity::is_online(
            &settings.connectivity_host,
            Duration::from_secs(settings.connectivity_timeout_secs),
        )
        .await
    {
        return Err("No internet connection. Please check your network and try again.".into());
    }

    let backend = GeminiClient::from_settings(&settings)?;
    let workflow = Arc::new(QueryWorkflow::new(Arc::new(backend), settings.persona.clone()));
    log::info!("Using backend {}", workflow.backend_name());

    let task = query_task::spawn_summarize(Arc::clone(&workflow), file, prompt);
    let mut state = watch(task).await??;
    print_response(&state);

    if let Some(path) = export {
        export_response(&state, &path)?;
        println!("Summary exported to {}", path.display());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        println!("\nFollow-up question (:regenerate, :export <path>, :quit):");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match SessionCommand::parse(&line) {
            SessionCommand::Quit => break,
            SessionCommand::Export(path) => export_to(&state, path),
            SessionCommand::Regenerate => {
                let task = query_task::spawn_regenerate(Arc::clone(&workflow), state);
                let outcome = watch(task).await?;
                state = outcome.state;
                match outcome.result {
                    Ok(_) => print_response(&state),
                    Err(e) => eprintln!("{}", e),
                }
            }
            SessionCommand::FollowUp(question) => {
                let task = query_task::spawn_follow_up(Arc::clone(&workflow), state, question);
                let outcome = watch(task).await?;
                state = outcome.state;
                match outcome.result {
                    Ok(_) => {
                        println!("Response updated");
                        print_response(&state);
                    }
                    Err(e) => eprintln!("{}", e),
                }
            }
        }
    }
    Ok(())
}

/// One line of input in the follow-up session.
#[derive(Debug, PartialEq)]
enum SessionCommand<'a> {
    Quit,
    Regenerate,
    /// Export target; empty means the default file name.
    Export(&'a str),
    FollowUp(&'a str),
}

impl<'a> SessionCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        match line.split_once(char::is_whitespace) {
            Some((":export", path)) => Self::Export(path.trim()),
            _ if line == ":export" => Self::Export(""),
            _ if line == ":quit" => Self::Quit,
            _ if line == ":regenerate" => Self::Regenerate,
            _ => Self::FollowUp(line),
        }
    }
}

/// Announce phase changes until the task finishes, then return its outcome.
async fn watch<T>(mut task: QueryTask<T>) -> Result<T, Box<dyn Error>> {
    while let Some(phase) = task.next_phase().await {
        match phase {
            Phase::Uploading => println!("Uploading file..."),
            Phase::Generating => println!("Please wait, AI is processing your content..."),
            Phase::Idle | Phase::Completed | Phase::Failed => {}
        }
    }
    Ok(task.wait().await?)
}

fn print_response(state: &ConversationState) {
    println!("\n{}", state.response_text());
}

fn export_to(state: &ConversationState, path: &str) {
    let path = if path.is_empty() {
        Path::new("summary.txt")
    } else {
        Path::new(path)
    };
    match export_response(state, path) {
        Ok(p) => println!("Summary exported to {}", p.display()),
        Err(e) => eprintln!("Error exporting summary: {}", e),
    }
}
