//! CLI for EditViz - prompt-driven image editing.

use clap::{Args, Parser, Subcommand, ValueEnum};
use editviz::{
    Config, EditSession, GeminiEditor, GeminiModel, UiState, UploadSource, Uploader,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "editviz")]
#[command(about = "Edit images with a text prompt via the Gemini image API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Model to use (overrides EDITVIZ_MODEL)
    #[arg(short, long, value_enum, global = true)]
    model: Option<ModelArg>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit one image and save the result
    Edit(EditArgs),

    /// Interactive editing session
    Session,

    /// List available models
    Models {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct EditArgs {
    /// Image to edit
    input: PathBuf,

    /// Description of the edit
    #[arg(short, long)]
    prompt: String,

    /// Where to write the edited image
    #[arg(short, long)]
    output: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    NanoBanana,
    NanoBananaPro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::NanoBanana => GeminiModel::NanoBanana,
            ModelArg::NanoBananaPro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Edit(args) => {
            let (session, uploader) = build_session(cli.model)?;
            run_edit(session, &uploader, args).await
        }
        Commands::Session => {
            let (session, uploader) = build_session(cli.model)?;
            run_session(session, &uploader).await
        }
        Commands::Models { json } => list_models(json),
    }
}

/// Reads configuration once and wires the editor into a fresh session.
fn build_session(model: Option<ModelArg>) -> anyhow::Result<(EditSession, Uploader)> {
    Config::dotenv_load();
    let mut config = Config::from_env()?;
    if let Some(model) = model {
        config.model = model.into();
    }
    tracing::debug!(model = %config.model, base_url = %config.base_url, "configuration loaded");

    let editor = Arc::new(GeminiEditor::from_config(&config)?);
    let uploader = Uploader::new().with_max_bytes(config.max_upload_bytes);
    Ok((EditSession::new(editor), uploader))
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("editviz=debug"),
        _ => EnvFilter::new("editviz=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_edit(
    mut session: EditSession,
    uploader: &Uploader,
    args: EditArgs,
) -> anyhow::Result<()> {
    session
        .edit_file(uploader, &args.input, args.prompt)
        .await;

    let state = session.state();
    let Some(image) = state.edited_result() else {
        let message = state.last_error().unwrap_or(editviz::UNKNOWN_ERROR_MESSAGE);
        anyhow::bail!("{message}");
    };

    image.save(&args.output)?;

    if args.json {
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "input": args.input.display().to_string(),
            "output": args.output.display().to_string(),
            "mime_type": image.mime_type(),
            "size_bytes": image.decoded_len(),
            "editor": session.editor_name(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Edited image: {} ({} bytes, {}) via {}",
            args.output.display(),
            image.decoded_len(),
            image.mime_type(),
            session.editor_name()
        );
    }

    Ok(())
}

const SESSION_HELP: &str = "\
Commands:
  open <path>      select an image (file browser)
  drop <path>      drop an image (must be an image type)
  prompt <text>    set the edit description
  generate         send the image and prompt
  save <path>      write the edited image to disk
  status           show the current state
  help             show this help
  quit             leave the session";

async fn run_session(mut session: EditSession, uploader: &Uploader) -> anyhow::Result<()> {
    println!("EditViz session ({}). Type 'help' for commands.", session.editor_name());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => continue,
            "open" | "drop" if rest.is_empty() => println!("usage: {command} <path>"),
            "open" => {
                session.upload(uploader, rest, UploadSource::Browse).await;
            }
            "drop" => {
                session.upload(uploader, rest, UploadSource::Drop).await;
            }
            "prompt" => session.set_prompt(rest),
            "generate" => {
                if session.state().can_generate() {
                    println!("Generating...");
                }
                session.generate().await;
            }
            "save" if rest.is_empty() => println!("usage: save <path>"),
            "save" => match session.state().edited_result() {
                Some(image) => match image.save(rest) {
                    Ok(()) => println!("saved {rest}"),
                    Err(e) => println!("could not save: {}", e.user_message()),
                },
                None => println!("no edited image to save"),
            },
            "status" => {}
            "help" => {
                println!("{SESSION_HELP}");
                continue;
            }
            "quit" | "exit" => break,
            other => {
                println!("unknown command '{other}'; type 'help'");
                continue;
            }
        }

        render(&session.state());
    }

    Ok(())
}

fn render(state: &UiState) {
    println!("  original: {}", describe(state.original_image_url()));
    if state.is_busy() {
        println!("  edited:   (generating)");
    } else {
        println!("  edited:   {}", describe(state.edited_image_url()));
    }
    if state.prompt().is_empty() {
        println!("  prompt:   (none)");
    } else {
        println!("  prompt:   {}", state.prompt());
    }
    if let Some(error) = state.last_error() {
        println!("  error:    {error}");
    }
}

/// Shortens a data URL to something readable in a terminal.
fn describe(url: Option<String>) -> String {
    const PREVIEW: usize = 48;
    match url {
        None => "No image to display".to_string(),
        Some(url) if url.len() <= PREVIEW => url,
        Some(url) => {
            let preview: String = url.chars().take(PREVIEW).collect();
            format!("{preview}... ({} chars)", url.len())
        }
    }
}

fn list_models(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ModelInfo {
        name: &'static str,
        id: &'static str,
        default: bool,
    }

    let models: Vec<ModelInfo> = GeminiModel::ALL
        .into_iter()
        .map(|m| ModelInfo {
            name: m.short_name(),
            id: m.as_str(),
            default: m == GeminiModel::default(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        println!("Available models:\n");
        for m in &models {
            let marker = if m.default { " (default)" } else { "" };
            println!("  {} -> {}{}", m.name, m.id, marker);
        }
        println!("\nAPI key: {}", editviz::config::API_KEY_VARS.join(" / "));
    }

    Ok(())
}
