//! CLI for vexgen - prompt-to-image studio.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vexgen::{
    AspectRatio, ChatAssistant, EnvCredentialSelector, GeminiChatProvider, GeminiModel,
    GeminiProvider, ImageProvider, ImageSize, InlineImage, Phase, RequestBuilder, Role, Studio,
    User,
};

#[derive(Parser)]
#[command(name = "vex")]
#[command(about = "Generate and refine images with Gemini, with a prompt assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a single image from a text prompt
    Generate(GenerateArgs),

    /// Ask the prompt assistant a question
    Chat(ChatArgs),

    /// Interactive studio session with history and editing
    Studio(StudioArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Aspect ratio
    #[arg(long, value_enum, default_value = "1:1")]
    aspect_ratio: AspectRatioArg,

    /// Resolution tier
    #[arg(long, value_enum)]
    size: Option<SizeArg>,

    /// Reference image to edit (path to image file)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Model to use
    #[arg(short, long, value_enum, default_value = "pro")]
    model: ModelArg,
}

#[derive(Args)]
struct ChatArgs {
    /// Question for the assistant
    message: String,
}

#[derive(Args)]
struct StudioArgs {
    /// Model to use
    #[arg(short, long, value_enum, default_value = "pro")]
    model: ModelArg,

    /// Display name for the session
    #[arg(long, default_value = "Vex Explorer")]
    name: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "1:1")]
    Square,
    #[value(name = "3:4")]
    StandardPortrait,
    #[value(name = "4:3")]
    Standard,
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "16:9")]
    Landscape,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::StandardPortrait => AspectRatio::StandardPortrait,
            AspectRatioArg::Standard => AspectRatio::Standard,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
            AspectRatioArg::Landscape => AspectRatio::Landscape,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SizeArg {
    #[value(name = "1K")]
    OneK,
    #[value(name = "2K")]
    TwoK,
    #[value(name = "4K")]
    FourK,
}

impl From<SizeArg> for ImageSize {
    fn from(arg: SizeArg) -> Self {
        match arg {
            SizeArg::OneK => ImageSize::OneK,
            SizeArg::TwoK => ImageSize::TwoK,
            SizeArg::FourK => ImageSize::FourK,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    /// gemini-2.5-flash-image
    Flash,
    /// gemini-3-pro-image-preview
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::NanoBanana,
            ModelArg::Pro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vexgen=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate_image(args, cli.json).await?,
        Commands::Chat(args) => chat_once(args, cli.json).await?,
        Commands::Studio(args) => run_studio(args).await?,
    }

    Ok(())
}

fn read_reference(path: &Path) -> anyhow::Result<InlineImage> {
    let bytes = std::fs::read(path)?;
    Ok(InlineImage::from_bytes(&bytes)?)
}

async fn generate_image(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let reference = args.input.as_deref().map(read_reference).transpose()?;
    let request = RequestBuilder::new(&args.prompt)
        .aspect_ratio(args.aspect_ratio.into())
        .size(args.size.map(Into::into))
        .reference_image(reference)
        .build()?;

    let provider = GeminiProvider::builder().model(args.model.into()).build()?;
    let start = std::time::Instant::now();
    let image = provider.generate(&request).await?;
    image.save(&args.output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "output": args.output.display().to_string(),
            "mime_type": image.mime_type,
            "aspect_ratio": request.aspect_ratio(),
            "size": request.size(),
            "model": provider.model().as_str(),
            "duration_ms": start.elapsed().as_millis() as u64,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated image: {} ({}, {} @ {}) via {}",
            args.output.display(),
            image.mime_type,
            request.aspect_ratio(),
            request.size(),
            provider.name()
        );
    }

    Ok(())
}

async fn chat_once(args: ChatArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = GeminiChatProvider::builder().build()?;
    let mut assistant = ChatAssistant::new(Arc::new(provider));
    assistant.send(&args.message).await;

    let reply = assistant
        .transcript()
        .last()
        .filter(|t| t.role == Role::Assistant)
        .map(|t| t.text.clone())
        .unwrap_or_default();

    if json_output {
        println!("{}", serde_json::to_string_pretty(assistant.transcript())?);
    } else {
        println!("{reply}");
    }
    Ok(())
}

const STUDIO_HELP: &str = "\
Type a prompt and press enter to generate. Commands:
  /ratio <1:1|3:4|4:3|9:16|16:9>   pick aspect ratio
  /size <1K|2K|4K>                 pick resolution
  /ref <path>                      attach a reference image
  /reset-ref                       remove the reference image
  /edit                            use the current result as reference
  /history                         list generated images
  /select <n>                      show history entry n
  /save [path]                     save the current result (default vex-gen.<ext>)
  /dismiss                         clear the error
  /ask <question>                  ask the prompt assistant
  /logout                          end the session (clears history)
  /help, /quit";

async fn run_studio(args: StudioArgs) -> anyhow::Result<()> {
    let images = GeminiProvider::builder().model(args.model.into()).build()?;
    let chat = GeminiChatProvider::builder().build()?;
    let mut studio = Studio::new(Arc::new(images), Arc::new(EnvCredentialSelector::new()));
    let mut assistant = ChatAssistant::new(Arc::new(chat));

    let user = User::new("vex-user", args.name, "hello@vexai.com");
    studio.start(user.clone()).await;
    println!("{STUDIO_HELP}");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print_status(&studio);
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let line = line.trim();
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match cmd {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{STUDIO_HELP}"),
            "/ratio" => match rest.parse() {
                Ok(ratio) => studio.state_mut().set_aspect_ratio(ratio),
                Err(e) => println!("{e}"),
            },
            "/size" => match rest.parse() {
                Ok(size) => studio.state_mut().set_size(size),
                Err(e) => println!("{e}"),
            },
            "/ref" => match read_reference(Path::new(rest)) {
                Ok(image) => studio.state_mut().set_reference_image(image),
                Err(e) => println!("could not load reference: {e}"),
            },
            "/reset-ref" => studio.state_mut().clear_reference_image(),
            "/edit" => {
                if studio.state_mut().use_result_as_reference() {
                    println!("prompt set to \"{}\"", studio.state().prompt());
                } else {
                    println!("nothing to edit yet");
                }
            }
            "/history" => {
                for (i, result) in studio.state().history().iter().enumerate() {
                    println!(
                        "  {i}: [{} {}] {} ({})",
                        result.aspect_ratio,
                        result.size,
                        result.prompt,
                        result.created_at.format("%H:%M:%S")
                    );
                }
            }
            "/select" => {
                let id = rest
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| studio.state().history().get(i))
                    .map(|r| r.id);
                match id {
                    Some(id) => {
                        studio.state_mut().select_from_history(id);
                    }
                    None => println!("no such history entry"),
                }
            }
            "/save" => match studio.state().current_result() {
                Some(result) => {
                    let path = if rest.is_empty() {
                        result.image.default_file_name("vex-gen")
                    } else {
                        rest.to_string()
                    };
                    match result.image.save(&path) {
                        Ok(()) => println!("saved {path}"),
                        Err(e) => println!("{e}"),
                    }
                }
                None => println!("no result to save"),
            },
            "/dismiss" => studio.state_mut().dismiss_error(),
            "/ask" => {
                if assistant.send(rest).await {
                    if let Some(turn) = assistant.transcript().last() {
                        println!("assistant: {}", turn.text);
                    }
                }
            }
            "/logout" => {
                studio.end();
                println!("session ended; starting a fresh one");
                studio.start(user.clone()).await;
            }
            _ if cmd.starts_with('/') => println!("unknown command {cmd}, try /help"),
            _ => {
                studio.state_mut().set_prompt(line);
                println!("generating...");
                studio.submit().await;
            }
        }
    }

    studio.end();
    Ok(())
}

fn print_status(studio: &Studio) {
    let state = studio.state();
    let reference = if state.reference_image().is_some() {
        " +ref"
    } else {
        ""
    };
    match state.phase() {
        Phase::Failed { message } => println!("error: {message}"),
        Phase::Succeeded => {
            if let Some(result) = state.current_result() {
                println!("ready: \"{}\" ({})", result.prompt, result.image.mime_type);
            }
        }
        Phase::Idle | Phase::Requesting => {}
    }
    println!(
        "[{} {}{} | {} in history]",
        state.aspect_ratio(),
        state.size(),
        reference,
        state.history().len()
    );
}
