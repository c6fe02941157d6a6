// ABOUTME: Main entry point for the clipdeck program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use clap::{Args, Parser, Subcommand};
use clipdeck::export::{ExportOptions, FramePolicy, SubsectionMode};
use clipdeck::media::{create_backend, BackendChoice, MediaBackend};
use clipdeck::navigation::{Command, Navigator, NavigatorOptions};
use clipdeck::player::{run_player, ClockSurface, Event};
use clipdeck::{
    convert_html, convert_pdf, convert_pptx, list_presentation_configs, HtmlConfig, PdfConfig,
    PptxConfig, PresentationConfig, ResourceFile,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Present rendered scenes as a navigable deck
    Present(PresentArgs),

    /// Convert rendered scenes into a standalone HTML deck
    ConvertHtml(ConvertHtmlArgs),

    /// Convert rendered scenes into a PDF of static frames
    ConvertPdf(ConvertPdfArgs),

    /// Convert rendered scenes into a PPTX with embedded videos
    ConvertPptx(ConvertPptxArgs),

    /// List valid presentation config files in a folder
    List(ListArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Presentation config files, in presentation order
    configs: Vec<PathBuf>,

    /// Discover presentation configs in this folder instead
    #[arg(long, conflicts_with = "configs")]
    folder: Option<PathBuf>,
}

impl InputArgs {
    fn load(&self) -> clipdeck::Result<Vec<PresentationConfig>> {
        let paths = match &self.folder {
            Some(folder) => list_presentation_configs(folder)?,
            None => self.configs.clone(),
        };
        if paths.is_empty() {
            return Err(clipdeck::DeckError::ValidationError(
                "No presentation config given; pass config files or --folder".to_string(),
            ));
        }
        paths
            .iter()
            .map(|path| PresentationConfig::from_file(path))
            .collect()
    }
}

#[derive(Args)]
struct BackendArgs {
    /// Media backend: 'ffmpeg' or 'null'
    #[arg(long, default_value = "ffmpeg")]
    backend: String,

    /// Path to the ffmpeg binary (the FFMPEG_PATH variable is honored too)
    #[arg(long)]
    ffmpeg_path: Option<PathBuf>,
}

impl BackendArgs {
    fn create(&self) -> clipdeck::Result<Arc<dyn MediaBackend + Send + Sync>> {
        let choice = BackendChoice::from_str(&self.backend)?;
        Ok(create_backend(choice, self.ffmpeg_path.clone()))
    }
}

#[derive(Args)]
struct ExportArgs {
    /// Which frame represents a slide statically: 'first' or 'last'
    #[arg(long, default_value = "last")]
    frame: String,

    /// Subsection handling: 'none', 'final' or 'all'
    #[arg(long, default_value = "none")]
    subsections: String,
}

impl ExportArgs {
    fn options(&self) -> clipdeck::Result<ExportOptions> {
        Ok(ExportOptions {
            frame_policy: FramePolicy::from_str(&self.frame)?,
            subsections: SubsectionMode::from_str(&self.subsections)?,
        })
    }
}

#[derive(Args)]
struct PresentArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    backend: BackendArgs,

    /// Start with the first clip loaded but paused
    #[arg(long)]
    start_paused: bool,

    /// Never play reversed clips; PREVIOUS jumps to the slide start instead
    #[arg(long)]
    disable_reversing: bool,

    /// Keep running when NEXT is pressed at the last slide
    #[arg(long)]
    no_exit_after_last: bool,
}

#[derive(Args)]
struct ConvertHtmlArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Path to the output HTML file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    export: ExportArgs,

    /// Title of the generated document
    #[arg(long, default_value = "Presentation")]
    title: String,

    /// CSS files to include (local paths or URLs)
    #[arg(long, value_delimiter = ',')]
    css: Option<Vec<String>>,

    /// JavaScript files to include (local paths or URLs)
    #[arg(long, value_delimiter = ',')]
    js: Option<Vec<String>>,

    /// Mode for CSS/JS: 'embed' to embed content or 'link' to reference
    #[arg(long, default_value = "embed")]
    mode: String,
}

#[derive(Args)]
struct ConvertPdfArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Path to the output PDF file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    export: ExportArgs,

    #[command(flatten)]
    backend: BackendArgs,

    /// Title of the generated document
    #[arg(long, default_value = "Presentation")]
    title: String,

    /// JPEG quality of the embedded pages (1-100)
    #[arg(long, default_value_t = 90)]
    quality: u8,
}

#[derive(Args)]
struct ConvertPptxArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Path to the output PPTX file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    export: ExportArgs,

    #[command(flatten)]
    backend: BackendArgs,

    /// Title of the generated presentation
    #[arg(long, default_value = "Presentation")]
    title: String,

    /// Slide aspect ratio: '16:9' or '4:3'
    #[arg(long, default_value = "16:9")]
    aspect_ratio: String,
}

#[derive(Args)]
struct ListArgs {
    /// Folder to scan for presentation config files
    folder: PathBuf,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "" | "n" | "next" => Some(Command::Next),
        "p" | "prev" | "previous" => Some(Command::Previous),
        "r" | "replay" => Some(Command::Replay),
        "v" | "reverse" => Some(Command::ReverseToggle),
        " " | "space" | "pause" => Some(Command::PausePlay),
        "q" | "quit" | "exit" => Some(Command::Quit),
        other => {
            eprintln!("Unknown command '{}' (n / p / r / v / space / q)", other);
            None
        }
    }
}

fn present(args: &PresentArgs) -> clipdeck::Result<()> {
    let configs = args.input.load()?;
    let backend = args.backend.create()?;

    let navigator = Navigator::new(
        configs,
        NavigatorOptions {
            exit_on_last: !args.no_exit_after_last,
            reversing_enabled: !args.disable_reversing,
            start_paused: args.start_paused,
        },
    )?;

    let (events, receiver) = std::sync::mpsc::channel();
    let surface = ClockSurface::new(events.clone(), backend);

    // Input device loop: stdin lines become symbolic commands on the same
    // channel the playback worker reports into.
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if let Some(command) = parse_command(&line) {
                let quit = command == Command::Quit;
                if events.send(Event::Command(command)).is_err() || quit {
                    break;
                }
            }
        }
    });

    run_player(navigator, surface, receiver)
}

fn convert_html_command(args: &ConvertHtmlArgs) -> clipdeck::Result<()> {
    let configs = args.input.load()?;
    let options = args.export.options()?;

    let css_files: Vec<ResourceFile> = args
        .css
        .as_ref()
        .map(|files| files.iter().map(|path| ResourceFile::new(path)).collect())
        .unwrap_or_default();
    let js_files: Vec<ResourceFile> = args
        .js
        .as_ref()
        .map(|files| files.iter().map(|path| ResourceFile::new(path)).collect())
        .unwrap_or_default();

    let html_config = HtmlConfig {
        title: args.title.clone(),
        css_files,
        js_files,
        embed_resources: args.mode != "link",
    };

    convert_html(&configs, &args.output, &options, &html_config)?;
    println!("HTML deck generated successfully: {:?}", args.output);
    Ok(())
}

fn convert_pdf_command(args: &ConvertPdfArgs) -> clipdeck::Result<()> {
    let configs = args.input.load()?;
    let options = args.export.options()?;
    let backend = args.backend.create()?;

    let pdf_config = PdfConfig {
        title: args.title.clone(),
        quality: args.quality,
    };

    convert_pdf(&configs, &args.output, &options, &pdf_config, &*backend)?;
    println!("PDF generated successfully: {:?}", args.output);
    Ok(())
}

fn convert_pptx_command(args: &ConvertPptxArgs) -> clipdeck::Result<()> {
    let configs = args.input.load()?;
    let options = args.export.options()?;
    let backend = args.backend.create()?;

    let pptx_config = PptxConfig {
        title: args.title.clone(),
        aspect_ratio: args.aspect_ratio.clone(),
    };

    convert_pptx(&configs, &args.output, &options, &pptx_config, &*backend)?;
    println!("PPTX generated successfully: {:?}", args.output);
    Ok(())
}

fn list_command(args: &ListArgs) -> clipdeck::Result<()> {
    let paths = list_presentation_configs(&args.folder)?;
    if paths.is_empty() {
        println!("No valid presentation config found in {:?}", args.folder);
    }
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Present(args) => present(args),
        Commands::ConvertHtml(args) => convert_html_command(args),
        Commands::ConvertPdf(args) => convert_pdf_command(args),
        Commands::ConvertPptx(args) => convert_pptx_command(args),
        Commands::List(args) => list_command(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
