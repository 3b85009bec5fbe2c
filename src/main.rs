// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use rapidclip::app_config::{self, Config, TtsProvider};
use rapidclip::audio::{AudioCodec, DurationReconciler, FfmpegCodec, WavCodec};
use rapidclip::file_utils::FileManager;
use rapidclip::providers::Transcript;
use rapidclip::{build_subtitles, ClipRequest, Controller};

/// CLI Wrapper for TtsProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTtsProvider {
    Elevenlabs,
    Openai,
}

impl From<CliTtsProvider> for TtsProvider {
    fn from(cli_provider: CliTtsProvider) -> Self {
        match cli_provider {
            CliTtsProvider::Elevenlabs => TtsProvider::ElevenLabs,
            CliTtsProvider::Openai => TtsProvider::OpenAI,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate one video per theme
    Generate(GenerateArgs),

    /// Build an SRT file from a word-timed transcription JSON
    Subtitles {
        /// Verbose transcription JSON (text + words)
        #[arg(value_name = "TRANSCRIPT_JSON")]
        transcript: PathBuf,

        /// Output file; stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Speed narration up to fit a maximum duration
    Reconcile {
        /// Input audio (MP3 or WAV)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Maximum duration in seconds
        #[arg(short, long)]
        max_duration: f64,

        /// Output file, same format as the input
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate shell completions for rapidclip
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Video theme; repeat for several videos
    #[arg(short, long = "theme", required = true)]
    themes: Vec<String>,

    /// Narration language code or name (e.g., 'en', 'pt', 'Spanish')
    #[arg(short = 'L', long)]
    language: Option<String>,

    /// Text-to-speech service to use
    #[arg(long, value_enum)]
    tts_service: Option<CliTtsProvider>,

    /// ElevenLabs voice, required for ElevenLabs unless configured
    #[arg(long)]
    voice_id: Option<String>,

    /// ElevenLabs voice stability (0-1)
    #[arg(long)]
    stability: Option<f32>,

    /// ElevenLabs similarity boost (0-1)
    #[arg(long)]
    similarity_boost: Option<f32>,

    /// Narration ceiling in seconds
    #[arg(long)]
    max_duration: Option<f64>,

    /// OpenAI speech model
    #[arg(long)]
    openai_tts_model: Option<String>,

    /// OpenAI speech voice
    #[arg(long)]
    openai_tts_voice: Option<String>,

    /// Text drawn over the video
    #[arg(long)]
    watermark: Option<String>,

    /// Music library JSON file
    #[arg(long)]
    music_library: Option<PathBuf>,

    /// Generate without background music
    #[arg(long)]
    no_music: bool,

    /// Output directory, one sub-directory per video
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

/// RapidClip - short narrated videos from a theme
///
/// Writes a narration with AI, voices it, times subtitles to the words,
/// generates matching images and renders a vertical video with ffmpeg.
#[derive(Parser, Debug)]
#[command(name = "rapidclip")]
#[command(version)]
#[command(about = "AI-powered short video generator")]
#[command(long_about = "RapidClip turns a theme into a narrated vertical video with subtitles, images and music.

EXAMPLES:
    rapidclip generate -t \"black holes\" -L en --voice-id XYZ    # One video, ElevenLabs voice
    rapidclip generate -t volcanoes -t tides --tts-service openai # Two videos, OpenAI speech
    rapidclip generate -t \"deep sea\" --max-duration 55 --no-music
    rapidclip subtitles transcript.json -o clip.srt              # Offline subtitles
    rapidclip reconcile narration.mp3 -m 58 -o short.mp3         # Fit narration to 58s
    rapidclip completions bash > rapidclip.bash                  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. Empty API keys are read from OPENAI_API_KEY,
    ELEVENLABS_API_KEY and REPLICATE_API_TOKEN.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    common: CommonArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with("rapidclip")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "rapidclip", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.common.config)?;
    if let Some(log_level) = cli.common.log_level.clone() {
        config.log_level = log_level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Generate(args) => run_generate(config, args).await,
        Commands::Subtitles { transcript, output } => run_subtitles(&config, transcript, output),
        Commands::Reconcile { input, max_duration, output } => run_reconcile(&config, input, max_duration, output).await,
        Commands::Completions { .. } => Ok(()),
    }
}

/// Apply the generate flags on top of the file configuration
fn apply_generate_overrides(config: &mut Config, args: &GenerateArgs) {
    if let Some(language) = &args.language {
        config.language = language.clone();
    }
    if let Some(provider) = &args.tts_service {
        config.tts.provider = provider.clone().into();
    }
    if let Some(voice_id) = &args.voice_id {
        config.tts.elevenlabs.voice_id = voice_id.clone();
    }
    if let Some(stability) = args.stability {
        config.tts.elevenlabs.stability = stability;
    }
    if let Some(similarity_boost) = args.similarity_boost {
        config.tts.elevenlabs.similarity_boost = similarity_boost;
    }
    if let Some(max_duration) = args.max_duration {
        config.audio.max_duration = Some(max_duration);
    }
    if let Some(model) = &args.openai_tts_model {
        config.tts.openai.model = model.clone();
    }
    if let Some(voice) = &args.openai_tts_voice {
        config.tts.openai.voice = voice.clone();
    }
    if let Some(library) = &args.music_library {
        config.music.library = library.clone();
    }
    if args.no_music {
        config.music.enabled = false;
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
}

async fn run_generate(mut config: Config, args: GenerateArgs) -> Result<()> {
    apply_generate_overrides(&mut config, &args);

    let controller = Controller::with_config(config.clone())
        .context("Configuration validation failed")?;

    let requests: Vec<ClipRequest> = args
        .themes
        .iter()
        .map(|theme| ClipRequest {
            watermark: args.watermark.clone(),
            ..ClipRequest::from_config(theme.trim(), &config)
        })
        .collect();

    let results = controller.run_batch(requests).await;
    let total = results.len();
    let mut failed = 0;
    for (request, result) in results {
        match result {
            Ok(output) => info!("Success: '{}' -> {}", request.theme, output.video.display()),
            Err(e) => {
                failed += 1;
                error!("Failed: '{}': {}", request.theme, e);
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} video(s) failed", failed, total));
    }
    Ok(())
}

fn run_subtitles(config: &Config, transcript_path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let content = FileManager::read_to_string(&transcript_path)?;
    let transcript: Transcript = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse transcription: {}", transcript_path.display()))?;

    let (cues, srt, alignment) = build_subtitles(&transcript.words, &transcript.text, &config.subtitles)
        .context("Invalid subtitle limits")?;
    for degraded in &alignment.degraded {
        warn!("{}", degraded);
    }

    match output {
        Some(path) => {
            FileManager::write_to_file(&path, &srt)?;
            info!("Success: {} cue(s) -> {}", cues.len(), path.display());
        }
        None => print!("{}", srt),
    }
    Ok(())
}

async fn run_reconcile(config: &Config, input: PathBuf, max_duration: f64, output: PathBuf) -> Result<()> {
    let is_wav = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    let codec: Arc<dyn AudioCodec> = if is_wav {
        Arc::new(WavCodec)
    } else {
        Arc::new(FfmpegCodec::new(&config.video.ffmpeg_path))
    };

    let audio = FileManager::read_bytes(&input)?;
    let reconciler = DurationReconciler::new(codec, config.audio.reconcile.clone());
    let (bytes, speed_factor) = tokio::task::spawn_blocking(move || {
        reconciler
            .reconcile(&audio, Some(max_duration))
            .map(|reconciled| {
                let speed_factor = reconciled.speed_factor;
                (reconciled.into_bytes(), speed_factor)
            })
    })
    .await
    .context("Reconciliation task failed")??;

    FileManager::write_bytes(&output, &bytes)?;
    match speed_factor {
        Some(speed) => info!("Success: sped up {:.3}x -> {}", speed, output.display()),
        None => info!("Success: already within {}s -> {}", max_duration, output.display()),
    }
    Ok(())
}
