use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::audio::{AudioCodec, AudioTrack, BackgroundMusicMixer, DurationReconciler, FfmpegCodec};
use crate::errors::AppError;
use crate::file_utils::{ArtifactNames, ArtifactStore, FileManager, FileStore};
use crate::language_utils;
use crate::music_library::{MusicChoice, MusicLibrary};
use crate::prompts;
use crate::providers::{Collaborators, GenerationOptions};
use crate::subtitles::{self, Cue};
use crate::timeline::{self, FfmpegRenderer, TimelineAssembler, VideoRenderer};

// @module: Request orchestration for clip generation

/// Pipeline stages, for progress reporting
const STAGES: u64 = 8;

/// Request-scoped identity carried through every stage
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: String,
    started: Instant,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into(), started: Instant::now() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.id)
    }
}

// @struct: One clip to generate
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    // @field: What the narration is about
    pub theme: String,

    // @field: Language code or English name
    pub language: String,

    // @field: Narration ceiling in seconds
    pub max_duration: Option<f64>,

    // @field: Text drawn over the video
    pub watermark: Option<String>,

    // @field: Add background music when a library is available
    pub music: bool,
}

impl ClipRequest {
    pub fn new(theme: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            language: language.into(),
            max_duration: None,
            watermark: None,
            music: true,
        }
    }

    /// Request with the defaults of the configuration
    pub fn from_config(theme: impl Into<String>, config: &Config) -> Self {
        Self {
            max_duration: config.audio.max_duration,
            music: config.music.enabled,
            ..Self::new(theme, config.language.clone())
        }
    }
}

/// Artifacts and measurements of a finished request
#[derive(Debug, Clone, PartialEq)]
pub struct ClipOutput {
    pub request_id: String,
    pub directory: PathBuf,
    pub script: PathBuf,
    pub narration: PathBuf,
    pub subtitles: PathBuf,
    pub images: Vec<PathBuf>,
    pub image_prompts: Vec<String>,
    /// Song file mixed under the narration
    pub music: Option<PathBuf>,
    pub video: PathBuf,
    pub cues: Vec<Cue>,
    /// Narration length after reconciliation
    pub narration_duration: f64,
    pub video_duration: f64,
    /// Set when the narration was sped up
    pub speed_factor: Option<f64>,
}

/// Main application controller for clip generation
pub struct Controller {
    // @field: App configuration
    config: Config,
    collaborators: Collaborators,
    codec: Arc<dyn AudioCodec>,
    renderer: Arc<dyn VideoRenderer>,
    music: Option<Arc<MusicLibrary>>,
    progress: MultiProgress,
}

impl Controller {
    // @method: Create a controller with HTTP collaborators and ffmpeg backends
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let collaborators = Collaborators::from_config(&config)
            .context("Failed to create collaborators")?;

        let ffmpeg = config.video.ffmpeg_path.clone();
        let music = if config.music.enabled {
            Self::load_music(&config.music.library)
        } else {
            None
        };

        Ok(Self::with_parts(
            config,
            collaborators,
            Arc::new(FfmpegCodec::new(&ffmpeg)),
            Arc::new(FfmpegRenderer::new(&ffmpeg)),
            music,
        ))
    }

    /// Create a controller from explicit parts
    pub fn with_parts(
        config: Config,
        collaborators: Collaborators,
        codec: Arc<dyn AudioCodec>,
        renderer: Arc<dyn VideoRenderer>,
        music: Option<MusicLibrary>,
    ) -> Self {
        Self {
            config,
            collaborators,
            codec,
            renderer,
            music: music.map(Arc::new),
            progress: MultiProgress::new(),
        }
    }

    /// Draw progress bars on `progress` instead of stderr
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A missing or broken library disables music instead of failing
    fn load_music(path: &Path) -> Option<MusicLibrary> {
        if !FileManager::file_exists(path) {
            warn!("Music library {} not found, clips will have no background music", path.display());
            return None;
        }
        match MusicLibrary::load(path) {
            Ok(library) => Some(library),
            Err(e) => {
                warn!("Ignoring music library: {:#}", e);
                None
            }
        }
    }

    fn stage_bar(&self, ctx: &RequestContext, theme: &str) -> ProgressBar {
        let progress_bar = self.progress.add(ProgressBar::new(STAGES));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} stages {prefix} {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_prefix(format!("{} {}", ctx.id().chars().take(8).collect::<String>(), theme));
        progress_bar
    }

    /// Run the whole pipeline for one request
    pub async fn run(&self, request: ClipRequest) -> Result<ClipOutput, AppError> {
        let ctx = RequestContext::new();
        let progress_bar = self.stage_bar(&ctx, &request.theme);

        let result = self.run_with_context(&ctx, &request, &progress_bar).await;
        progress_bar.finish_and_clear();

        match &result {
            Ok(output) => info!(
                "{} Clip ready in {}: {}",
                ctx,
                Self::format_duration(ctx.elapsed()),
                output.video.display()
            ),
            Err(e) => error!("{} Clip '{}' failed after {}: {}", ctx, request.theme, Self::format_duration(ctx.elapsed()), e),
        }
        result
    }

    /// Run several requests, at most `concurrent_requests` at a time.
    ///
    /// Results come back in completion order, paired with their request.
    pub async fn run_batch(&self, requests: Vec<ClipRequest>) -> Vec<(ClipRequest, Result<ClipOutput, AppError>)> {
        let limit = self.config.concurrent_requests.max(1);
        info!("Generating {} clip(s), {} at a time", requests.len(), limit);

        stream::iter(requests)
            .map(|request| async move {
                let result = self.run(request.clone()).await;
                (request, result)
            })
            .buffer_unordered(limit)
            .collect()
            .await
    }

    async fn run_with_context(
        &self,
        ctx: &RequestContext,
        request: &ClipRequest,
        progress_bar: &ProgressBar,
    ) -> Result<ClipOutput, AppError> {
        let language = language_utils::get_language_name(&request.language)?;
        let store = FileStore::create(&self.config.output_dir, ctx.id())?;
        let names = ArtifactNames::new(ctx.id());
        info!("{} Generating clip about '{}' in {}", ctx, request.theme, language);

        // 1. Script
        progress_bar.set_message("script");
        let options = GenerationOptions::with_temperature(self.config.text.temperature);
        let script = self.collaborators.text
            .generate(&prompts::script_prompt(&request.theme, &language), &options)
            .await?;
        let script = script.trim().to_string();
        let script_path = store.save(&names.script(), script.as_bytes())?;
        debug!("{} Script: {} chars", ctx, script.chars().count());
        progress_bar.inc(1);

        // 2. Narration
        progress_bar.set_message("narration");
        let narration = self.collaborators.speech.synthesize(&script).await?;
        let narration_name = names.narration(self.codec.format().extension());
        let narration_path = store.save(&narration_name, &narration)?;
        debug!("{} Narration: {} bytes", ctx, narration.len());
        progress_bar.inc(1);

        // 3. Duration reconciliation
        progress_bar.set_message("duration");
        let reconciler = DurationReconciler::new(self.codec.clone(), self.config.audio.reconcile.clone());
        let max_duration = request.max_duration;
        let (narration, rewritten, speed_factor) = blocking(move || {
            let (rewritten, speed_factor) = {
                let reconciled = reconciler.reconcile(&narration, max_duration)?;
                let speed_factor = reconciled.speed_factor;
                (reconciled.is_rewritten().then(|| reconciled.into_bytes()), speed_factor)
            };
            Ok(match rewritten {
                Some(bytes) => (bytes, true, speed_factor),
                None => (narration, false, speed_factor),
            })
        })
        .await?;
        if rewritten {
            store.save(&narration_name, &narration)?;
            info!("{} Narration sped up {:.3}x to fit {:?}s", ctx, speed_factor.unwrap_or(1.0), max_duration);
        }
        progress_bar.inc(1);

        // 4. Transcription
        progress_bar.set_message("transcription");
        let transcript = self.collaborators.transcriber.transcribe(&narration, &narration_name).await?;
        let transcript_json = serde_json::to_vec_pretty(&transcript)
            .map_err(|e| AppError::Unknown(format!("Failed to serialize transcript: {}", e)))?;
        store.save(&names.transcript(), &transcript_json)?;
        debug!("{} Transcript: {} words", ctx, transcript.words.len());
        progress_bar.inc(1);

        // 5. Subtitles
        progress_bar.set_message("subtitles");
        let segmenter = self.config.subtitles.clone();
        let (cues, srt, alignment) = blocking(move || {
            Ok(subtitles::build_subtitles(&transcript.words, &transcript.text, &segmenter)?)
        })
        .await?;
        for degraded in &alignment.degraded {
            warn!("{} {}", ctx, degraded);
        }
        let subtitles_path = store.save(&names.subtitles(), srt.as_bytes())?;
        info!("{} {} subtitle cue(s)", ctx, cues.len());
        progress_bar.inc(1);

        // 6. Slot images
        progress_bar.set_message("images");
        let plans = timeline::plan_slots(&cues);
        let context: String = cues.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
        let mut image_prompts: Vec<String> = Vec::with_capacity(plans.len());
        let mut images = Vec::with_capacity(plans.len());
        for plan in &plans {
            let prompt = self.collaborators.text
                .generate(&prompts::image_prompt(&context, &image_prompts, &plan.text), &options)
                .await?;
            let prompt = prompt.trim().to_string();
            debug!("{} Image {} prompt: {}", ctx, plan.index + 1, prompt);

            let image = self.collaborators.images
                .generate(&prompt, self.config.images.width, self.config.images.height)
                .await?;
            images.push(store.save(&names.image(plan.index), &image)?);
            image_prompts.push(prompt);
        }
        info!("{} {} image(s) generated", ctx, images.len());
        progress_bar.inc(1);

        // 7. Background music
        progress_bar.set_message("music");
        let song = match (&self.music, request.music) {
            (Some(library), true) if !library.is_empty() => {
                self.choose_song(ctx, library, &script, &image_prompts).await?
            }
            _ => None,
        };
        let codec = self.codec.clone();
        let audio = match &song {
            Some(path) => {
                let music = FileManager::read_bytes(path)?;
                let mixer = BackgroundMusicMixer::new(codec, self.config.audio.mix.clone());
                let mixed = blocking(move || Ok(mixer.mix(&narration, &music)?)).await?;
                store.save(&names.mixed_audio(mixed.format.extension()), &mixed.bytes)?;
                mixed
            }
            None => blocking(move || Ok(AudioTrack::measure(narration, codec.as_ref())?)).await?,
        };
        let narration_duration = audio.duration_secs;
        progress_bar.inc(1);

        // 8. Timeline and render
        progress_bar.set_message("render");
        let assembler = TimelineAssembler::new(self.config.video.clone());
        let timeline = {
            let images = images.clone();
            let cues = cues.clone();
            let watermark = request.watermark.clone();
            blocking(move || assembler.assemble(audio, &images, &cues, watermark.as_deref(), max_duration)).await?
        };
        let video_duration = timeline.duration;
        let video_path = store.path_for(&names.video());
        {
            let renderer = self.renderer.clone();
            let output = video_path.clone();
            blocking(move || renderer.render(&timeline, &output)).await?;
        }
        progress_bar.inc(1);

        Ok(ClipOutput {
            request_id: ctx.id().to_string(),
            directory: store.dir().to_path_buf(),
            script: script_path,
            narration: narration_path,
            subtitles: subtitles_path,
            images,
            image_prompts,
            music: song,
            video: video_path,
            cues,
            narration_duration,
            video_duration,
            speed_factor,
        })
    }

    /// Ask the text generator for a song; an unknown id means no music
    async fn choose_song(
        &self,
        ctx: &RequestContext,
        library: &MusicLibrary,
        script: &str,
        image_prompts: &[String],
    ) -> Result<Option<PathBuf>, AppError> {
        let prompt = prompts::music_choice_prompt(script, image_prompts, &library.to_prompt_json());
        let response = self.collaborators.text.generate(&prompt, &GenerationOptions::json()).await?;
        let choice = MusicChoice::parse(&response)?;
        let path = library.resolve(&choice);
        if let Some(path) = &path {
            info!("{} Background music: {} ({})", ctx, path.display(), choice.reasoning);
        }
        Ok(path)
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Run a synchronous stage on the blocking pool
async fn blocking<T, F>(stage: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(stage)
        .await
        .map_err(|e| AppError::Unknown(format!("Pipeline stage panicked: {}", e)))?
}
