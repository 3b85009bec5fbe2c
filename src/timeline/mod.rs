/*!
 * Timeline assembly.
 *
 * Cues are grouped two at a time into image slots. Slot 0 is the background
 * and spans the whole video; every other slot is an overlay bounded by its
 * cues. The assembler stacks the slots, the subtitle layer, an optional
 * watermark and the mixed audio into a `Timeline` whose duration is derived
 * once. Turning a timeline into a video file is the job of a `VideoRenderer`.
 */

pub mod render;

pub use render::{FfmpegRenderer, RenderPaths, VideoRenderer};

use std::ops::Range;
use std::path::PathBuf;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::audio::AudioTrack;
use crate::errors::{AppError, ConfigError, TimelineError};
use crate::subtitles::Cue;

/// Number of cues sharing one image slot
pub const CUES_PER_SLOT: usize = 2;

/// Output canvas geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self { width: 1080, height: 1920, fps: 24 }
    }
}

/// Subtitle text appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleStyle {
    /// Font family name
    #[serde(default = "default_font")]
    pub font: String,

    /// Directory holding the font files, if not installed system-wide
    #[serde(default = "default_fonts_dir")]
    pub fonts_dir: Option<PathBuf>,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Fill color as `RRGGBB`
    #[serde(default = "default_fill")]
    pub fill: String,

    /// Stroke color as `RRGGBB`
    #[serde(default = "default_stroke")]
    pub stroke: String,

    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,

    /// Width of the caption box text wraps in
    #[serde(default = "default_caption_width")]
    pub caption_width: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font: default_font(),
            fonts_dir: default_fonts_dir(),
            font_size: default_font_size(),
            fill: default_fill(),
            stroke: default_stroke(),
            stroke_width: default_stroke_width(),
            caption_width: default_caption_width(),
        }
    }
}

fn default_font() -> String {
    "Helvetica".to_string()
}

fn default_fonts_dir() -> Option<PathBuf> {
    Some(PathBuf::from("fonts"))
}

fn default_font_size() -> u32 {
    50
}

fn default_fill() -> String {
    "FFFF00".to_string()
}

fn default_stroke() -> String {
    "000000".to_string()
}

fn default_stroke_width() -> u32 {
    2
}

fn default_caption_width() -> u32 {
    1000
}

/// Video composition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default)]
    pub canvas: Canvas,

    /// Zoom growth per second for every slot
    #[serde(default = "default_zoom_rate")]
    pub zoom_rate_per_sec: f64,

    /// Fade in/out length of overlay slots
    #[serde(default = "default_fade_secs")]
    pub fade_secs: f64,

    /// Vertical position of the subtitle line
    #[serde(default = "default_subtitle_y")]
    pub subtitle_y: u32,

    #[serde(default)]
    pub subtitle_style: SubtitleStyle,

    #[serde(default = "default_watermark_opacity")]
    pub watermark_opacity: f64,

    #[serde(default = "default_watermark_font_size")]
    pub watermark_font_size: u32,

    /// ffmpeg executable used for rendering and MP3 coding
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            zoom_rate_per_sec: default_zoom_rate(),
            fade_secs: default_fade_secs(),
            subtitle_y: default_subtitle_y(),
            subtitle_style: SubtitleStyle::default(),
            watermark_opacity: default_watermark_opacity(),
            watermark_font_size: default_watermark_font_size(),
            ffmpeg_path: default_ffmpeg(),
        }
    }
}

fn default_zoom_rate() -> f64 {
    0.02
}

fn default_fade_secs() -> f64 {
    0.5
}

fn default_subtitle_y() -> u32 {
    1620
}

fn default_watermark_opacity() -> f64 {
    0.5
}

fn default_watermark_font_size() -> u32 {
    64
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

impl VideoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let canvas = self.canvas;
        if canvas.width == 0 || canvas.height == 0 || canvas.fps == 0 {
            return Err(ConfigError::InvalidValue {
                name: "video.canvas",
                reason: format!("{}x{} at {} fps", canvas.width, canvas.height, canvas.fps),
            });
        }
        if !(0.0..=1.0).contains(&self.watermark_opacity) {
            return Err(ConfigError::InvalidValue {
                name: "video.watermark_opacity",
                reason: format!("{} is outside [0, 1]", self.watermark_opacity),
            });
        }
        if !self.fade_secs.is_finite() || self.fade_secs < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "video.fade_secs",
                reason: format!("{} is not a non-negative number", self.fade_secs),
            });
        }
        if self.subtitle_y >= canvas.height {
            return Err(ConfigError::InvalidValue {
                name: "video.subtitle_y",
                reason: format!("{} is outside a canvas {} pixels high", self.subtitle_y, canvas.height),
            });
        }
        Ok(())
    }
}

/// Slow zoom-in: scale = 1 + rate * t, t local to the slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomEffect {
    pub rate_per_sec: f64,
}

impl ZoomEffect {
    pub fn scale_at(&self, t: f64) -> f64 {
        1.0 + self.rate_per_sec * t.max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeEffect {
    pub fade_in: f64,
    pub fade_out: f64,
}

/// A slot before its image exists
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPlan {
    pub index: usize,
    /// Cues shown while this slot is on screen
    pub cues: Range<usize>,
    pub start: f64,
    /// `None` for the background slot, which lasts the whole video
    pub end: Option<f64>,
    /// Joined text of the slot's cues
    pub text: String,
}

impl SlotPlan {
    pub fn is_background(&self) -> bool {
        self.index == 0
    }
}

/// Number of images a cue list needs; the background is always required
pub fn required_images(cue_count: usize) -> usize {
    cue_count.div_ceil(CUES_PER_SLOT).max(1)
}

/// Group cues into slots two at a time; the last slot may hold one cue
pub fn plan_slots(cues: &[Cue]) -> Vec<SlotPlan> {
    if cues.is_empty() {
        return vec![SlotPlan { index: 0, cues: 0..0, start: 0.0, end: None, text: String::new() }];
    }

    cues.chunks(CUES_PER_SLOT)
        .enumerate()
        .map(|(index, group)| {
            let first = index * CUES_PER_SLOT;
            let text = group.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
            if index == 0 {
                SlotPlan { index, cues: first..first + group.len(), start: 0.0, end: None, text }
            } else {
                SlotPlan {
                    index,
                    cues: first..first + group.len(),
                    start: group[0].start,
                    end: Some(group[group.len() - 1].end),
                    text,
                }
            }
        })
        .collect()
}

/// Final composition length.
///
/// The longer of audio and subtitles, capped by `max_duration`.
pub fn final_duration(audio_secs: f64, cues: &[Cue], max_duration: Option<f64>) -> f64 {
    let last_cue_end = cues.last().map(|c| c.end).unwrap_or(audio_secs);
    let desired = audio_secs.max(last_cue_end);
    match max_duration {
        Some(max) => desired.min(max),
        None => desired,
    }
}

// @struct: One image on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSlot {
    // @field: Slot position, 0 is the background
    pub index: usize,

    // @field: Start on the global timeline
    pub start: f64,

    // @field: Display length; `None` lasts the whole video
    pub duration: Option<f64>,

    // @field: Image file
    pub image: PathBuf,

    pub zoom: ZoomEffect,

    // @field: Overlays only
    pub fade: Option<FadeEffect>,
}

impl ImageSlot {
    pub fn end(&self) -> Option<f64> {
        self.duration.map(|d| self.start + d)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleLayer {
    pub cues: Vec<Cue>,
    pub style: SubtitleStyle,
    /// Vertical anchor, horizontally centered
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkLayer {
    pub text: String,
    pub opacity: f64,
    pub font_size: u32,
}

// @struct: Fully timed composition
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub canvas: Canvas,
    pub background: ImageSlot,
    pub overlays: Vec<ImageSlot>,
    pub subtitles: SubtitleLayer,
    pub watermark: Option<WatermarkLayer>,
    pub audio: AudioTrack,
    // @field: Length every layer is flattened to
    pub duration: f64,
}

impl Timeline {
    pub fn slot_count(&self) -> usize {
        1 + self.overlays.len()
    }

    /// Background first, then overlays in order
    pub fn slots(&self) -> impl Iterator<Item = &ImageSlot> {
        std::iter::once(&self.background).chain(self.overlays.iter())
    }
}

/// Builds timelines from assets and cues
#[derive(Debug, Clone, Default)]
pub struct TimelineAssembler {
    config: VideoConfig,
}

impl TimelineAssembler {
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }

    /// Assemble the composition.
    ///
    /// `images` holds one file per slot, background first. The audio is
    /// attached as is; when it is shorter than the subtitles the video keeps
    /// going past it.
    pub fn assemble(
        &self,
        audio: AudioTrack,
        images: &[PathBuf],
        cues: &[Cue],
        watermark: Option<&str>,
        max_duration: Option<f64>,
    ) -> Result<Timeline, AppError> {
        if let Some(max) = max_duration {
            if !max.is_finite() || max <= 0.0 {
                return Err(ConfigError::InvalidMaxDuration(max).into());
            }
        }

        for (index, cue) in cues.iter().enumerate() {
            if cue.end < cue.start {
                return Err(TimelineError::NegativeDuration { index, start: cue.start, end: cue.end }.into());
            }
        }

        let plans = plan_slots(cues);
        if images.len() != plans.len() {
            return Err(TimelineError::ImageCountMismatch { expected: plans.len(), actual: images.len() }.into());
        }

        let duration = final_duration(audio.duration_secs, cues, max_duration);
        if duration > audio.duration_secs {
            debug!(
                "Video runs {:.2}s past the end of the audio ({:.2}s)",
                duration - audio.duration_secs,
                audio.duration_secs
            );
        }

        let zoom = ZoomEffect { rate_per_sec: self.config.zoom_rate_per_sec };
        let mut slots = plans.iter().zip(images).map(|(plan, image)| {
            let slot_duration = plan.end.map(|end| end - plan.start);
            let fade = slot_duration.map(|d| {
                let length = self.config.fade_secs.min(d / 2.0);
                FadeEffect { fade_in: length, fade_out: length }
            });
            ImageSlot {
                index: plan.index,
                start: plan.start,
                duration: slot_duration,
                image: image.clone(),
                zoom,
                fade,
            }
        });

        let Some(background) = slots.next() else {
            return Err(TimelineError::ImageCountMismatch { expected: 1, actual: 0 }.into());
        };
        let overlays: Vec<ImageSlot> = slots.collect();

        for overlay in overlays.iter().filter(|o| o.start >= duration) {
            warn!("Slot {} starts at {:.2}s, after the video ends at {:.2}s", overlay.index, overlay.start, duration);
        }

        let watermark = watermark
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| WatermarkLayer {
                text: text.to_string(),
                opacity: self.config.watermark_opacity,
                font_size: self.config.watermark_font_size,
            });

        debug!(
            "Assembled timeline: {} slot(s), {} cue(s), watermark: {}, {:.2}s",
            1 + overlays.len(),
            cues.len(),
            watermark.is_some(),
            duration
        );

        Ok(Timeline {
            canvas: self.config.canvas,
            background,
            overlays,
            subtitles: SubtitleLayer {
                cues: cues.to_vec(),
                style: self.config.subtitle_style.clone(),
                y: self.config.subtitle_y,
            },
            watermark,
            audio,
            duration,
        })
    }
}
