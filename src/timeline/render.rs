use std::fmt::{Debug, Write as _};
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, error, info};

use crate::errors::AppError;
use crate::subtitles::to_srt;
use crate::timeline::{ImageSlot, SubtitleStyle, Timeline};

// @module: Flattening a timeline into a video file

/// Turns a `Timeline` into a video file
pub trait VideoRenderer: Send + Sync + Debug {
    fn render(&self, timeline: &Timeline, output: &Path) -> Result<(), AppError>;
}

/// Files the ffmpeg command reads and writes
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPaths {
    pub audio: PathBuf,
    pub subtitles: PathBuf,
    pub output: PathBuf,
}

/// Renders with a single ffmpeg filter graph
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    binary: PathBuf,
}

impl Default for FfmpegRenderer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    /// Command line arguments for `timeline`, without the binary
    pub fn build_args(timeline: &Timeline, paths: &RenderPaths) -> Vec<String> {
        let canvas = timeline.canvas;
        let duration = format_secs(timeline.duration);
        let mut args: Vec<String> = vec!["-v".into(), "error".into(), "-y".into()];

        for slot in timeline.slots() {
            let length = slot.duration.map(format_secs).unwrap_or_else(|| duration.clone());
            args.extend([
                "-loop".into(),
                "1".into(),
                "-framerate".into(),
                canvas.fps.to_string(),
                "-t".into(),
                length,
                "-i".into(),
                slot.image.display().to_string(),
            ]);
        }
        let audio_input = timeline.slot_count();
        args.extend(["-i".into(), paths.audio.display().to_string()]);

        args.extend(["-filter_complex".into(), Self::filter_graph(timeline, &paths.subtitles)]);
        args.extend([
            "-map".into(),
            "[vout]".into(),
            "-map".into(),
            format!("{}:a", audio_input),
            "-c:v".into(),
            "libx264".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-r".into(),
            canvas.fps.to_string(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            "192k".into(),
            "-t".into(),
            duration,
            paths.output.display().to_string(),
        ]);
        args
    }

    fn filter_graph(timeline: &Timeline, subtitles: &Path) -> String {
        let canvas = timeline.canvas;
        let mut graph = String::new();

        for (input, slot) in timeline.slots().enumerate() {
            let _ = write!(
                graph,
                "[{input}:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,\
                 scale=w='trunc({w}*(1+{rate}*t)/2)*2':h='trunc({h}*(1+{rate}*t)/2)*2':eval=frame,crop={w}:{h}",
                w = canvas.width,
                h = canvas.height,
                rate = slot.zoom.rate_per_sec,
            );
            if input > 0 {
                graph.push_str(&Self::overlay_timing(slot));
            }
            let _ = write!(graph, "[s{input}];");
        }

        let mut last = "s0".to_string();
        for (input, slot) in timeline.slots().enumerate().skip(1) {
            let end = slot.end().unwrap_or(timeline.duration);
            let _ = write!(
                graph,
                "[{last}][s{input}]overlay=0:0:eof_action=pass:enable='between(t,{},{})'[v{input}];",
                format_secs(slot.start),
                format_secs(end),
            );
            last = format!("v{input}");
        }

        let _ = write!(
            graph,
            "[{last}]subtitles=filename='{}':original_size={}x{}",
            escape_filter_value(&subtitles.display().to_string()),
            canvas.width,
            canvas.height
        );
        if let Some(dir) = &timeline.subtitles.style.fonts_dir {
            let _ = write!(graph, ":fontsdir='{}'", escape_filter_value(&dir.display().to_string()));
        }
        let _ = write!(
            graph,
            ":force_style='{}'",
            force_style(&timeline.subtitles.style, canvas.width, canvas.height, timeline.subtitles.y)
        );

        if let Some(watermark) = &timeline.watermark {
            let _ = write!(
                graph,
                ",drawtext=text='{}':fontsize={}:fontcolor=white@{:.2}:x=(w-tw)/2:y=(h-th)/2",
                escape_filter_value(&watermark.text),
                watermark.font_size,
                watermark.opacity
            );
        }
        graph.push_str("[vout]");
        graph
    }

    fn overlay_timing(slot: &ImageSlot) -> String {
        let mut filters = ",format=yuva420p".to_string();
        if let (Some(fade), Some(duration)) = (slot.fade, slot.duration) {
            if fade.fade_in > 0.0 {
                filters.push_str(&format!(",fade=t=in:st=0:d={}:alpha=1", format_secs(fade.fade_in)));
            }
            if fade.fade_out > 0.0 {
                filters.push_str(&format!(
                    ",fade=t=out:st={}:d={}:alpha=1",
                    format_secs((duration - fade.fade_out).max(0.0)),
                    format_secs(fade.fade_out)
                ));
            }
        }
        filters.push_str(&format!(",setpts=PTS-STARTPTS+{}/TB", format_secs(slot.start)));
        filters
    }
}

impl VideoRenderer for FfmpegRenderer {
    fn render(&self, timeline: &Timeline, output: &Path) -> Result<(), AppError> {
        let workdir = tempfile::tempdir()?;
        let paths = RenderPaths {
            audio: workdir.path().join(format!("audio.{}", timeline.audio.format.extension())),
            subtitles: workdir.path().join("subtitles.srt"),
            output: output.to_path_buf(),
        };
        std::fs::write(&paths.audio, &timeline.audio.bytes)?;
        std::fs::write(&paths.subtitles, to_srt(&timeline.subtitles.cues))?;

        let args = Self::build_args(timeline, &paths);
        debug!("Running {} with {} arguments", self.binary.display(), args.len());

        let result = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| AppError::File(format!("failed to execute {}: {}", self.binary.display(), e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            error!("ffmpeg render failed: {}", stderr.trim());
            return Err(AppError::Unknown(format!("ffmpeg render failed: {}", stderr.trim())));
        }

        info!("Rendered {:.2}s video to {}", timeline.duration, output.display());
        Ok(())
    }
}

/// ASS style override for the subtitles filter
fn force_style(style: &SubtitleStyle, width: u32, height: u32, y: u32) -> String {
    // bottom-center alignment, margin measured from the bottom edge
    format!(
        "FontName={},FontSize={},PrimaryColour={},OutlineColour={},BorderStyle=1,Outline={},Shadow=0,\
         Alignment=2,MarginV={},MarginL={margin},MarginR={margin},PlayResX={},PlayResY={}",
        style.font,
        style.font_size,
        ass_color(&style.fill),
        ass_color(&style.stroke),
        style.stroke_width,
        height.saturating_sub(y),
        width,
        height,
        margin = width.saturating_sub(style.caption_width) / 2,
    )
}

/// `RRGGBB` to ASS `&HAABBGGRR`
fn ass_color(rgb: &str) -> String {
    let rgb = rgb.trim_start_matches('#');
    if rgb.len() != 6 || !rgb.is_ascii() {
        return "&H00FFFFFF".to_string();
    }
    format!("&H00{}{}{}", &rgb[4..6], &rgb[2..4], &rgb[0..2]).to_uppercase()
}

/// Escape a value placed inside single quotes in a filter graph
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | ':' | '\'' | '%' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_secs(secs: f64) -> String {
    format!("{:.3}", secs.max(0.0))
}
