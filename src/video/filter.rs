//! ffmpeg argument and filter-graph construction.
//!
//! Everything here is pure: callers probe the media first and pass the
//! results in through [`MediaInfo`], which keeps the graph logic testable
//! without ffmpeg installed.
//!
//! Input layout:
//!
//! ```text
//! 0            background video (looped when shorter than the dialogue)
//! 1..=n        one audio input per scene, trimmed to its safe duration
//! n+1..        one still image per scene that has a character image
//! ```

use std::path::Path;

use super::model::VideoProject;
use crate::config::{RenderConfig, SubtitleConfig, SubtitlePosition};

/// Subtitle lines are wrapped to this many characters.
pub const SUBTITLE_WRAP: usize = 25;

/// Probed facts about the inputs of a render.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub background_width: u32,
    pub background_height: u32,
    /// Zero when unknown.
    pub background_duration: f64,
    /// Probed length of each scene's audio, in scene order.
    pub audio_durations: Vec<Option<f64>>,
}

/// Output canvas: the configured size when both sides are set, else the
/// background's.
pub fn output_size(render: &RenderConfig, media: &MediaInfo) -> (u32, u32) {
    match (render.width, render.height) {
        (Some(w), Some(h)) => (w, h),
        _ => (media.background_width, media.background_height),
    }
}

/// How many times the background plays to cover `total` seconds.
pub fn loop_count(total: f64, background: f64) -> u32 {
    if background <= 0.0 || total <= background {
        1
    } else {
        (total / background).floor() as u32 + 1
    }
}

/// Greedy word wrap; words longer than `width` get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Quote a value for a filter option inside `-filter_complex`.
///
/// The value is unescaped twice: once by the graph parser, which strips the
/// single quotes, then by the filter's option parser, which handles `\\`,
/// `\'` and `\:`. A `'` cannot appear inside a quoted run, so it closes the
/// quote, emits `\'` and reopens.
pub fn quote_option(value: &str) -> String {
    let option = value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:");
    format!("'{}'", option.replace('\'', "'\\''"))
}

fn fmt_secs(t: f64) -> String {
    format!("{t:.3}")
}

/// One `drawtext` filter showing `text` between `start` and `end`.
pub fn drawtext_filter(text: &str, start: f64, end: f64, style: &SubtitleConfig) -> String {
    let wrapped = wrap_text(text, SUBTITLE_WRAP).join("\n");
    let y = match style.position {
        SubtitlePosition::Bottom => format!("h-text_h-{}", style.margin),
        SubtitlePosition::Top => style.margin.to_string(),
        SubtitlePosition::Center => "(h-text_h)/2".to_string(),
    };
    format!(
        "drawtext=text={text}:expansion=none:font={font}:fontsize={size}:\
         fontcolor={color}:borderw={bw}:bordercolor={bc}:x=(w-text_w)/2:y={y}:\
         enable='between(t,{start},{end})'",
        text = quote_option(&wrapped),
        font = quote_option(&style.font_name),
        size = style.font_size,
        color = style.font_color,
        bw = style.stroke_width,
        bc = style.stroke_color,
        start = fmt_secs(start),
        end = fmt_secs(end),
    )
}

/// The `-filter_complex` graph.  Produces `[vout]` and `[aout]`.
pub fn filter_graph(
    project: &VideoProject,
    render: &RenderConfig,
    media: &MediaInfo,
) -> String {
    let (w, h) = output_size(render, media);
    let n = project.scenes.len();
    let mut chains = vec![format!("[0:v]scale={w}:{h},setsar=1[bg]")];

    // Character overlays.
    let mut current = "bg".to_string();
    let mut image_input = n + 1;
    for (i, scene) in project.scenes.iter().enumerate() {
        if scene.character_image.is_none() {
            continue;
        }
        chains.push(format!("[{image_input}:v]scale={w}:-1[img{i}]"));
        let next = format!("ov{i}");
        chains.push(format!(
            "[{current}][img{i}]overlay=(W-w)/2:(H-h)/2:enable='between(t,{},{})'[{next}]",
            fmt_secs(scene.start_time),
            fmt_secs(scene.end_time())
        ));
        current = next;
        image_input += 1;
    }

    // Subtitles.
    let subtitles: Vec<String> = if project.enable_subtitles && render.subtitles.enabled {
        project
            .scenes
            .iter()
            .filter(|s| !s.dialogue().trim().is_empty())
            .map(|s| drawtext_filter(s.dialogue().trim(), s.start_time, s.end_time(), &render.subtitles))
            .collect()
    } else {
        Vec::new()
    };
    if subtitles.is_empty() {
        chains.push(format!("[{current}]null[vout]"));
    } else {
        chains.push(format!("[{current}]{}[vout]", subtitles.join(",")));
    }

    // Audio: each scene delayed to its start, then mixed without level
    // normalisation.
    let mut mix_inputs = String::new();
    for (i, scene) in project.scenes.iter().enumerate() {
        let ms = (scene.start_time * 1000.0).round() as u64;
        chains.push(format!("[{}:a]adelay={ms}|{ms}[a{i}]", i + 1));
        mix_inputs.push_str(&format!("[a{i}]"));
    }
    chains.push(format!("{mix_inputs}amix=inputs={n}:normalize=0[aout]"));

    chains.join(";")
}

/// Audio length to read: the shorter of the probed and recorded duration.
pub fn safe_duration(probed: Option<f64>, recorded: f64) -> f64 {
    match probed {
        Some(p) if p > 0.0 => p.min(recorded),
        _ => recorded,
    }
}

/// Full ffmpeg argument list for rendering `project` to `output`.
pub fn build_args(
    project: &VideoProject,
    render: &RenderConfig,
    media: &MediaInfo,
    output: &Path,
) -> Vec<String> {
    let total = project.total_duration();
    let mut args: Vec<String> = vec!["-y".into()];

    if loop_count(total, media.background_duration) > 1 {
        args.extend(["-stream_loop".into(), "-1".into()]);
    }
    args.push("-i".into());
    args.push(project.background.path.to_string_lossy().to_string());

    for (i, scene) in project.scenes.iter().enumerate() {
        let probed = media.audio_durations.get(i).copied().flatten();
        args.push("-t".into());
        args.push(fmt_secs(safe_duration(probed, scene.duration)));
        args.push("-i".into());
        args.push(scene.audio_file.path.to_string_lossy().to_string());
    }

    for scene in &project.scenes {
        if let Some(img) = &scene.character_image {
            args.extend(["-loop".into(), "1".into(), "-t".into(), fmt_secs(total)]);
            args.push("-i".into());
            args.push(img.to_string_lossy().to_string());
        }
    }

    args.push("-filter_complex".into());
    args.push(filter_graph(project, render, media));
    args.extend(["-map".into(), "[vout]".into(), "-map".into(), "[aout]".into()]);
    args.extend(["-t".into(), fmt_secs(total)]);
    args.extend(["-r".into(), render.fps.to_string()]);

    let codec = project.output_format.codec();
    args.extend(["-c:v".into(), codec.to_string()]);
    if codec == "libx264" {
        args.extend([
            "-preset".into(),
            project.quality.preset().to_string(),
            "-crf".into(),
            project.quality.crf().to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
        ]);
    }
    args.extend(["-c:a".into(), "aac".into()]);
    args.push(output.to_string_lossy().to_string());
    args
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFile;
    use crate::config::Character;
    use crate::video::{CharacterScene, VideoClip, VideoFormat, VideoQuality};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn media(bg_secs: f64) -> MediaInfo {
        MediaInfo {
            background_width: 1080,
            background_height: 1920,
            background_duration: bg_secs,
            audio_durations: vec![Some(1.9), None],
        }
    }

    fn project(dir: &Path, with_image: bool) -> VideoProject {
        let bg = dir.join("bg.mp4");
        std::fs::write(&bg, b"v").unwrap();
        let img = dir.join("alice.png");
        std::fs::write(&img, b"p").unwrap();

        let alice = Character::basic("Alice");
        let bob = Character::basic("Bob");
        let s0 = CharacterScene::new(
            alice.clone(),
            AudioFile::new("/a/0.wav", alice, "It's 5:00, 100% late"),
            0.0,
            2.0,
            with_image.then(|| img.clone()),
        )
        .unwrap();
        let s1 = CharacterScene::new(
            bob.clone(),
            AudioFile::new("/a/1.wav", bob, ""),
            2.0,
            1.5,
            None,
        )
        .unwrap();

        VideoProject {
            background: VideoClip::new(bg, 0.0, None).unwrap(),
            scenes: vec![s0, s1],
            output_format: VideoFormat::Mp4,
            quality: VideoQuality::High,
            enable_subtitles: true,
        }
    }

    #[test]
    fn wrap_respects_width() {
        assert_eq!(
            wrap_text("the quick brown fox jumps over the lazy dog", 25),
            vec!["the quick brown fox jumps", "over the lazy dog"]
        );
        assert_eq!(wrap_text("supercalifragilisticexpialidocious yes", 10), vec![
            "supercalifragilisticexpialidocious",
            "yes"
        ]);
        assert!(wrap_text("   ", 25).is_empty());
    }

    /// Reads one token the way ffmpeg's `av_get_token` does: backslash takes
    /// the next character literally, single quotes group, `terms` stop.
    fn read_token(input: &str, terms: &str) -> (String, String) {
        let mut chars = input.trim_start().chars().peekable();
        let mut out = String::new();
        while let Some(&c) = chars.peek() {
            if terms.contains(c) {
                break;
            }
            chars.next();
            match c {
                '\\' => out.extend(chars.next()),
                '\'' => {
                    for q in chars.by_ref() {
                        if q == '\'' {
                            break;
                        }
                        out.push(q);
                    }
                }
                _ => out.push(c),
            }
        }
        (out, chars.collect())
    }

    /// Graph-level token, then `key=value` pairs split on `:`.
    fn drawtext_options(filter: &str) -> Vec<(String, String)> {
        let args = filter.strip_prefix("drawtext=").expect("drawtext filter");
        let (args, rest) = read_token(args, "[],;");
        assert!(rest.is_empty(), "graph parser stopped early at {rest:?}");

        let mut opts = Vec::new();
        let mut rest = args;
        while !rest.is_empty() {
            let (key, value) = rest.split_once('=').expect("key=value");
            let key = key.to_string();
            let (value, tail) = read_token(value, ":");
            opts.push((key, value));
            rest = tail.strip_prefix(':').unwrap_or(&tail).to_string();
        }
        opts
    }

    fn option<'a>(opts: &'a [(String, String)], key: &str) -> &'a str {
        opts.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing option {key}"))
    }

    #[test]
    fn quote_option_escapes_for_both_parsers() {
        assert_eq!(quote_option("It's 5:00, 100%"), "'It\\'\\''s 5\\:00, 100%'");
        assert_eq!(quote_option("a\\b"), "'a\\\\b'");
        assert_eq!(quote_option("plain"), "'plain'");
    }

    #[test]
    fn drawtext_keeps_dialogue_verbatim() {
        let mut style = SubtitleConfig::default();
        style.font_name = "O'Brien:Bold".into();

        for line in ["It's 5:00, 100%", "back\\slash \\n", "50% off; [now]"] {
            let opts = drawtext_options(&drawtext_filter(line, 0.0, 1.0, &style));
            assert_eq!(option(&opts, "text"), line);
            assert_eq!(option(&opts, "expansion"), "none");
            assert_eq!(option(&opts, "font"), "O'Brien:Bold");
            assert_eq!(option(&opts, "enable"), "between(t,0.000,1.000)");
        }
    }

    #[test]
    fn drawtext_positions() {
        let mut style = SubtitleConfig::default();
        let f = drawtext_filter("hi", 1.0, 2.5, &style);
        assert!(f.contains("y=h-text_h-50"));
        assert!(f.contains("x=(w-text_w)/2"));
        assert!(f.contains("enable='between(t,1.000,2.500)'"));
        assert!(f.contains("fontsize=48:fontcolor=white:borderw=2:bordercolor=black"));

        style.position = SubtitlePosition::Top;
        style.margin = 80;
        assert!(drawtext_filter("hi", 0.0, 1.0, &style).contains("y=80:"));
        style.position = SubtitlePosition::Center;
        assert!(drawtext_filter("hi", 0.0, 1.0, &style).contains("y=(h-text_h)/2:"));
    }

    #[test]
    fn graph_overlays_images_and_mixes_audio() {
        let dir = tempdir().expect("temp dir");
        let p = project(dir.path(), true);
        let graph = filter_graph(&p, &RenderConfig::default(), &media(10.0));

        assert!(graph.starts_with("[0:v]scale=1080:1920,setsar=1[bg]"));
        assert!(graph.contains("[3:v]scale=1080:-1[img0]"));
        assert!(graph.contains("[bg][img0]overlay=(W-w)/2:(H-h)/2:enable='between(t,0.000,2.000)'[ov0]"));
        assert!(graph.contains("[ov0]drawtext="));
        assert_eq!(graph.matches("drawtext=").count(), 1);
        assert!(graph.contains("[1:a]adelay=0|0[a0]"));
        assert!(graph.contains("[2:a]adelay=2000|2000[a1]"));
        assert!(graph.ends_with("[a0][a1]amix=inputs=2:normalize=0[aout]"));
    }

    #[test]
    fn graph_without_subtitles_passes_video_through() {
        let dir = tempdir().expect("temp dir");
        let mut p = project(dir.path(), false);
        p.enable_subtitles = false;
        let graph = filter_graph(&p, &RenderConfig::default(), &media(10.0));
        assert!(graph.contains("[bg]null[vout]"));
    }

    #[test]
    fn args_loop_short_background_and_apply_quality() {
        let dir = tempdir().expect("temp dir");
        let p = project(dir.path(), false);
        let mut render = RenderConfig::default();
        render.width = Some(720);
        render.height = Some(1280);

        let args = build_args(&p, &render, &media(1.0), &PathBuf::from("out.mp4"));
        assert_eq!(&args[..4], &["-y", "-stream_loop", "-1", "-i"]);
        assert!(args.windows(4).any(|w| w == ["-t", "1.900", "-i", "/a/0.wav"]));
        assert!(args.windows(4).any(|w| w == ["-t", "1.500", "-i", "/a/1.wav"]));
        assert!(args.windows(2).any(|w| w == ["-crf", "18"]));
        assert!(args.windows(2).any(|w| w == ["-preset", "slow"]));
        assert!(args.windows(2).any(|w| w == ["-t", "3.500"]));
        assert!(args.iter().any(|a| a.starts_with("[0:v]scale=720:1280")));
        assert_eq!(args.last().unwrap(), "out.mp4");

        let args = build_args(&p, &render, &media(60.0), &PathBuf::from("out.mp4"));
        assert!(!args.contains(&"-stream_loop".to_string()));

        let mut avi = p.clone();
        avi.output_format = VideoFormat::Avi;
        let args = build_args(&avi, &render, &media(60.0), &PathBuf::from("out.avi"));
        assert!(args.windows(2).any(|w| w == ["-c:v", "libxvid"]));
        assert!(!args.contains(&"-crf".to_string()));
    }

    #[test]
    fn loop_count_and_safe_duration() {
        assert_eq!(loop_count(25.0, 10.0), 3);
        assert_eq!(loop_count(5.0, 10.0), 1);
        assert_eq!(loop_count(5.0, 0.0), 1);
        assert_eq!(safe_duration(Some(2.2), 2.0), 2.0);
        assert_eq!(safe_duration(Some(1.8), 2.0), 1.8);
        assert_eq!(safe_duration(None, 2.0), 2.0);
    }
}
