//! End-to-end action tests against fake tool scripts.

#![cfg(unix)]

mod common;

use std::fs;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use common::*;
use mixforge::{
    CancellationToken, Config, Engine, Error, FadeSpec, MixSpec, ToolRegistry, ToolsConfig,
    ViceFile,
};

// ===== Engine construction =====

#[test]
fn engine_requires_ffmpeg() {
    let tools = FakeTools::new().install("ffplay", FFPLAY_SINK);
    let err = Engine::with_tools(Config::default(), tools.registry()).unwrap_err();
    assert_matches!(err, Error::ToolNotFound { ref tool } if tool == "ffmpeg");
}

#[test]
fn engine_discovers_tools_in_bin_dir() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_OK);
    let config = Config {
        tools: ToolsConfig::from_bin_dir(tools.dir()),
        ..Config::default()
    };
    let engine = Engine::new(config).unwrap();
    assert_eq!(
        engine.tools().require("ffmpeg").unwrap(),
        tools.dir().join("ffmpeg")
    );
}

// ===== Transcode and cut =====

#[tokio::test]
async fn transcode_to_wav_builds_pcm_command() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_OK);
    let engine = tools.engine();
    let input = tools.dir().join("song.mp3");
    let output = tools.dir().join("song.wav");

    let written = engine
        .transcode_to_wav(&input, &output, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(written, output);
    assert_eq!(fs::read_to_string(&output).unwrap(), "encoded");

    let args = tools.args_of("ffmpeg").unwrap();
    assert_eq!(value_after(&args, "-loglevel"), Some("error"));
    assert_eq!(value_after(&args, "-i"), Some(input.to_str().unwrap()));
    assert_eq!(value_after(&args, "-c:a"), Some("pcm_s16le"));
    assert_eq!(value_after(&args, "-ac"), Some("2"));
    assert!(args.contains(&"-vn".to_string()));
    assert!(engine.active_operations().is_empty());
}

#[tokio::test]
async fn transcode_to_m4r_is_renamed_into_place() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_OK);
    let engine = tools.engine();
    let output = tools.dir().join("ring.m4r");

    let written = engine
        .transcode(&tools.dir().join("clip.mp4"), &output, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(written, output);
    assert_eq!(fs::read_to_string(&output).unwrap(), "encoded");
    assert!(!tools.dir().join("ring.m4r.m4a").exists());

    let args = tools.args_of("ffmpeg").unwrap();
    assert!(args.last().unwrap().ends_with("ring.m4r.m4a"));
}

#[tokio::test]
async fn failed_transcode_leaves_no_stale_output() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_FAIL);
    let engine = tools.engine();
    let output = tools.dir().join("song.wav");
    fs::write(&output, "from an earlier run").unwrap();

    let err = engine
        .transcode_to_wav(&tools.dir().join("song.mp3"), &output, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(err, Error::Process { ref tool, .. } if tool == "ffmpeg");
    assert!(!output.exists());
    assert!(engine.active_operations().is_empty());
}

#[tokio::test]
async fn cut_uses_stream_copy_with_second_offsets() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_OK);
    let engine = tools.engine();
    let output = tools.dir().join("clip.wav");

    engine
        .cut(&tools.dir().join("take.wav"), 2_500, 10_000, &output, &CancellationToken::new())
        .await
        .unwrap();

    let args = tools.args_of("ffmpeg").unwrap();
    assert_eq!(value_after(&args, "-ss"), Some("2.5"));
    assert_eq!(value_after(&args, "-t"), Some("10"));
    assert_eq!(value_after(&args, "-c"), Some("copy"));
    assert!(output.exists());
}

// ===== Cancellation =====

#[tokio::test]
async fn cancelling_a_running_action_is_prompt() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_SLOW);
    let engine = tools.engine();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = engine
        .transcode_to_wav(&tools.dir().join("a.mp3"), &tools.dir().join("a.wav"), &cancel)
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(err.is_cancelled(), "unexpected error: {err}");
    assert!(engine.active_operations().is_empty());
}

#[tokio::test]
async fn terminate_from_another_task_cancels_the_action() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_SLOW);
    let engine = tools.engine();

    let running = {
        let engine = engine.clone();
        let input = tools.dir().join("a.mp3");
        let output = tools.dir().join("a.wav");
        tokio::spawn(async move {
            engine
                .transcode_to_wav(&input, &output, &CancellationToken::new())
                .await
        })
    };

    let id = loop {
        if let Some(id) = engine.active_operations().first().copied() {
            break id;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    };
    engine.terminate(id).unwrap();

    let err = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("action did not return after terminate")
        .unwrap()
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(engine.terminate(id).unwrap_err().is_not_found());
}

// ===== Mix =====

#[tokio::test]
async fn passthrough_mix_copies_without_ffmpeg() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_OK);
    let engine = tools.engine();
    let main = tools.dir().join("main.wav");
    let output = tools.dir().join("out.wav");
    fs::write(&main, "main pcm").unwrap();

    engine
        .mix(&MixSpec::new(&main), &output, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "main pcm");
    assert!(tools.args_of("ffmpeg").is_none());
}

#[tokio::test]
async fn mix_passes_filter_graph_and_forced_format() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_OK);
    let engine = tools.engine();
    let main = tools.dir().join("m.wav");
    let vice = tools.dir().join("v1.wav");
    let output = tools.dir().join("mixed.wav");

    let spec = MixSpec::new(&main)
        .with_vice_file(ViceFile::new(&vice, 2_000))
        .with_fade_out(FadeSpec::new(9_000, 1_000));
    engine
        .mix(&spec, &output, &CancellationToken::new())
        .await
        .unwrap();

    let args = tools.args_of("ffmpeg").unwrap();
    let inputs: Vec<&str> = args
        .iter()
        .enumerate()
        .filter(|(_, a)| *a == "-i")
        .map(|(i, _)| args[i + 1].as_str())
        .collect();
    assert_eq!(inputs, [main.to_str().unwrap(), vice.to_str().unwrap()]);
    assert_eq!(
        value_after(&args, "-filter_complex"),
        Some(
            "[1]adelay=delays=2000:all=1[del1],[0][del1]amix=inputs=2:duration=first[mixed],\
             [mixed]afade=t=out:st=9:d=1"
        )
    );
    assert_eq!(value_after(&args, "-ac"), Some("2"));
    assert_eq!(value_after(&args, "-ar"), Some("44100"));
    assert_eq!(args.last().map(String::as_str), output.to_str());
}

#[tokio::test]
async fn invalid_mix_is_rejected_before_anything_runs() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_OK);
    let engine = tools.engine();
    let output = tools.dir().join("out.wav");
    fs::write(&output, "keep").unwrap();

    let spec = MixSpec::new(tools.dir().join("m.wav")).with_volume(f64::NAN);
    let err = engine
        .mix(&spec, &output, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(err, Error::Validation(_));
    assert!(tools.args_of("ffmpeg").is_none());
    assert!(output.exists());
}

// ===== Preview and playback =====

#[tokio::test]
async fn preview_streams_engine_output_into_player() {
    let tools = FakeTools::new()
        .install("ffmpeg", FFMPEG_OK)
        .install("ffplay", FFPLAY_SINK);
    let engine = tools.engine();

    let spec = MixSpec::new(tools.dir().join("m.wav")).with_volume(0.5);
    engine
        .preview_mix(&spec, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(tools.read("ffplay.sink").as_deref(), Some("RIFFfakewav"));
    let producer = tools.args_of("ffmpeg").unwrap();
    assert_eq!(value_after(&producer, "-f"), Some("wav"));
    assert_eq!(producer.last().map(String::as_str), Some("-"));
    let consumer = tools.args_of("ffplay").unwrap();
    assert_eq!(value_after(&consumer, "-i"), Some("-"));
    assert!(engine.active_operations().is_empty());
}

#[tokio::test]
async fn preview_with_unstartable_player_tears_down_engine() {
    let tools = FakeTools::new()
        .install("ffmpeg", FFMPEG_SLOW)
        .missing("ffplay");
    let engine = tools.engine();

    let spec = MixSpec::new(tools.dir().join("m.wav")).with_volume(0.5);
    let started = Instant::now();
    let err = engine
        .preview_mix(&spec, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(err, Error::Spawn { ref tool, .. } if tool.starts_with("ffplay"));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(engine.active_operations().is_empty());
}

#[tokio::test]
async fn passthrough_preview_plays_main_directly() {
    let tools = FakeTools::new()
        .install("ffmpeg", FFMPEG_OK)
        .install("ffplay", FFPLAY_SINK);
    let engine = tools.engine();
    let main = tools.dir().join("m.wav");

    engine
        .preview_mix(&MixSpec::new(&main), &CancellationToken::new())
        .await
        .unwrap();

    assert!(tools.args_of("ffmpeg").is_none());
    let args = tools.args_of("ffplay").unwrap();
    assert_eq!(value_after(&args, "-i"), main.to_str());
    assert!(args.contains(&"-autoexit".to_string()));
    assert!(args.contains(&"-nodisp".to_string()));
}

#[tokio::test]
async fn play_slice_seeks_in_seconds() {
    let tools = FakeTools::new()
        .install("ffmpeg", FFMPEG_OK)
        .install("ffplay", FFPLAY_SINK);
    let engine = tools.engine();

    engine
        .play_slice(&tools.dir().join("m.wav"), 61_250, 5_000, &CancellationToken::new())
        .await
        .unwrap();

    let args = tools.args_of("ffplay").unwrap();
    assert_eq!(value_after(&args, "-ss"), Some("61.25"));
    assert_eq!(value_after(&args, "-t"), Some("5"));
}

#[tokio::test]
async fn play_url_puts_youtube_dl_on_child_path() {
    let helpers = FakeTools::new().install("youtube-dl", "exit 0");
    let tools = FakeTools::new()
        .install("ffmpeg", FFMPEG_OK)
        .install("mpv", MPV_RECORD_PATH);
    let mut paths: Vec<_> = vec![
        ("ffmpeg".to_string(), tools.dir().join("ffmpeg")),
        ("mpv".to_string(), tools.dir().join("mpv")),
    ];
    paths.push(("youtube-dl".to_string(), helpers.dir().join("youtube-dl")));
    let engine = Engine::with_tools(Config::default(), ToolRegistry::from_paths(paths)).unwrap();

    engine
        .play_url("https://example.com/watch?v=abc", &CancellationToken::new())
        .await
        .unwrap();

    let args = tools.args_of("mpv").unwrap();
    assert_eq!(args, ["--no-video", "https://example.com/watch?v=abc"]);
    let child_path = tools.read("mpv.path").unwrap();
    let first = std::env::split_paths(&child_path).next().unwrap();
    assert_eq!(first, helpers.dir().to_path_buf());
}

// ===== Probing =====

#[tokio::test]
async fn probe_reads_duration_from_ffprobe() {
    let tools = FakeTools::new()
        .install("ffmpeg", FFMPEG_OK)
        .install("ffprobe", FFPROBE_3_5S);
    let engine = tools.engine();
    let path = tools.dir().join("m.wav");

    assert_eq!(engine.probe_duration(&path).await, 3_500);
    let info = engine.probe_format(&path).await.unwrap();
    assert_eq!(info.format_name.as_deref(), Some("wav"));
    assert_eq!(info.size, Some(617_444));
}

#[tokio::test]
async fn probe_without_ffprobe_degrades_to_zero() {
    let tools = FakeTools::new().install("ffmpeg", FFMPEG_OK);
    let engine = tools.engine();
    let path = tools.dir().join("m.wav");

    assert_eq!(engine.probe_duration(&path).await, 0);
    assert_matches!(
        engine.probe_format(&path).await.unwrap_err(),
        Error::ToolNotFound { .. }
    );
}
