// Encode and VMAF argument lists per encoder

use crate::common::mocks::{capabilities, props};
use std::ffi::OsStr;
use std::path::Path;
use vidshrink::engine::vmaf::build_vmaf_cmd;
use vidshrink::engine::{EncoderCapabilitySet, VideoEncoder, build_encode_cmd};

fn args_of(cmd: &vidshrink::engine::EncodeCommand) -> Vec<String> {
    cmd.args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_nvenc_uses_cuda_and_caps_spikes() {
    let source = props(Path::new("/v/in.mp4"), 1920, 1080, 12_000);
    let caps = EncoderCapabilitySet {
        supports_temporal_aq: true,
        ..capabilities(VideoEncoder::Nvenc)
    };

    let cmd = build_encode_cmd(&source, &caps, 8000, 1.25, Path::new("/v/in.tmp.mp4"));
    let args = args_of(&cmd);

    let hwaccel = args.iter().position(|a| a == "-hwaccel").unwrap();
    let input = args.iter().position(|a| a == "-i").unwrap();
    assert!(hwaccel < input, "hwaccel must precede the input");
    assert_eq!(cmd.value_of("-hwaccel"), Some(OsStr::new("cuda")));
    assert_eq!(cmd.value_of("-c:v"), Some(OsStr::new("hevc_nvenc")));
    assert_eq!(cmd.value_of("-maxrate:v"), Some(OsStr::new("10000k")));
    assert_eq!(cmd.value_of("-temporal-aq"), Some(OsStr::new("1")));
}

#[test]
fn test_nvenc_without_temporal_aq() {
    let source = props(Path::new("/v/in.mp4"), 1920, 1080, 12_000);
    let cmd = build_encode_cmd(
        &source,
        &capabilities(VideoEncoder::Nvenc),
        8000,
        1.25,
        Path::new("/v/in.tmp.mp4"),
    );
    assert!(!cmd.has_arg("-temporal-aq"));
    assert!(cmd.has_arg("-spatial_aq"));
}

#[test]
fn test_software_and_videotoolbox_have_no_hwaccel() {
    let source = props(Path::new("/v/in.mp4"), 1280, 720, 9_000);
    for encoder in [VideoEncoder::X265, VideoEncoder::VideoToolbox] {
        let cmd = build_encode_cmd(
            &source,
            &capabilities(encoder),
            4000,
            1.25,
            Path::new("/v/in.tmp.mp4"),
        );
        assert!(!cmd.has_arg("-hwaccel"));
        assert!(!cmd.has_arg("-maxrate:v"));
        assert_eq!(cmd.value_of("-c:v"), Some(OsStr::new(encoder.ffmpeg_name())));
        assert_eq!(cmd.value_of("-tag:v"), Some(OsStr::new("hvc1")));
    }

    let x265 = build_encode_cmd(
        &source,
        &capabilities(VideoEncoder::X265),
        4000,
        1.25,
        Path::new("/v/in.tmp.mp4"),
    );
    assert_eq!(x265.value_of("-x265-params"), Some(OsStr::new("pools=8")));
}

#[test]
fn test_color_tags_follow_source() {
    let mut source = props(Path::new("/v/in.mp4"), 3840, 2160, 50_000);
    let caps = capabilities(VideoEncoder::X265);

    let untagged = build_encode_cmd(&source, &caps, 28_000, 1.25, Path::new("/v/o.mp4"));
    assert!(!untagged.has_arg("-colorspace"));
    assert!(!untagged.has_arg("-color_primaries"));
    assert!(!untagged.has_arg("-color_trc"));

    source.color_space = Some("bt2020nc".to_string());
    source.color_primaries = Some("bt2020".to_string());
    source.color_transfer = Some("smpte2084".to_string());
    let tagged = build_encode_cmd(&source, &caps, 28_000, 1.25, Path::new("/v/o.mp4"));
    assert_eq!(tagged.value_of("-colorspace"), Some(OsStr::new("bt2020nc")));
    assert_eq!(tagged.value_of("-color_primaries"), Some(OsStr::new("bt2020")));
    assert_eq!(tagged.value_of("-color_trc"), Some(OsStr::new("smpte2084")));
}

#[test]
fn test_paths_with_spaces_stay_single_arguments() {
    let source = props(Path::new("/v/Summer Trip [2024].mp4"), 1920, 1080, 12_000);
    let output = Path::new("/v/Summer Trip [2024].tmp.mp4");
    let cmd = build_encode_cmd(
        &source,
        &capabilities(VideoEncoder::X265),
        8000,
        1.25,
        output,
    );

    assert_eq!(cmd.value_of("-i"), Some(source.path.as_os_str()));
    assert_eq!(cmd.args.last().map(|a| a.as_os_str()), Some(output.as_os_str()));
    assert_eq!(
        shlex::split(&cmd.display()).unwrap().last().map(String::as_str),
        Some("/v/Summer Trip [2024].tmp.mp4")
    );
}

#[test]
fn test_vmaf_command_orders_candidate_first() {
    let cmd = build_vmaf_cmd(
        Path::new("/v/in.mp4"),
        Path::new("/v/in.tmp.mp4"),
        Path::new("/tmp/score.json"),
        4,
    );
    let args = args_of(&cmd);

    let inputs: Vec<&String> = args
        .iter()
        .enumerate()
        .filter(|(i, _)| *i > 0 && args[i - 1] == "-i")
        .map(|(_, a)| a)
        .collect();
    assert_eq!(inputs, vec!["/v/in.tmp.mp4", "/v/in.mp4"]);

    let filter = cmd.value_of("-lavfi").unwrap().to_string_lossy().into_owned();
    assert!(filter.starts_with("libvmaf="));
    assert!(filter.contains("n_threads=4"));
    assert!(filter.contains("n_subsample=10"));
    assert!(filter.contains("log_fmt=json"));
    assert_eq!(cmd.value_of("-f"), Some(OsStr::new("null")));
}
