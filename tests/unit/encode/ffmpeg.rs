use super::*;

fn job(program: &str) -> EncodeJob {
    EncodeJob {
        program: program.to_string(),
        frame_pattern: PathBuf::from("/tmp/frames/frame_%06d.png"),
        fps: 30,
        format: VideoFormat::Mp4,
        quality: Quality::Medium,
        out_path: PathBuf::from("/tmp/out/clip.mp4"),
        timeout: Duration::from_secs(5),
    }
}

fn as_strings(args: Vec<OsString>) -> Vec<String> {
    args.into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn crf_table() {
    assert_eq!(Quality::Low.crf(VideoFormat::Mp4), 28);
    assert_eq!(Quality::Medium.crf(VideoFormat::Mp4), 23);
    assert_eq!(Quality::High.crf(VideoFormat::Mp4), 18);
    assert_eq!(Quality::Low.crf(VideoFormat::Webm), 40);
    assert_eq!(Quality::Medium.crf(VideoFormat::Webm), 32);
    assert_eq!(Quality::High.crf(VideoFormat::Webm), 24);
}

#[test]
fn mp4_args_read_the_png_sequence() {
    let args = as_strings(job("ffmpeg").args());
    let joined = args.join(" ");
    assert!(joined.starts_with("-y -loglevel error -framerate 30 -start_number 0 -i "));
    assert!(joined.contains("frame_%06d.png"));
    assert!(joined.contains("-c:v libx264 -pix_fmt yuv420p -crf 23 -movflags +faststart"));
    assert_eq!(args.last().map(String::as_str), Some("/tmp/out/clip.mp4"));
}

#[test]
fn webm_args_use_vp9() {
    let mut j = job("ffmpeg");
    j.format = VideoFormat::Webm;
    j.quality = Quality::High;
    let joined = as_strings(j.args()).join(" ");
    assert!(joined.contains("-c:v libvpx-vp9 -pix_fmt yuv420p -crf 24 -b:v 0"));
}

#[test]
fn format_metadata() {
    assert_eq!(VideoFormat::Mp4.extension(), "mp4");
    assert_eq!(VideoFormat::Webm.content_type(), "video/webm");
    assert_eq!(
        serde_json::from_str::<VideoFormat>("\"webm\"").unwrap(),
        VideoFormat::Webm
    );
    assert_eq!(serde_json::to_string(&Quality::High).unwrap(), "\"high\"");
}

#[test]
fn validation_catches_bad_values() {
    let mut j = job("ffmpeg");
    j.fps = 0;
    assert!(j.validate().is_err());
    assert!(job("  ").validate().is_err());
    let mut j = job("ffmpeg");
    j.timeout = Duration::ZERO;
    assert!(j.validate().is_err());
}

#[test]
fn missing_program_is_not_available() {
    assert!(!is_encoder_available("pathreel-no-such-encoder"));
}

#[tokio::test]
async fn spawn_failure_is_an_encoding_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut j = job("pathreel-no-such-encoder");
    j.out_path = dir.path().join("out.mp4");
    let err = run_encoder(&j, &CancelToken::never()).await.unwrap_err();
    assert!(matches!(err, PathreelError::Encoding(_)), "{err}");
}

#[test]
fn ensure_parent_dir_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("c.mp4");
    ensure_parent_dir(&path).unwrap();
    assert!(dir.path().join("a").join("b").is_dir());
}
