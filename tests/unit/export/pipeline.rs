use std::sync::Mutex;

use super::*;
use crate::export::settings::BackgroundSource;
use crate::foundation::cancel::cancel_pair;
use crate::scene::model::Waypoint;

fn background_png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 255, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn request() -> ExportRequest {
    let route = Route::new(
        "r",
        vec![Waypoint::new(2.0, 10.0), Waypoint::new(38.0, 10.0)],
    )
    .with_timing(0, 200);
    let settings = VideoSettings {
        width: 40,
        height: 20,
        fps: 10,
        ..VideoSettings::default()
    };
    ExportRequest::new(
        vec![route],
        settings,
        200,
        Some(BackgroundSource::from(background_png(40, 20))),
    )
}

struct Harness {
    input: TierInput,
    seen: Arc<Mutex<Vec<u8>>>,
    _dir: tempfile::TempDir,
}

fn harness(caps: Capabilities, config: impl FnOnce(&mut ExportConfig)) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = ExportConfig {
        output_dir: dir.path().join("out"),
        work_dir: dir.path().join("work"),
        chunk_size: 2,
        render_threads: Some(2),
        ..ExportConfig::default()
    };
    config(&mut cfg);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    Harness {
        input: TierInput {
            job_id: JobId::new(),
            request: Arc::new(request()),
            config: Arc::new(cfg),
            caps: Arc::new(caps),
            cancel: CancelToken::never(),
            progress: Arc::new(move |p| sink.lock().unwrap().push(p)),
        },
        seen,
        _dir: dir,
    }
}

fn assert_monotonic(seen: &[u8]) {
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
}

#[test]
fn frame_percent_spans_ten_to_eighty() {
    assert_eq!(frame_percent(0, 20), 10);
    assert_eq!(frame_percent(10, 20), 45);
    assert_eq!(frame_percent(20, 20), 80);
    assert_eq!(frame_percent(30, 20), 80);
    assert_eq!(frame_percent(0, 0), 80);
}

#[test]
fn manifest_reason_names_the_missing_capability() {
    assert_eq!(
        manifest_reason(&Capabilities::manifest_only()),
        "rasterizer unavailable"
    );
    assert_eq!(
        manifest_reason(&Capabilities::still_only()),
        "encoder unavailable"
    );
}

#[tokio::test]
async fn manifest_tier_writes_description() {
    let h = harness(Capabilities::manifest_only(), |_| {});
    let artifact = run_tier(Tier::Manifest, &h.input).await.unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Manifest);
    assert_eq!(artifact.path, h.input.output_path(ArtifactKind::Manifest));

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&artifact.path).unwrap()).unwrap();
    assert_eq!(json["kind"], MANIFEST_KIND);
    assert_eq!(json["version"], 1);
    assert_eq!(json["totalDurationMs"], 200);
    assert_eq!(json["easing"], "linear");
    assert_eq!(json["settings"]["width"], 40);
    assert_eq!(json["routes"][0]["id"], "r");
    assert_eq!(json["reason"], "rasterizer unavailable");
    assert_eq!(*h.seen.lock().unwrap(), vec![PROGRESS_SETUP, PROGRESS_WRITTEN]);
}

#[tokio::test]
async fn still_frame_tier_writes_png_of_output_size() {
    let h = harness(Capabilities::still_only(), |_| {});
    let artifact = run_tier(Tier::StillFrame, &h.input).await.unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Png);

    let img = image::open(&artifact.path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (40, 20));
    // Fully drawn route in the default route color over the blue background.
    let mid = img.get_pixel(20, 10).0;
    assert_ne!(mid, [0, 0, 255, 255]);
    assert_eq!(img.get_pixel(20, 1).0, [0, 0, 255, 255]);
    assert_monotonic(&h.seen.lock().unwrap());
}

#[tokio::test]
async fn unsupported_tier_is_a_capability_error() {
    let h = harness(Capabilities::still_only(), |_| {});
    let err = run_tier(Tier::RasterEncode, &h.input).await.unwrap_err();
    assert!(matches!(err, PathreelError::Capability(_)), "{err}");
    assert!(h.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_before_start() {
    let mut h = harness(Capabilities::still_only(), |_| {});
    let (handle, token) = cancel_pair();
    handle.cancel();
    h.input.cancel = token;
    let err = run_tier(Tier::StillFrame, &h.input).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(!h.input.output_path(ArtifactKind::Png).exists());
}

#[tokio::test]
async fn undecodable_background_fails_the_tier() {
    let mut h = harness(Capabilities::still_only(), |_| {});
    let mut req = request();
    req.background = Some(BackgroundSource::from(b"not an image".to_vec()));
    h.input.request = Arc::new(req);
    assert!(run_tier(Tier::StillFrame, &h.input).await.is_err());
}

#[cfg(unix)]
fn fake_encoder(dir: &Path, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("fake-encoder.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

#[cfg(unix)]
#[tokio::test]
async fn raster_encode_renders_frames_encodes_and_cleans_up() {
    let scripts = tempfile::tempdir().unwrap();
    // Writes the number of input frames into the output file (last argument).
    let program = fake_encoder(
        scripts.path(),
        r#"for a; do last="$a"; done
count=0
for a; do if [ "$prev" = "-i" ]; then pattern="$a"; fi; prev="$a"; done
for f in "$(dirname "$pattern")"/frame_*.png; do count=$((count+1)); done
echo "$count" > "$last""#,
    );
    let h = harness(Capabilities::full(program), |_| {});
    let artifact = run_tier(Tier::RasterEncode, &h.input).await.unwrap();

    assert_eq!(artifact.kind, ArtifactKind::Mp4);
    let written = std::fs::read_to_string(&artifact.path).unwrap();
    assert_eq!(written.trim(), "2", "200ms at 10fps is two frames");
    assert!(!h.input.frame_dir().exists(), "temp frames are removed");

    let seen = h.seen.lock().unwrap().clone();
    assert_monotonic(&seen);
    assert_eq!(seen.first(), Some(&PROGRESS_SETUP));
    assert_eq!(seen.last(), Some(&PROGRESS_ENCODED));
    assert!(seen.contains(&PROGRESS_FRAMES_DONE));
}

#[cfg(unix)]
#[tokio::test]
async fn encoder_failure_keeps_message_and_cleans_up() {
    let scripts = tempfile::tempdir().unwrap();
    let program = fake_encoder(scripts.path(), "echo 'codec exploded' >&2\nexit 3");
    let h = harness(Capabilities::full(program), |_| {});
    let err = run_tier(Tier::RasterEncode, &h.input).await.unwrap_err();

    assert!(matches!(err, PathreelError::Encoding(_)), "{err}");
    assert!(err.to_string().contains("codec exploded"), "{err}");
    assert!(!h.input.frame_dir().exists());
    assert!(!h.input.output_path(ArtifactKind::Mp4).exists());
}

#[cfg(unix)]
#[tokio::test]
async fn encoder_timeout_is_an_encoding_error() {
    let scripts = tempfile::tempdir().unwrap();
    let program = fake_encoder(scripts.path(), "sleep 5");
    let h = harness(Capabilities::full(program), |c| c.encoder_timeout_secs = 1);
    let err = run_tier(Tier::RasterEncode, &h.input).await.unwrap_err();
    assert!(err.to_string().contains("timed out"), "{err}");
}
