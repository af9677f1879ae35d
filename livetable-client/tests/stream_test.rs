use std::path::Path;
use std::time::Duration;

use image::{ImageBuffer, Luma, Rgb, RgbImage};
use livetable_client::commands;
use livetable_client::{Config, DirectorySource, StreamSession};
use livetable_hand_detector::{HandDetector, Homography};
use livetable_shared::{FrameWithHands, Size};

/// Dark forearm entering a bright table from the left
fn arm_image() -> RgbImage {
    let mut img = RgbImage::from_pixel(200, 150, Rgb([230, 230, 230]));
    for y in 60..90 {
        for x in 0..130 {
            img.put_pixel(x, y, Rgb([50, 40, 40]));
        }
    }
    img
}

/// Bright screen rectangle on a dark wall
fn screen_image() -> RgbImage {
    let mut img = RgbImage::from_pixel(400, 300, Rgb([20, 20, 20]));
    for y in 60..240 {
        for x in 80..320 {
            img.put_pixel(x, y, Rgb([240, 240, 240]));
        }
    }
    img
}

fn save(img: &RgbImage, path: &Path) {
    img.save(path).unwrap();
}

#[tokio::test]
async fn test_stream_over_directory() {
    let dir = tempfile::tempdir().unwrap();
    save(&arm_image(), &dir.path().join("frame-000.png"));
    save(
        &RgbImage::from_pixel(200, 150, Rgb([230, 230, 230])),
        &dir.path().join("frame-001.png"),
    );
    save(&arm_image(), &dir.path().join("frame-002.png"));

    let mut source = DirectorySource::open(dir.path()).unwrap();
    let session = StreamSession::new("dir", HandDetector::new(), Duration::from_millis(1));

    let mut results: Vec<FrameWithHands> = Vec::new();
    let summary = session
        .run(&mut source, |result| {
            results.push(result.clone());
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.skipped, 0);
    let counts: Vec<usize> = results.iter().map(|r| r.hands.len()).collect();
    assert_eq!(counts, vec![1, 0, 1]);
    assert_eq!(results[0].image_size.width, 200);
}

#[tokio::test]
async fn test_mismatched_depth_map_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    save(&arm_image(), &dir.path().join("a.png"));
    let depth: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_pixel(20, 15, Luma([900]));
    depth.save(dir.path().join("a.depth.png")).unwrap();
    save(&arm_image(), &dir.path().join("b.png"));

    let mut source = DirectorySource::open(dir.path()).unwrap();
    let session = StreamSession::new("depth", HandDetector::new(), Duration::from_millis(1));
    let summary = session.run(&mut source, |_| Ok(())).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.frames, 1);
    assert_eq!(summary.hands, 1);
}

#[test]
fn test_hands_command_on_saved_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arm.png");
    save(&arm_image(), &path);

    let result =
        commands::hands(&Config::default(), &path, None, None, Homography::identity()).unwrap();
    assert_eq!(result.hands.len(), 1);
    assert!(result.hands[0].palm_center.x < 140);
}

#[test]
fn test_hands_command_missing_image() {
    let err = commands::hands(
        &Config::default(),
        Path::new("/nonexistent/frame.png"),
        None,
        None,
        Homography::identity(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("Failed to read image"));
}

#[test]
fn test_corners_and_warp_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("screen.png");
    save(&screen_image(), &path);

    let mut config = Config::default();
    config.screen.hough_threshold = 100;

    let response = commands::corners(&config, &path).unwrap().unwrap();
    assert_eq!(response.size, Size::new(400, 300));
    assert!((response.corners.top_left.x - 80.0).abs() < 4.0);
    assert!((response.corners.bottom_right.y - 240.0).abs() < 4.0);

    let projection = commands::projection(&config, &path, Size::new(240, 180)).unwrap();
    let h = Homography::from_row_major(projection.projection);
    assert!(!h.is_identity());

    let output = dir.path().join("warped.png");
    commands::warp(&path, &h, Size::new(240, 180), &output).unwrap();
    let warped = image::open(&output).unwrap().to_rgb8();
    assert_eq!(warped.dimensions(), (240, 180));
    assert!(warped.get_pixel(120, 90).0[0] > 200);
}
