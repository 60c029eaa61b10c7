#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]
//! Frame capture and screenshot export

use eink_emulator::Emulator;
use eink_specs::displays::WAVESHARE_2_13_V4;
use platform::{ClearPattern, PanelDriver};

#[test]
fn every_refresh_is_captured_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut panel = Emulator::new(&WAVESHARE_2_13_V4)
        .with_frame_dir(dir.path())
        .unwrap();
    let frame = vec![0xFF; panel.buffer_len()];

    panel.init_full().unwrap();
    panel.clear(ClearPattern::White).unwrap();
    panel.display_set_base(&frame).unwrap();
    panel.init_partial().unwrap();
    panel.display_partial(&frame).unwrap();

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "frame-00000-full.png",
            "frame-00001-full.png",
            "frame-00002-partial.png",
        ]
    );

    let img = image::open(dir.path().join("frame-00002-partial.png"))
        .unwrap()
        .to_luma8();
    assert_eq!(img.dimensions(), (122, 250));
}

#[test]
fn screenshot_matches_glass() {
    let dir = tempfile::tempdir().unwrap();
    let mut panel = Emulator::new(&WAVESHARE_2_13_V4);
    panel.init_full().unwrap();
    panel.clear(ClearPattern::Black).unwrap();

    let path = dir.path().join("shot.png");
    panel.screenshot(&path).unwrap();
    let img = image::open(&path).unwrap().to_luma8();
    assert!(img.pixels().all(|p| p.0[0] == 0));
}
