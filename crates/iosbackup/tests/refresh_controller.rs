#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]
//! Refresh controller against the recording mock and the emulator.
//!
//! Run with: cargo test -p iosbackup --test refresh_controller

use std::time::Duration;

use eink_canvas::{LogicalCanvas, Orientation, PhysicalFrame};
use eink_emulator::{ControllerState, Emulator};
use eink_specs::displays::WAVESHARE_2_13_V4;
use embedded_graphics::geometry::Size;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use iosbackup::display::RefreshMode;
use iosbackup::{RefreshController, RefreshIntent, RefreshKind, RefreshSettings};
use platform::mocks::{MockPanel, PanelCall};
use platform::ClearPattern;
use proptest::prelude::*;

fn settings(threshold: u32) -> RefreshSettings {
    RefreshSettings {
        partial_reset_threshold: threshold,
        busy_backoff: Duration::ZERO,
        ..RefreshSettings::default()
    }
}

fn physical() -> Size {
    Size::new(WAVESHARE_2_13_V4.width, WAVESHARE_2_13_V4.height)
}

/// A landscape frame with a bar `fill` pixels wide
fn bar_frame(fill: u32) -> PhysicalFrame {
    let mut canvas = LogicalCanvas::new(physical(), Orientation::LandscapeRight);
    Rectangle::new(Point::new(4, 46), Size::new(fill.max(1), 18))
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(&mut canvas)
        .unwrap();
    canvas.to_physical(physical())
}

// ---------------------------------------------------------------------------
// Forced full refresh after the partial budget
// ---------------------------------------------------------------------------

#[test]
fn test_fourth_call_is_full_with_threshold_three() {
    let panel = MockPanel::new(122, 250);
    let mut ctl = RefreshController::new(panel.clone(), settings(3));

    for i in 1..=3 {
        assert_eq!(
            ctl.show(&bar_frame(i * 10), RefreshIntent::Partial),
            Ok(RefreshKind::Partial),
            "call {i} should be partial"
        );
    }
    assert_eq!(ctl.state().partial_count, 3);

    assert_eq!(ctl.show(&bar_frame(40), RefreshIntent::Partial), Ok(RefreshKind::Full));
    let state = ctl.state();
    assert_eq!(state.partial_count, 0);
    assert!(!state.partial_base_committed);
    assert_eq!(state.mode, RefreshMode::Full);

    assert_eq!(
        panel.display_calls(),
        vec![
            PanelCall::DisplaySetBase,
            PanelCall::DisplayPartial,
            PanelCall::DisplayPartial,
            PanelCall::DisplayPartial,
            PanelCall::DisplayFull,
        ]
    );
}

#[test]
fn test_partial_after_forced_full_rebuilds_base() {
    let panel = MockPanel::new(122, 250);
    let mut ctl = RefreshController::new(panel.clone(), settings(1));
    ctl.show(&bar_frame(10), RefreshIntent::Partial).unwrap();
    assert_eq!(ctl.show(&bar_frame(20), RefreshIntent::Partial), Ok(RefreshKind::Full));
    assert_eq!(ctl.show(&bar_frame(30), RefreshIntent::Partial), Ok(RefreshKind::Partial));
    assert_eq!(panel.count(PanelCall::DisplaySetBase), 2);
}

#[test]
fn test_primed_base_makes_first_content_partial() {
    let panel = MockPanel::new(122, 250);
    let mut ctl = RefreshController::new(panel.clone(), settings(100));
    ctl.prime_partial_base(&PhysicalFrame::blank(physical())).unwrap();
    assert_eq!(ctl.show(&bar_frame(50), RefreshIntent::Auto), Ok(RefreshKind::Partial));
    assert_eq!(
        panel.calls(),
        vec![
            PanelCall::InitFull,
            PanelCall::Clear(ClearPattern::White),
            PanelCall::DisplaySetBase,
            PanelCall::InitPartial,
            PanelCall::DisplayPartial,
        ]
    );
    assert_eq!(panel.count(PanelCall::DisplayFull), 0);
}

// ---------------------------------------------------------------------------
// Emulator
// ---------------------------------------------------------------------------

#[test]
fn test_emulator_accepts_the_controller_sequence() {
    let mut ctl = RefreshController::new(Emulator::new(&WAVESHARE_2_13_V4), settings(3));
    for fill in [10, 20, 30, 40, 50] {
        ctl.show(&bar_frame(fill), RefreshIntent::Partial).unwrap();
    }
    let stats = ctl.panel().stats().clone();
    // Clear, base + 3 partials, forced full, base again + 1 partial.
    // The emulator counts clears and base commits as full refreshes.
    assert_eq!(stats.partial_refresh_count, 4);
    assert_eq!(stats.base_commit_count, 2);
    assert_eq!(stats.clear_count, 1);
    assert_eq!(stats.full_refresh_count, 4);
    assert!(ctl.panel().glass().ink_count() > 0);
}

#[test]
fn test_emulator_busy_transport_is_retried_once() {
    let mut panel = Emulator::new(&WAVESHARE_2_13_V4);
    panel.contend_transport(1);
    let mut ctl = RefreshController::new(panel, settings(100));
    assert_eq!(ctl.show(&bar_frame(10), RefreshIntent::Full), Ok(RefreshKind::Full));
    assert_eq!(ctl.panel().stats().release_count, 1);
}

#[test]
fn test_emulator_busy_twice_fails() {
    let mut panel = Emulator::new(&WAVESHARE_2_13_V4);
    panel.contend_transport(2);
    let mut ctl = RefreshController::new(panel, settings(100));
    assert!(ctl.show(&bar_frame(10), RefreshIntent::Full).is_err());
    assert_eq!(ctl.state().mode, RefreshMode::Uninitialized);
}

#[test]
fn test_shutdown_leaves_emulator_released() {
    let mut ctl = RefreshController::new(Emulator::new(&WAVESHARE_2_13_V4), settings(100));
    ctl.show(&bar_frame(10), RefreshIntent::Full).unwrap();
    ctl.shutdown();
    ctl.shutdown();
    let panel = ctl.panel();
    assert_eq!(panel.state(), ControllerState::Released);
    assert_eq!(panel.stats().sleep_count, 1);
    assert_eq!(panel.stats().release_count, 1);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn intent() -> impl Strategy<Value = RefreshIntent> {
    prop_oneof![
        Just(RefreshIntent::Full),
        Just(RefreshIntent::Partial),
        Just(RefreshIntent::Auto),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_partial_budget_and_base_hold(
        threshold in 1u32..6,
        intents in proptest::collection::vec(intent(), 1..40),
    ) {
        let panel = MockPanel::new(122, 250);
        let mut ctl = RefreshController::new(panel.clone(), settings(threshold));
        let frame = PhysicalFrame::blank(physical());

        for intent in intents {
            let kind = ctl.show(&frame, intent).unwrap();
            let state = ctl.state();
            prop_assert!(state.partial_count <= threshold);
            if intent == RefreshIntent::Full {
                prop_assert_eq!(kind, RefreshKind::Full);
            }
            if kind == RefreshKind::Full {
                prop_assert!(!state.partial_base_committed);
            }
        }

        // Every partial draws on a base committed since the last full refresh.
        let mut base = false;
        for call in panel.display_calls() {
            match call {
                PanelCall::DisplayFull => base = false,
                PanelCall::DisplaySetBase => base = true,
                PanelCall::DisplayPartial => prop_assert!(base),
                _ => {}
            }
        }
    }
}
