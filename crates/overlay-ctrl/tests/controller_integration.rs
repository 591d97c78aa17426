//! Integration tests for the pipe controller.
//!
//! These tests exercise the controller end-to-end against the in-memory
//! `MockDisplay`: configuration setters, commit with rollback, read-back and
//! the close sequence.

use std::sync::Arc;

use overlay_core::{Dim, MdpFlags, PipeArgs, PipeConfiguration, PipeId, PixelFormat, Transform, Whf};
use overlay_ctrl::infrastructure::controller_with_opener;
use overlay_ctrl::infrastructure::device::{DeviceCall, MockDisplay};
use overlay_ctrl::infrastructure::storage::config::OverlayConfig;
use overlay_ctrl::{OverlayError, PipeController, DEFAULT_MAGNIFICATION_LIMIT};

fn open_controller(display: &Arc<MockDisplay>) -> PipeController {
    let mut ctrl = PipeController::new(display.clone(), DEFAULT_MAGNIFICATION_LIMIT);
    ctrl.init(0).expect("init must succeed on mock display");
    ctrl
}

fn video_args() -> PipeArgs {
    PipeArgs {
        whf: Whf::new(1280, 720, PixelFormat::Y_CBCR_H2V2),
        flags: MdpFlags(0),
        z_order: 1,
        wait: true,
        is_fg: false,
    }
}

#[test]
fn test_commit_then_get_round_trips_configuration() {
    // Arrange
    let display = Arc::new(MockDisplay::new());
    let mut ctrl = open_controller(&display);
    ctrl.set_source(video_args());
    ctrl.set_crop(Dim::new(0, 0, 1280, 720));
    ctrl.set_transform(Transform::Identity, false);
    ctrl.set_position(Dim::new(0, 0, 1920, 1080), 1920, 1080)
        .expect("position");

    // Act
    ctrl.commit().expect("commit");
    let committed = ctrl.config().clone();
    ctrl.get().expect("get");

    // Assert
    assert_eq!(ctrl.config(), &committed);
    assert!(ctrl.is_active());
}

#[test]
fn test_rejected_commit_restores_previous_commit() {
    // Arrange
    let display = Arc::new(MockDisplay::new());
    let mut ctrl = open_controller(&display);
    ctrl.set_source(video_args());
    ctrl.set_crop(Dim::new(0, 0, 1280, 720));
    ctrl.commit().expect("first commit");
    let good = ctrl.config().clone();

    // Act: crop past the buffer edge is refused by the device
    ctrl.set_crop(Dim::new(100, 0, 1280, 720));
    let result = ctrl.commit();

    // Assert
    assert!(matches!(
        result,
        Err(OverlayError::DeviceRejectedConfig { .. })
    ));
    assert_eq!(ctrl.config(), &good);
    assert_eq!(ctrl.last_known_good(), &good);
}

#[test]
fn test_rejected_first_commit_returns_to_reset_state() {
    let display = Arc::new(MockDisplay::new());
    let mut ctrl = open_controller(&display);
    display.reject_commits(true);
    ctrl.set_source(video_args());

    assert!(ctrl.commit().is_err());
    assert_eq!(ctrl.config(), &PipeConfiguration::default());
    assert_eq!(ctrl.id(), PipeId::Unassigned);
}

#[test]
fn test_second_commit_reuses_assigned_slot() {
    let display = Arc::new(MockDisplay::new());
    let mut ctrl = open_controller(&display);
    ctrl.set_source(video_args());
    ctrl.commit().expect("commit");
    let id = ctrl.id();

    ctrl.set_z(2);
    ctrl.commit().expect("recommit");

    assert_eq!(ctrl.id(), id);
    assert_eq!(display.overlay_count(), 1);
}

#[test]
fn test_close_issues_unset_then_close_and_resets() {
    // Arrange
    let display = Arc::new(MockDisplay::new());
    let mut ctrl = open_controller(&display);
    ctrl.set_source(video_args());
    ctrl.commit().expect("commit");
    let PipeId::Assigned(id) = ctrl.id() else {
        panic!("commit must assign an id");
    };
    display.clear_calls();

    // Act
    ctrl.close().expect("close");

    // Assert
    assert_eq!(display.calls(), vec![DeviceCall::Unset(id), DeviceCall::Close]);
    assert_eq!(ctrl.config(), &PipeConfiguration::default());
    assert_eq!(display.open_handles(), 0);
    assert_eq!(display.overlay_count(), 0);
}

#[test]
fn test_close_after_failed_unset_can_be_retried() {
    let display = Arc::new(MockDisplay::new());
    let mut ctrl = open_controller(&display);
    ctrl.set_source(video_args());
    ctrl.commit().expect("commit");

    display.fail_unset(true);
    assert!(matches!(ctrl.close(), Err(OverlayError::Io { op: "unset", .. })));
    assert!(ctrl.is_open());

    display.fail_unset(false);
    ctrl.close().expect("retry");
    assert!(!ctrl.is_open());
}

#[test]
fn test_close_on_reset_controller_makes_no_device_call() {
    let display = Arc::new(MockDisplay::new());
    let mut ctrl = open_controller(&display);
    display.clear_calls();

    ctrl.close().expect("close");

    assert!(display.calls().is_empty());
}

#[test]
fn test_init_failure_makes_handle_operations_fail_with_io() {
    // Arrange
    let display = Arc::new(MockDisplay::new());
    display.fail_open(true);
    let mut ctrl = PipeController::new(display.clone(), DEFAULT_MAGNIFICATION_LIMIT);

    // Act
    let init = ctrl.init(0);

    // Assert
    assert!(matches!(init, Err(OverlayError::Io { op: "open", .. })));
    assert!(matches!(ctrl.screen_info(), Err(OverlayError::Io { .. })));
    assert!(matches!(ctrl.get(), Err(OverlayError::Io { .. })));
    assert!(matches!(ctrl.commit(), Err(OverlayError::Io { .. })));
    assert_eq!(display.calls(), vec![DeviceCall::Open(0)]);
}

#[test]
fn test_reinit_with_active_pipe_is_refused_and_keeps_the_pipe() {
    // Arrange
    let display = Arc::new(MockDisplay::new());
    let mut ctrl = open_controller(&display);
    ctrl.set_source(video_args());
    ctrl.commit().expect("commit");
    let id = ctrl.id();
    display.clear_calls();

    // Act
    let result = ctrl.init(0);

    // Assert
    assert!(matches!(result, Err(OverlayError::Io { op: "open", .. })));
    assert!(display.calls().is_empty());
    assert_eq!(display.open_handles(), 1);
    assert_eq!(display.overlay_count(), 1);
    assert_eq!(ctrl.id(), id);

    ctrl.close().expect("close");
    ctrl.init(0).expect("init after close");
    assert_eq!(display.open_handles(), 1);
}

#[test]
fn test_screen_info_feeds_set_position() {
    let display = Arc::new(MockDisplay::with_screen(1024, 600, 32));
    let mut ctrl = open_controller(&display);
    ctrl.set_source(video_args());
    ctrl.set_crop(Dim::new(0, 0, 40, 30));

    let screen = ctrl.screen_info().expect("screen info");
    ctrl.set_position(Dim::new(0, 0, 1024, 600), screen.width, screen.height)
        .expect("position");

    // 40 × 20 = 800 wide, recentred; 30 × 20 = 600 fits
    assert_eq!(screen.stride, 4096);
    assert_eq!(ctrl.dst_rect(), Dim::new(112, 0, 800, 600));
    ctrl.commit().expect("commit");
}

#[test]
fn test_screen_info_failure_returns_io_error() {
    let display = Arc::new(MockDisplay::new());
    let ctrl = open_controller(&display);
    display.fail_screen_info(true);

    assert!(matches!(ctrl.screen_info(), Err(OverlayError::Io { .. })));
}

#[test]
fn test_rotated_tiled_source_commits_with_rotator_geometry() {
    // Arrange
    let display = Arc::new(MockDisplay::new());
    let mut ctrl = open_controller(&display);
    ctrl.set_source(PipeArgs {
        whf: Whf::new(120, 70, PixelFormat::Y_CBCR_H2V2_TILE),
        ..video_args()
    });
    ctrl.set_crop(Dim::new(0, 0, 120, 70));

    // Act
    ctrl.set_transform_bits(Transform::Rotate90.hal_bits(), true)
        .expect("transform");
    ctrl.set_position(Dim::new(0, 0, 700, 1000), 1920, 1080)
        .expect("position");
    ctrl.commit().expect("commit");

    // Assert: aligned 128×96 then swapped; crop x = 96 - 0 - 70
    let PipeId::Assigned(id) = ctrl.id() else {
        panic!("commit must assign an id");
    };
    let stored = display.overlay(id).expect("stored overlay");
    assert_eq!(stored.src, Whf::new(96, 128, PixelFormat::Y_CBCR_H2V2));
    assert_eq!(stored.src_rect, Dim::new(26, 0, 70, 120));
    assert!(stored.flags.contains(MdpFlags::SOURCE_ROTATED_90));
}

#[test]
fn test_controller_from_config_uses_configured_limit() {
    let display = Arc::new(MockDisplay::new());
    let mut cfg = OverlayConfig::default();
    cfg.limits.magnification_limit = 2;
    let mut ctrl = controller_with_opener(display.clone(), &cfg);
    ctrl.set_crop(Dim::new(0, 0, 100, 100));

    ctrl.set_position(Dim::new(0, 0, 1000, 150), 1920, 1080)
        .expect("position");

    assert_eq!(ctrl.magnification_limit(), 2);
    assert_eq!(ctrl.dst_rect(), Dim::new(860, 0, 200, 150));
}
