//! Lifecycle integration tests for the preview bridge.
//!
//! Every test runs the bridge headless: `RecordingBackend` stands in for the
//! GL context and `LoopbackPlatform` for the camera surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use campreview::*;
use proptest::prelude::*;

fn preview() -> HeadlessPreview {
    init_logging();
    HeadlessPreview::new(RecordingBackend::new(), LoopbackPlatform::new())
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + Clone + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    (count, move || {
        c.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn end_to_end_draws_once_then_only_clears_after_detach() {
    let mut p = preview();
    p.on_render_surface_ready().unwrap();
    let texture = p.texture().unwrap();

    let provided = p
        .attach_frame_producer(SurfaceRequest::new(1280, 720))
        .unwrap();
    assert_eq!(provided.resolution, Resolution::new(1280, 720));
    assert_eq!(p.state(), BridgeState::ProducerAttached);

    provided
        .endpoint
        .publish_frame(CoordinateTransform::IDENTITY)
        .unwrap();
    assert!(p.take_render_request());

    p.backend_mut().clear_calls();
    assert_eq!(p.on_render_frame().unwrap(), FrameOutcome::Drawn);

    let draws = p.backend().draw_calls();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].texture, Some(texture));
    assert_eq!(draws[0].count, 6);

    provided.completion.complete(SurfaceResult::UsedSuccessfully);
    p.backend_mut().clear_calls();
    for _ in 0..3 {
        assert_eq!(p.on_render_frame().unwrap(), FrameOutcome::Cleared);
    }
    assert_eq!(p.state(), BridgeState::ProducerDetached);
    assert_eq!(p.backend().draw_count(), 0);
    assert_eq!(p.backend().clear_count(), 3);
}

#[test]
fn render_without_producer_only_clears() {
    let mut p = preview();
    p.on_render_surface_ready().unwrap();
    p.backend_mut().clear_calls();

    assert_eq!(p.on_render_frame().unwrap(), FrameOutcome::Cleared);
    assert_eq!(p.backend().draw_count(), 0);
    assert_eq!(
        p.backend().calls(),
        &[GlCall::Clear(ClearColor::WHITE)][..]
    );
}

#[test]
fn render_before_surface_ready_does_not_draw() {
    let mut p = preview();
    assert_eq!(p.on_render_frame().unwrap(), FrameOutcome::Cleared);
    assert_eq!(p.backend().draw_count(), 0);
}

#[test]
fn attach_before_surface_ready_always_fails() {
    let mut p = preview();
    for _ in 0..5 {
        let err = p
            .attach_frame_producer(SurfaceRequest::new(1280, 720))
            .unwrap_err();
        assert!(matches!(err, PreviewError::SurfaceNotReady));
        assert!(err.to_string().contains("before the preview surface was created"));
    }
    assert_eq!(p.state(), BridgeState::NoSurface);
    assert_eq!(p.platform().surfaces_created(), 0);
}

#[test]
fn texture_is_stable_across_attach_cycles() {
    let mut p = preview();
    p.on_render_surface_ready().unwrap();
    let texture = p.texture().unwrap();

    for cycle in 0..4 {
        let provided = p
            .attach_frame_producer(SurfaceRequest::new(640, 480))
            .unwrap();
        assert_eq!(provided.endpoint.texture(), texture, "cycle {cycle}");
        provided
            .endpoint
            .publish_frame(CoordinateTransform::IDENTITY)
            .unwrap();
        assert_eq!(p.on_render_frame().unwrap(), FrameOutcome::Drawn);

        provided.completion.complete(SurfaceResult::UsedSuccessfully);
        p.process_completions();
        assert!(provided.endpoint.is_released());
        assert_eq!(p.texture(), Some(texture));
    }

    assert_eq!(p.backend().live_texture_count(), 1);
    assert_eq!(p.frames_drawn(), 4);
}

#[test]
fn attribute_streams_disabled_after_each_frame() {
    let mut p = preview();
    p.on_render_surface_ready().unwrap();
    let provided = p
        .attach_frame_producer(SurfaceRequest::new(1280, 720))
        .unwrap();

    for _ in 0..3 {
        provided
            .endpoint
            .publish_frame(CoordinateTransform::IDENTITY)
            .unwrap();
        p.on_render_frame().unwrap();
        assert!(!p.backend().is_vertex_attrib_enabled(0));
        assert!(!p.backend().is_vertex_attrib_enabled(1));
    }
}

#[test]
fn ready_notification_fires_exactly_once() {
    let mut p = preview();
    let (count, listener) = counter();
    p.on_preview_ready(listener);
    assert_eq!(count.load(Ordering::SeqCst), 0);

    p.on_render_surface_ready().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    p.on_render_surface_ready().unwrap();
    p.on_render_frame().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn late_ready_listener_runs_immediately() {
    let mut p = preview();
    p.on_render_surface_ready().unwrap();
    let (count, listener) = counter();
    p.on_preview_ready(listener);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn frames_request_renders_through_wake_hook() {
    let (wakes, wake) = counter();
    let mut p = HeadlessPreview::new(RecordingBackend::new(), LoopbackPlatform::new())
        .with_render_request(RenderRequest::with_wake_hook(wake));
    p.on_render_surface_ready().unwrap();
    let provided = p
        .attach_frame_producer(SurfaceRequest::new(1280, 720))
        .unwrap();

    // Three frames before the tick coalesce into one wake and one draw.
    for _ in 0..3 {
        provided
            .endpoint
            .publish_frame(CoordinateTransform::IDENTITY)
            .unwrap();
    }
    assert_eq!(wakes.load(Ordering::SeqCst), 1);
    assert!(p.take_render_request());
    p.on_render_frame().unwrap();
    assert!(!p.take_render_request());

    assert_eq!(p.backend().draw_count(), 1);
    assert_eq!(provided.endpoint.stats().dropped, 2);
}

#[test]
fn producer_thread_publishes_and_completes() {
    let mut p = preview();
    p.on_render_surface_ready().unwrap();
    let ProvidedSurface {
        endpoint,
        completion,
        ..
    } = p
        .attach_frame_producer(SurfaceRequest::new(1920, 1080))
        .unwrap();

    let producer = std::thread::spawn(move || {
        for _ in 0..10 {
            endpoint
                .publish_frame(CoordinateTransform::IDENTITY)
                .unwrap();
        }
        completion.complete(SurfaceResult::UsedSuccessfully);
        endpoint
    });
    let endpoint = producer.join().unwrap();

    assert!(p.take_render_request());
    assert_eq!(p.on_render_frame().unwrap(), FrameOutcome::Cleared);
    assert_eq!(p.state(), BridgeState::ProducerDetached);
    assert!(endpoint.is_released());
}

#[test]
fn ignore_mode_draws_static_coords_despite_transform() {
    let mut p = preview();
    p.on_render_surface_ready().unwrap();
    let provided = p
        .attach_frame_producer(SurfaceRequest::new(1280, 720))
        .unwrap();
    let rotate = CoordinateTransform::from(Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2));
    provided.endpoint.publish_frame(rotate).unwrap();
    p.on_render_frame().unwrap();

    let draw = p.backend().draw_calls()[0].clone();
    let coords = draw.attributes[1].1.unwrap();
    assert_eq!(
        p.backend().buffer_f32s(coords),
        Some(geometry::QUAD_TEX_COORDS.to_vec())
    );
}

#[test]
fn apply_mode_from_options_draws_transformed_coords() {
    let options = PreviewOptions::from_json_str(r#"{ "transform_mode": "apply" }"#).unwrap();
    let mut p = preview().with_options(options);
    p.on_render_surface_ready().unwrap();
    let provided = p
        .attach_frame_producer(SurfaceRequest::new(1280, 720))
        .unwrap();

    // v' = 1 - v
    let flip = CoordinateTransform::from_cols_array(&[
        1.0, 0.0, 0.0, 0.0, //
        0.0, -1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, 1.0,
    ]);
    provided.endpoint.publish_frame(flip).unwrap();
    p.on_render_frame().unwrap();

    let draw = p.backend().draw_calls()[0].clone();
    let coords = draw.attributes[1].1.unwrap();
    assert_eq!(
        p.backend().buffer_f32s(coords),
        Some(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0])
    );
}

#[test]
fn surface_recreation_replaces_texture() {
    let mut p = preview();
    p.on_render_surface_ready().unwrap();
    let first = p.texture().unwrap();
    p.on_render_surface_destroyed();
    assert_eq!(p.state(), BridgeState::NoSurface);

    p.on_render_surface_ready().unwrap();
    let second = p.texture().unwrap();
    assert_ne!(first, second);
    assert!(!p.backend().is_live_texture(first));
    assert_eq!(p.backend().live_texture_count(), 1);
}

#[test]
fn texture_uses_configured_filters() {
    let mut p = preview();
    p.on_render_surface_ready().unwrap();
    let texture = p.texture().unwrap();
    assert!(p.backend().calls().contains(&GlCall::CreateExternalTexture {
        texture,
        min_filter: TextureFilter::Nearest,
        mag_filter: TextureFilter::Linear,
    }));
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Attach,
    Publish,
    CompleteUsed,
    CompleteCancelled,
    Tick,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Attach),
        Just(Step::Publish),
        Just(Step::CompleteUsed),
        Just(Step::CompleteCancelled),
        Just(Step::Tick),
    ]
}

proptest! {
    #[test]
    fn texture_stable_for_any_attach_sequence(steps in prop::collection::vec(step(), 1..40)) {
        let mut p = preview();
        p.on_render_surface_ready().unwrap();
        let texture = p.texture().unwrap();
        let mut current: Option<(LoopbackProducer, Option<SurfaceCompletion>)> = None;
        let mut endpoints = Vec::new();

        for step in steps {
            match step {
                Step::Attach => {
                    // Attaching while attached replaces the previous surface.
                    let provided = p
                        .attach_frame_producer(SurfaceRequest::new(640, 480))
                        .unwrap();
                    prop_assert_eq!(provided.endpoint.texture(), texture);
                    endpoints.push(provided.endpoint.clone());
                    current = Some((provided.endpoint, Some(provided.completion)));
                }
                Step::Publish => {
                    if let Some((endpoint, _)) = &current {
                        // Fails with SurfaceReleased once the surface is gone.
                        let _ = endpoint.publish_frame(CoordinateTransform::IDENTITY);
                    }
                }
                Step::CompleteUsed | Step::CompleteCancelled => {
                    let result = match step {
                        Step::CompleteUsed => SurfaceResult::UsedSuccessfully,
                        _ => SurfaceResult::RequestCancelled,
                    };
                    if let Some(completion) = current.as_mut().and_then(|(_, c)| c.take()) {
                        completion.complete(result);
                    }
                }
                Step::Tick => {
                    p.backend_mut().clear_calls();
                    let outcome = p.on_render_frame().unwrap();
                    prop_assert_eq!(
                        outcome == FrameOutcome::Drawn,
                        p.state() == BridgeState::ProducerAttached
                    );
                    prop_assert!(p.backend().draw_count() <= 1);
                    prop_assert!(p.backend().enabled_attributes().is_empty());
                }
            }
            prop_assert_eq!(p.texture(), Some(texture));
            prop_assert_eq!(p.backend().live_texture_count(), 1);
        }

        p.on_render_surface_destroyed();
        prop_assert_eq!(p.state(), BridgeState::NoSurface);
        prop_assert_eq!(p.backend().live_texture_count(), 0);
        prop_assert_eq!(p.backend().live_program_count(), 0);
        prop_assert_eq!(p.backend().live_buffer_count(), 0);
        prop_assert!(endpoints.iter().all(LoopbackProducer::is_released));
    }
}
