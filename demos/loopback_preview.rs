//! Headless walk through the preview lifecycle.
//!
//! A producer thread publishes frames into a loopback surface while the main
//! thread plays the windowing host's render loop. Run with
//! `RUST_LOG=debug cargo run --example loopback_preview`.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use campreview::*;

fn main() -> Result<()> {
    init_logging();

    let options = match std::env::args().nth(1) {
        Some(path) => PreviewOptions::load(path)?,
        None => PreviewOptions::default(),
    };

    // The wake hook stands in for the host's "request render" call.
    let (wake_tx, wake_rx) = mpsc::channel::<()>();
    let request = RenderRequest::with_wake_hook(move || {
        let _ = wake_tx.send(());
    });

    let mut preview = HeadlessPreview::new(RecordingBackend::new(), LoopbackPlatform::new())
        .with_options(options)
        .with_render_request(request);
    preview.on_preview_ready(|| log::info!("preview ready"));

    preview.on_render_surface_ready()?;
    preview.on_render_surface_changed(1280, 720);

    let ProvidedSurface {
        endpoint,
        completion,
        resolution,
    } = preview.attach_frame_producer(SurfaceRequest::new(1280, 720))?;
    log::info!("camera writing at {resolution}");

    let producer = thread::spawn(move || -> Result<LoopbackStats> {
        for _ in 0..30 {
            endpoint.publish_frame(CoordinateTransform::IDENTITY)?;
            thread::sleep(Duration::from_millis(5));
        }
        completion.complete(SurfaceResult::UsedSuccessfully);
        Ok(endpoint.stats())
    });

    // Demand-driven loop: tick only when a frame asked for it.
    while preview.state() != BridgeState::ProducerDetached {
        if wake_rx.recv_timeout(Duration::from_millis(100)).is_err() {
            break;
        }
        if preview.take_render_request() {
            preview.on_render_frame()?;
        }
    }

    let stats = producer
        .join()
        .map_err(|_| PreviewError::PlatformError("producer thread panicked".into()))??;
    preview.on_render_surface_destroyed();

    println!(
        "published {} frames, latched {}, dropped {}, drew {}",
        stats.published,
        stats.latched,
        stats.dropped,
        preview.frames_drawn()
    );
    Ok(())
}
