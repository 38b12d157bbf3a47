use rasterpanel::geometry::{LogicalPoint, LogicalSize};
use rasterpanel::input::{HostPointerEvent, InputRecorder, Modifiers};
use rasterpanel::present::memory::{MemoryHost, RecordingCanvas};
use rasterpanel::render::backend::PixelFormat;
use rasterpanel::render::backends::software::SoftwareRenderer;
use rasterpanel::render::{Color, DisplayItem, RenderList};
use rasterpanel::{init_logging, LogLevel, PanelConfig, RasterPanel};

fn main() -> anyhow::Result<()> {
    // Configure the panel. The log level is only a default; RUST_LOG still wins.
    let config = PanelConfig::builder()
        .log_level(LogLevel::Debug)
        .double_tap_ms(400)
        .build()?;
    init_logging(config.log_level);

    // A headless host at 150% scale. A real host would hand us its own
    // bitmaps and drawing context instead.
    let host = MemoryHost::new(1.5);
    let renderer = SoftwareRenderer::new(PixelFormat::Bgra8);
    let mut panel = RasterPanel::new(renderer, host, config)?;

    panel.events_mut()?.on_frame_end(|p| log::info!("frame {} done at {}", p.frame_id, p.size));
    panel.events_mut()?.on_render_failed(|e, timeout| log::error!("render failed (timeout: {timeout}): {e}"));
    panel.set_input_controller(Box::new(InputRecorder::default()));

    let mut scene = RenderList::new();
    scene.add_command(DisplayItem::Clear { color: Color::from_u8(30, 30, 40, 255) });
    scene.add_command(DisplayItem::Rect {
        x: 0.1,
        y: 0.1,
        w: 0.4,
        h: 0.5,
        color: Color::from_u8(220, 80, 60, 255),
        id: Some(1),
    });
    scene.add_command(DisplayItem::Rect {
        x: 0.4,
        y: 0.3,
        w: 0.5,
        h: 0.6,
        color: Color::new(0.2, 0.6, 0.9, 0.8),
        id: Some(2),
    });
    panel.set_scene(scene)?;

    // The host lays out the control, then paints it.
    panel.on_size_changed(LogicalSize::new(320.0, 200.0))?;
    let mut canvas = RecordingCanvas::default();
    panel.paint(&mut canvas)?;

    // The user moves the window to a display with another scale.
    panel.host_mut().set_scale_factor(2.0);
    panel.paint(&mut canvas)?;

    for draw in &canvas.draws {
        println!("drew bitmap {} into {:?} at {:.0} dpi", draw.bitmap_id, draw.dest, draw.dpi.x);
    }

    let tap = LogicalPoint::new(80.0, 60.0);
    panel.handle_pointer(&HostPointerEvent::Tapped { position: tap, modifiers: Modifiers::empty() });
    println!("object under ({}, {}): {:?}", tap.x, tap.y, panel.pick_at(tap)?);

    if let Some(image) = panel.snapshot()? {
        let path = std::env::args().nth(1).unwrap_or_else(|| "headless.png".to_string());
        image.write_png(&path)?;
        println!("wrote {}x{} snapshot to {path}", image.width, image.height);
    }

    let stats = panel.presentation_stats();
    println!(
        "bitmaps allocated: {}, reused: {}, released: {}",
        stats.allocations, stats.reuses, stats.releases
    );

    panel.dispose();
    Ok(())
}
