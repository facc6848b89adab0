use anyhow::{Context, Result};
use clap::Parser;
use segvid::{
    capture::VideoFileSource,
    legend::render_legend,
    output::{HighGuiViewer, VideoFileSink, Viewer},
    run_pipeline, segmentation, Args, ClassTable, Palette, Settings,
};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let settings = Settings::try_from(args).context("Invalid arguments")?;

    let classes = ClassTable::load(&settings.classes_path).with_context(|| {
        format!(
            "Failed to load class names from {}",
            settings.classes_path.display()
        )
    })?;
    let palette = Palette::load(classes, settings.colors_path.as_deref())
        .context("Failed to load class colors")?;
    tracing::info!("{} classes", palette.len());

    let mut viewer = if settings.show {
        let mut viewer = HighGuiViewer::new();
        let legend = render_legend(&palette).context("Failed to render legend")?;
        viewer.show_legend(&legend)?;
        Some(viewer)
    } else {
        None
    };

    let mut model = segmentation::create_default_model(&settings.model_path)
        .context("Failed to load segmentation model")?;

    let mut source = VideoFileSource::open(&settings.video_path)
        .context("Failed to open input video")?;
    let mut sink = VideoFileSink::new(&settings.output_path, settings.fps, settings.codec);

    let summary = run_pipeline(
        &mut source,
        model.as_mut(),
        &mut sink,
        viewer.as_mut().map(|v| v as &mut dyn Viewer),
        &palette,
        &settings,
    )
    .context("Segmentation pipeline failed")?;

    tracing::info!(
        "Wrote {} frames to {} in {:.2}s ({:?})",
        summary.frames_written,
        settings.output_path.display(),
        summary.elapsed.as_secs_f64(),
        summary.stop_reason
    );

    Ok(())
}
