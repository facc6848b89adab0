use crate::capture::{FrameCount, FrameSource};
use crate::compositor::Compositor;
use crate::config::Settings;
use crate::error::{Result, SegError};
use crate::labels::Palette;
use crate::output::{FrameSink, Viewer, ViewerAction};
use crate::segmentation::{resize_to_width, SegmentationModel};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    QuitKey,
}

#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub frames_written: u64,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Fail when the model statically declares a class count other than the palette's.
pub fn check_model_classes<M>(model: &M, palette: &Palette) -> Result<()>
where
    M: SegmentationModel + ?Sized,
{
    match model.class_count() {
        Some(actual) if actual != palette.len() => Err(SegError::ClassCountMismatch {
            source_name: "model".to_string(),
            expected: palette.len(),
            actual,
        }),
        _ => Ok(()),
    }
}

/// Decode, segment, composite and write frames until the source runs dry or the viewer
/// reports the quit key.
///
/// With a viewer, each frame is shown after it has been written, so a quit never drops the
/// current frame. A frame whose size differs from what the sink already holds fails before
/// inference. The sink is finished on normal exit; on error it is released by its owner.
pub fn run_pipeline<S, M, O>(
    source: &mut S,
    model: &mut M,
    sink: &mut O,
    mut viewer: Option<&mut dyn Viewer>,
    palette: &Palette,
    settings: &Settings,
) -> Result<RunSummary>
where
    S: FrameSource + ?Sized,
    M: SegmentationModel + ?Sized,
    O: FrameSink + ?Sized,
{
    let started = Instant::now();
    check_model_classes(&*model, palette)?;

    let total = source.frame_count();
    match total {
        FrameCount::Known(n) => tracing::info!("{} total frames in video", n),
        FrameCount::Unknown => tracing::info!("could not determine # of frames in video"),
    }

    let compositor = Compositor::new(palette);
    let mut frames_written = 0u64;

    tracing::info!("Starting frame loop");

    let stop_reason = loop {
        let Some(frame) = source.next_frame()? else {
            break StopReason::EndOfStream;
        };
        let frame = resize_to_width(&frame, settings.working_width)?;
        if let Some(expected) = sink.resolution() {
            if frame.dimensions() != expected {
                return Err(SegError::FrameSizeMismatch {
                    expected,
                    actual: frame.dimensions(),
                });
            }
        }

        let inference_start = Instant::now();
        let scores = model.segment(&frame)?;
        let inference_time = inference_start.elapsed();

        if frames_written == 0 {
            compositor.validate(&scores)?;
            if let Some(total) = total.known() {
                let elapsed = inference_time.as_secs_f64();
                tracing::info!("single frame took {:.4} seconds", elapsed);
                tracing::info!("estimated total time: {:.4}", elapsed * total as f64);
            }
        }
        tracing::debug!(
            "Frame {}: inference={:.1}ms",
            frames_written + 1,
            inference_time.as_secs_f64() * 1000.0
        );

        let composite = compositor.composite(&frame, &scores)?;
        sink.write_frame(&composite)?;
        frames_written += 1;

        if let Some(viewer) = viewer.as_mut() {
            if viewer.show(&composite)? == ViewerAction::Quit {
                tracing::info!("Quit key pressed, stopping after frame {}", frames_written);
                break StopReason::QuitKey;
            }
        }
    };

    sink.finish()?;

    Ok(RunSummary {
        frames_written,
        stop_reason,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::ClassTable;
    use crate::segmentation::ScoreVolume;
    use image::{Rgb, RgbImage};
    use ndarray::Array4;
    use std::collections::VecDeque;

    struct QueueSource {
        frames: VecDeque<RgbImage>,
        count: FrameCount,
    }

    impl FrameSource for QueueSource {
        fn next_frame(&mut self) -> Result<Option<RgbImage>> {
            Ok(self.frames.pop_front())
        }

        fn frame_count(&self) -> FrameCount {
            self.count
        }
    }

    struct ConstantModel {
        classes: usize,
        declared: Option<usize>,
        calls: usize,
    }

    impl SegmentationModel for ConstantModel {
        fn segment(&mut self, _frame: &RgbImage) -> Result<ScoreVolume> {
            self.calls += 1;
            Ok(Array4::zeros((1, self.classes, 4, 8)))
        }

        fn class_count(&self) -> Option<usize> {
            self.declared
        }
    }

    #[derive(Default)]
    struct MemorySink {
        frames: Vec<RgbImage>,
        finished: bool,
    }

    impl FrameSink for MemorySink {
        fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn resolution(&self) -> Option<(u32, u32)> {
            self.frames.first().map(RgbImage::dimensions)
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    fn palette(n: usize) -> Palette {
        Palette::with_default_colors(
            ClassTable::new((0..n).map(|i| format!("c{i}")).collect()).unwrap(),
        )
    }

    fn settings() -> Settings {
        Settings::new("model.onnx", "classes.txt", "in.mp4", "out.avi")
    }

    fn source(n: usize, count: FrameCount) -> QueueSource {
        QueueSource {
            frames: (0..n).map(|_| RgbImage::from_pixel(1000, 600, Rgb([9, 9, 9]))).collect(),
            count,
        }
    }

    #[test]
    fn runs_to_end_of_stream_and_finishes_sink() {
        let mut source = source(3, FrameCount::Unknown);
        let mut model = ConstantModel { classes: 4, declared: None, calls: 0 };
        let mut sink = MemorySink::default();

        let summary =
            run_pipeline(&mut source, &mut model, &mut sink, None, &palette(4), &settings())
                .unwrap();

        assert_eq!(summary.frames_written, 3);
        assert_eq!(summary.stop_reason, StopReason::EndOfStream);
        assert!(sink.finished);
        assert!(sink.frames.iter().all(|f| f.dimensions() == (500, 300)));
    }

    #[test]
    fn declared_class_mismatch_fails_before_reading() {
        let mut source = source(2, FrameCount::Known(2));
        let mut model = ConstantModel { classes: 5, declared: Some(5), calls: 0 };
        let mut sink = MemorySink::default();

        let err = run_pipeline(&mut source, &mut model, &mut sink, None, &palette(4), &settings())
            .unwrap_err();
        assert!(matches!(err, SegError::ClassCountMismatch { actual: 5, .. }));
        assert_eq!(source.frames.len(), 2);
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn output_class_mismatch_fails_before_first_write() {
        let mut source = source(2, FrameCount::Known(2));
        let mut model = ConstantModel { classes: 3, declared: None, calls: 0 };
        let mut sink = MemorySink::default();

        let err = run_pipeline(&mut source, &mut model, &mut sink, None, &palette(4), &settings())
            .unwrap_err();
        assert!(matches!(
            err,
            SegError::ClassCountMismatch { expected: 4, actual: 3, .. }
        ));
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn empty_source_writes_nothing() {
        let mut source = source(0, FrameCount::Unknown);
        let mut model = ConstantModel { classes: 2, declared: None, calls: 0 };
        let mut sink = MemorySink::default();

        let summary =
            run_pipeline(&mut source, &mut model, &mut sink, None, &palette(2), &settings())
                .unwrap();
        assert_eq!(summary.frames_written, 0);
        assert_eq!(sink.resolution(), None);
    }

    #[test]
    fn size_change_fails_before_inference() {
        let mut source = source(1, FrameCount::Unknown);
        source
            .frames
            .push_back(RgbImage::from_pixel(1000, 700, Rgb([9, 9, 9])));
        let mut model = ConstantModel { classes: 2, declared: None, calls: 0 };
        let mut sink = MemorySink::default();

        let err = run_pipeline(&mut source, &mut model, &mut sink, None, &palette(2), &settings())
            .unwrap_err();
        assert!(matches!(
            err,
            SegError::FrameSizeMismatch { expected: (500, 300), actual: (500, 350) }
        ));
        assert_eq!(model.calls, 1);
        assert_eq!(sink.frames.len(), 1);
        assert!(!sink.finished);
    }
}
