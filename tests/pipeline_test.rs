use image::{Rgb, RgbImage};
use ndarray::Array4;
use std::collections::VecDeque;

use segvid::capture::{FrameCount, FrameSource};
use segvid::output::{FrameSink, FrameSizeLock, Viewer, ViewerAction};
use segvid::segmentation::{ScoreVolume, SegmentationModel};
use segvid::{run_pipeline, ClassTable, Palette, SegError, Settings, StopReason};

struct ScriptedSource {
    frames: VecDeque<RgbImage>,
}

impl ScriptedSource {
    fn uniform(n: usize, width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            frames: (0..n)
                .map(|_| RgbImage::from_pixel(width, height, Rgb(color)))
                .collect(),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> segvid::Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }

    fn frame_count(&self) -> FrameCount {
        FrameCount::Known(self.frames.len() as u64)
    }
}

/// Always predicts `class` everywhere, at a resolution unrelated to the frame.
struct UniformModel {
    classes: usize,
    class: usize,
    calls: usize,
}

impl SegmentationModel for UniformModel {
    fn segment(&mut self, _frame: &RgbImage) -> segvid::Result<ScoreVolume> {
        self.calls += 1;
        let class = self.class;
        Ok(Array4::from_shape_fn((1, self.classes, 16, 32), |(_, c, _, _)| {
            if c == class {
                0.9
            } else {
                0.01
            }
        }))
    }
}

#[derive(Default)]
struct RecordingSink {
    frames: Vec<RgbImage>,
    size: FrameSizeLock,
}

impl FrameSink for RecordingSink {
    fn write_frame(&mut self, frame: &RgbImage) -> segvid::Result<()> {
        self.size.check(frame.dimensions())?;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn resolution(&self) -> Option<(u32, u32)> {
        self.size.get()
    }
}

struct QuitAfter {
    shown: usize,
    quit_on: usize,
}

impl Viewer for QuitAfter {
    fn show(&mut self, _frame: &RgbImage) -> segvid::Result<ViewerAction> {
        self.shown += 1;
        Ok(if self.shown == self.quit_on {
            ViewerAction::Quit
        } else {
            ViewerAction::Continue
        })
    }
}

fn palette(n: usize) -> Palette {
    let names = (0..n).map(|i| format!("class{i}")).collect();
    Palette::with_default_colors(ClassTable::new(names).unwrap())
}

fn settings() -> Settings {
    Settings::new("enet.onnx", "classes.txt", "input.mp4", "output.avi")
}

fn expected_blend(frame: [u8; 3], mask: Rgb<u8>) -> Rgb<u8> {
    let mix = |f: u8, m: u8| ((3 * u16::from(f) + 7 * u16::from(m) + 5) / 10) as u8;
    Rgb([
        mix(frame[0], mask[0]),
        mix(frame[1], mask[1]),
        mix(frame[2], mask[2]),
    ])
}

#[test]
fn uniform_class_colors_every_frame() {
    let frame_color = [40, 80, 120];
    let palette = palette(5);
    let mut source = ScriptedSource::uniform(4, 500, 250, frame_color);
    let mut model = UniformModel {
        classes: 5,
        class: 2,
        calls: 0,
    };
    let mut sink = RecordingSink::default();

    let summary =
        run_pipeline(&mut source, &mut model, &mut sink, None, &palette, &settings()).unwrap();

    assert_eq!(summary.frames_written, 4);
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert_eq!(model.calls, 4);

    let expected = expected_blend(frame_color, palette.color(2).unwrap());
    for frame in &sink.frames {
        assert_eq!(frame.dimensions(), (500, 250));
        assert!(frame.pixels().all(|p| *p == expected));
    }
}

#[test]
fn frames_are_resized_to_working_width() {
    let palette = palette(3);
    let mut source = ScriptedSource::uniform(2, 1280, 720, [0, 0, 0]);
    let mut model = UniformModel {
        classes: 3,
        class: 0,
        calls: 0,
    };
    let mut sink = RecordingSink::default();
    let mut settings = settings();
    settings.working_width = 320;

    run_pipeline(&mut source, &mut model, &mut sink, None, &palette, &settings).unwrap();

    assert_eq!(sink.resolution(), Some((320, 180)));
    // Class 0 is black and so is the frame.
    assert!(sink.frames[0].pixels().all(|p| *p == Rgb([0, 0, 0])));
}

#[test]
fn quit_key_stops_after_current_frame_is_written() {
    let palette = palette(3);
    let mut source = ScriptedSource::uniform(5, 500, 300, [10, 10, 10]);
    let mut model = UniformModel {
        classes: 3,
        class: 1,
        calls: 0,
    };
    let mut sink = RecordingSink::default();
    let mut viewer = QuitAfter {
        shown: 0,
        quit_on: 2,
    };

    let summary = run_pipeline(
        &mut source,
        &mut model,
        &mut sink,
        Some(&mut viewer),
        &palette,
        &settings(),
    )
    .unwrap();

    assert_eq!(summary.stop_reason, StopReason::QuitKey);
    assert_eq!(summary.frames_written, 2);
    assert_eq!(sink.frames.len(), 2);
    assert_eq!(viewer.shown, 2);
    assert_eq!(source.frames.len(), 3);
}

#[test]
fn frame_size_change_mid_stream_is_fatal() {
    let palette = palette(2);
    let mut source = ScriptedSource::uniform(2, 500, 300, [1, 2, 3]);
    source
        .frames
        .push_back(RgbImage::from_pixel(500, 400, Rgb([1, 2, 3])));
    let mut model = UniformModel {
        classes: 2,
        class: 1,
        calls: 0,
    };
    let mut sink = RecordingSink::default();

    let err =
        run_pipeline(&mut source, &mut model, &mut sink, None, &palette, &settings()).unwrap_err();

    match err {
        SegError::FrameSizeMismatch { expected, actual } => {
            assert_eq!(expected, (500, 300));
            assert_eq!(actual, (500, 400));
        }
        other => panic!("expected FrameSizeMismatch, got {other:?}"),
    }
    assert_eq!(sink.frames.len(), 2);
    assert_eq!(model.calls, 2);
}
