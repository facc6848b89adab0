use super::preprocess::Preprocessor;
use super::types::{ScoreVolume, SegmentationModel};
use crate::error::{Result, SegError};
use image::RgbImage;
use ndarray::Ix4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use std::path::Path;

/// Pretrained semantic segmentation network loaded from an ONNX file.
///
/// The network takes a `[1, 3, 512, 1024]` RGB blob in `[0, 1]` and returns one score plane per
/// class. Its output resolution is network-defined.
pub struct OnnxSegmenter {
    session: Session,
    preprocessor: Preprocessor,
    class_count: Option<usize>,
}

impl OnnxSegmenter {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading segmentation model from {}", path.display());

        let builder = Session::builder()
            .map_err(|e| SegError::model("session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| SegError::model("optimization level", e))?
            .with_intra_threads(4)
            .map_err(|e| SegError::model("intra-op threads", e))?;

        #[cfg(any(feature = "cuda", feature = "tensorrt"))]
        let builder = {
            let mut providers = Vec::new();
            #[cfg(feature = "tensorrt")]
            providers.push(ort::execution_providers::TensorRTExecutionProvider::default().build());
            #[cfg(feature = "cuda")]
            providers.push(ort::execution_providers::CUDAExecutionProvider::default().build());
            builder
                .with_execution_providers(providers)
                .map_err(|e| SegError::model("execution providers", e))?
        };

        let session = builder
            .commit_from_file(path)
            .map_err(|e| SegError::model(format!("load {}", path.display()), e))?;

        // Dynamic axes report -1; only a positive class dimension can be checked up front.
        let class_count = session
            .outputs
            .first()
            .and_then(|output| output.output_type.tensor_shape())
            .and_then(|shape| shape.get(1).copied())
            .filter(|&dim| dim > 0)
            .map(|dim| dim as usize);

        tracing::info!("Segmentation model loaded successfully");
        match class_count {
            Some(n) => tracing::debug!("Model declares {} output classes", n),
            None => tracing::debug!("Model output class dimension is dynamic"),
        }

        Ok(Self {
            session,
            preprocessor: Preprocessor::default(),
            class_count,
        })
    }
}

impl SegmentationModel for OnnxSegmenter {
    fn segment(&mut self, frame: &RgbImage) -> Result<ScoreVolume> {
        let _span = tracing::debug_span!("onnx_segment").entered();

        let blob = self.preprocessor.preprocess(frame)?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(&blob.as_standard_layout())
                .map_err(|e| SegError::model("input tensor", e))?])
            .map_err(|e| SegError::model("forward pass", e))?;
        drop(_infer_span);

        let scores = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| SegError::model("output extraction", e))?
            .into_dimensionality::<Ix4>()?
            .to_owned();

        Ok(scores)
    }

    fn class_count(&self) -> Option<usize> {
        self.class_count
    }
}
