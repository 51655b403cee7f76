//! Single-shot analysis state machine

use crate::imaging::fusion::HeatmapFuser;
use crate::imaging::preprocessor::Preprocessor;
use crate::imaging::source::SourceImage;
use crate::io::configuration::AnalysisConfig;
use crate::io::error::{Result, WithContext};
use crate::io::image::load_image;
use crate::model::engine::InferenceEngine;
use crate::pipeline::result::AnalysisResult;
use crate::saliency::generator::SaliencyGenerator;
use image::DynamicImage;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Position of the pipeline within one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// No analysis started, or a new one about to start
    Idle,
    /// Decoding and normalizing the source image
    Preprocessing,
    /// Scoring pathologies
    Inferring,
    /// Computing per-pathology saliency maps
    AttributingSaliency,
    /// Building individual and fused overlays
    Fusing,
    /// Analysis finished successfully
    Complete,
    /// Analysis aborted on a component error
    Failed,
}

impl PipelineStage {
    /// Whether the stage ends an analysis
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Short lowercase label for logs and progress output
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preprocessing => "preprocessing",
            Self::Inferring => "inference",
            Self::AttributingSaliency => "saliency",
            Self::Fusing => "fusion",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Callback notified on every stage transition
pub type StageObserver = Box<dyn FnMut(PipelineStage)>;

/// Sequences preprocessing, inference, saliency and fusion for one image
///
/// Each stage completes before the next begins. The first component error
/// moves the pipeline to [`PipelineStage::Failed`] and is returned as is;
/// nothing is retried.
pub struct Pipeline {
    engine: InferenceEngine,
    preprocessor: Preprocessor,
    generator: SaliencyGenerator,
    fuser: HeatmapFuser,
    stage: PipelineStage,
    observer: Option<StageObserver>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("engine", &self.engine)
            .field("preprocessor", &self.preprocessor)
            .field("generator", &self.generator)
            .field("fuser", &self.fuser)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline around an engine, sized to the engine's input resolution
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(engine: InferenceEngine, config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let preprocessor = match engine.network() {
            Ok(network) => Preprocessor::new(network.resolution())?,
            Err(_) => Preprocessor::default(),
        };

        Ok(Self {
            engine,
            preprocessor,
            generator: SaliencyGenerator::from_config(config),
            fuser: HeatmapFuser::default(),
            stage: PipelineStage::Idle,
            observer: None,
        })
    }

    /// Register a callback for stage transitions
    #[must_use]
    pub fn with_observer(mut self, observer: StageObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Current stage
    pub const fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Borrow the inference engine
    pub const fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Borrow the inference engine mutably
    pub const fn engine_mut(&mut self) -> &mut InferenceEngine {
        &mut self.engine
    }

    /// Analyze the image stored at `image_path`
    ///
    /// # Errors
    ///
    /// Returns the first component error: an invalid image, a missing
    /// network, an inference contract violation, a saliency failure or a
    /// fusion failure
    pub fn analyze(&mut self, image_path: impl AsRef<Path>) -> Result<AnalysisResult> {
        let path = image_path.as_ref();
        log::info!("Analyzing {}", path.display());

        self.transition(PipelineStage::Idle);
        self.transition(PipelineStage::Preprocessing);
        let image = match load_image(path).with_stage(PipelineStage::Preprocessing.label()) {
            Ok(image) => image,
            Err(error) => {
                self.transition(PipelineStage::Failed);
                return Err(error);
            }
        };
        self.finish(&image)
    }

    /// Analyze an already decoded image
    ///
    /// # Errors
    ///
    /// Same as [`Self::analyze`], minus decoding failures
    pub fn analyze_image(&mut self, image: &DynamicImage) -> Result<AnalysisResult> {
        self.transition(PipelineStage::Idle);
        self.transition(PipelineStage::Preprocessing);
        self.finish(image)
    }

    fn finish(&mut self, image: &DynamicImage) -> Result<AnalysisResult> {
        let outcome = self.run(image);
        match &outcome {
            Ok(_) => self.transition(PipelineStage::Complete),
            Err(_) => self.transition(PipelineStage::Failed),
        }
        outcome
    }

    fn run(&mut self, image: &DynamicImage) -> Result<AnalysisResult> {
        let source =
            SourceImage::from_dynamic(image).with_stage(PipelineStage::Preprocessing.label())?;
        let tensor = self
            .preprocessor
            .preprocess(&source)
            .with_stage(PipelineStage::Preprocessing.label())?;
        let original = image.to_rgb8();

        self.transition(PipelineStage::Inferring);
        let scores = self
            .engine
            .predict(&tensor)
            .with_stage(PipelineStage::Inferring.label())?;

        self.transition(PipelineStage::AttributingSaliency);
        let vocabulary = scores.names().to_vec();
        let (saliency, sorted_diseases) = self
            .generator
            .generate_all(&mut self.engine, &tensor, &scores, &vocabulary)
            .with_stage(PipelineStage::AttributingSaliency.label())?;

        self.transition(PipelineStage::Fusing);
        let mut overlays = BTreeMap::new();
        for (name, map) in &saliency {
            let overlay = self
                .fuser
                .overlay_single(&original, map)
                .with_stage(PipelineStage::Fusing.label())?;
            overlays.insert(name.clone(), overlay);
        }

        let fused = if saliency.is_empty() {
            log::info!("No pathology qualified for a saliency map, fused overlay is the original");
            original.clone()
        } else {
            self.fuser
                .fuse(&original, &saliency, &scores)
                .with_stage(PipelineStage::Fusing.label())?
        };

        Ok(AnalysisResult {
            scores,
            sorted_diseases,
            saliency,
            overlays,
            fused,
            original,
        })
    }

    fn transition(&mut self, next: PipelineStage) {
        log::debug!("Pipeline stage {} -> {next}", self.stage);
        self.stage = next;
        if let Some(observer) = self.observer.as_mut() {
            observer(next);
        }
    }
}
