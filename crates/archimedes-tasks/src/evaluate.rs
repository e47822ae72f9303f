use crate::kernel::{tex_to_expression, ComputeKernel};
use crate::recognize::{MarkupRecognizer, RecognitionPolicy};
use archimedes_commands::{CommandHandler, HandlerError};
use image::RgbImage;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One evaluated region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub markup: String,
    pub output: String,
}

/// Reads handwritten math from a region and evaluates it symbolically.
pub struct OcrEvaluate<R, K> {
    recognizer: R,
    kernel: K,
    policy: RecognitionPolicy,
    evaluations: Vec<Evaluation>,
}

impl<R: MarkupRecognizer, K: ComputeKernel> OcrEvaluate<R, K> {
    pub fn new(recognizer: R, kernel: K, policy: RecognitionPolicy) -> Self {
        Self {
            recognizer,
            kernel,
            policy,
            evaluations: Vec::new(),
        }
    }

    /// Successful evaluations, oldest first.
    pub fn evaluations(&self) -> &[Evaluation] {
        &self.evaluations
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(width = region.width(), height = region.height()))
    )]
    pub fn evaluate(&mut self, region: &RgbImage) -> Result<&Evaluation, HandlerError> {
        let recognition = self.recognizer.recognize(region)?;
        self.policy.check(&recognition)?;

        let output = self.kernel.evaluate(&tex_to_expression(&recognition.markup))?;
        log::info!("{} => {}", recognition.markup, output.trim_end());

        self.evaluations.push(Evaluation {
            markup: recognition.markup,
            output,
        });
        self.evaluations
            .last()
            .ok_or_else(|| HandlerError::Other("evaluation history is empty".into()))
    }
}

impl<R, K> CommandHandler for OcrEvaluate<R, K>
where
    R: MarkupRecognizer + Send,
    K: ComputeKernel + Send,
{
    fn handle(&mut self, region: &RgbImage) -> Result<(), HandlerError> {
        self.evaluate(region).map(|_| ())
    }
}
