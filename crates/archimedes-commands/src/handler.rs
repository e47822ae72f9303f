use image::RgbImage;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("command box does not overlap the frame")]
    EmptyRegion,
    #[error("recognition failed: {0}")]
    Recognition(#[source] BoxError),
    #[error("compute kernel failed: {0}")]
    Kernel(#[source] BoxError),
    #[error("{0}")]
    Other(String),
}

/// Action run on the image of every newly detected command box.
///
/// `Send` so that independent commands can run on separate threads.
pub trait CommandHandler: Send {
    fn handle(&mut self, region: &RgbImage) -> Result<(), HandlerError>;
}

/// Closures are handlers.
impl<F> CommandHandler for F
where
    F: FnMut(&RgbImage) -> Result<(), HandlerError> + Send,
{
    fn handle(&mut self, region: &RgbImage) -> Result<(), HandlerError> {
        self(region)
    }
}
