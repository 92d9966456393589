#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A remote image URL was not fetched before translation.
    #[error("image not resolved: {0}")]
    ImageNotResolved(String),
    #[error("invalid image data: {0}")]
    InvalidImageData(String),
}
