pub mod error;
pub mod generate_content;
pub mod image;

pub use error::TransformError;
