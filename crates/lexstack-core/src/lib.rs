pub mod document;
pub mod prediction;
pub mod text;

pub use document::{Document, DocumentKind, UnsupportedDocument};
pub use prediction::{BaseModelOutput, BaseModelOutputs, ClassifyResponse, ErrorBody, Prediction};
pub use text::{clean_text, has_enough_text, preview};
