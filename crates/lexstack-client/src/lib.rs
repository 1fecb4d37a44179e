//! Client side of the prediction API, used by `lexstack remote`.

pub mod http;

pub use http::{ClassifyClient, ClientError};
