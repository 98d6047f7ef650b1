//! Feature schema and categorical encoding shared by training and serving.

pub mod encoder;
pub mod registry;
pub mod schema;

pub use encoder::{CategoryEncoder, EncodeError, FeatureEncoder, UnseenCategoryPolicy};
pub use registry::LazyEncoderRegistry;
pub use schema::{FeatureColumn, FeatureKind, FeatureSchema, SchemaError};
