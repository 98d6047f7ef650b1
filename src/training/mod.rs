//! Offline training: dataset rows in, validated model artifact out.

mod labels;
mod pipeline;

pub use labels::{extract_labels, parse_label};
pub use pipeline::{TrainError, train};
