//! Pure text helpers shared by the extraction and speech stages.

pub mod normalize;
pub mod truncate;

pub use normalize::normalize;
pub use truncate::{truncate, Truncation, TruncationPolicy, EXTRACTION_BUDGET, SPEECH_BUDGET};
