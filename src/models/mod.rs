//! Noise-model vocabulary and the abbreviation tokenizer.

pub mod model;
pub mod tokenizer;

pub use model::*;
pub use tokenizer::*;
