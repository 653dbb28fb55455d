//! AI boundary: the generative-text client and the query expander built on it.

pub mod client;
pub mod expand;

pub use client::{ChatCompletionsClient, DisabledGenerator, TextGenerator, generator_from_config};
pub use expand::QueryExpander;
