//! Use cases composed from the domain ports

pub mod pipeline;

pub use pipeline::AgentPipeline;
