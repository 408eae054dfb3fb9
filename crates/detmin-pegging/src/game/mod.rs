pub mod pegging;
pub mod scoring;
