//! Coverage lookup and project overview tooling.

pub mod coverage;
pub mod project;
pub mod prompt;
pub mod settings;
