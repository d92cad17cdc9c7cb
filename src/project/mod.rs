//! Project configuration wizard and the documents derived from it.

pub mod export;
pub mod model;
pub mod overview;
pub mod wizard;

pub use model::{Discipline, Milestone, ProjectConfig, ProjectPatch, RiskLevel, TeamMember};
pub use overview::{format_currency, Overview};
pub use wizard::{can_advance, Step, Wizard, WizardState};
