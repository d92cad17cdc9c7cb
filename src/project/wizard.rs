//! Four-step project form with per-step completeness gates.

use std::fmt;

use tracing::{debug, info};

use super::model::{filled, ProjectConfig, ProjectPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Identity,
    Scope,
    Technical,
    TeamAndMilestones,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Identity, Step::Scope, Step::Technical, Step::TeamAndMilestones];

    pub fn label(self) -> &'static str {
        match self {
            Step::Identity => "Project Identity",
            Step::Scope => "Scope & Objectives",
            Step::Technical => "Technical Details",
            Step::TeamAndMilestones => "Team & Milestones",
        }
    }

    /// 1-based position shown in the step indicator.
    pub fn number(self) -> usize {
        self.index() + 1
    }

    fn index(self) -> usize {
        Step::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Option<Step> {
        Step::ALL.get(self.index() + 1).copied()
    }

    pub fn prev(self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Step::ALL[i])
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Editing(Step),
    Overview,
}

// Scalar fields only need to be non-empty. List entries must be non-blank.
fn present(s: &str) -> bool {
    !s.is_empty()
}

/// Required fields of `step` that are still empty.
pub fn missing_fields(step: Step, config: &ProjectConfig) -> Vec<&'static str> {
    let mut missing = Vec::new();
    let mut require = |ok: bool, name: &'static str| {
        if !ok {
            missing.push(name);
        }
    };

    match step {
        Step::Identity => {
            require(config.discipline.is_set(), "discipline");
            require(present(&config.project_name), "project name");
            require(present(&config.client_name), "client name");
            require(present(&config.location), "location");
            require(present(&config.phone), "phone");
            require(present(&config.start_date), "start date");
        }
        Step::Scope => {
            require(present(&config.description), "description");
            require(filled(&config.objectives).next().is_some(), "at least one objective");
        }
        Step::Technical => {
            require(present(&config.budget), "budget");
            require(config.risk_level.is_set(), "risk level");
            require(filled(&config.deliverables).next().is_some(), "at least one deliverable");
        }
        Step::TeamAndMilestones => {}
    }
    missing
}

pub fn can_advance(step: Step, config: &ProjectConfig) -> bool {
    missing_fields(step, config).is_empty()
}

#[derive(Debug)]
pub struct Wizard {
    state: WizardState,
    config: ProjectConfig,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::with_config(ProjectConfig::default())
    }

    pub fn with_config(config: ProjectConfig) -> Self {
        Self { state: WizardState::Editing(Step::Identity), config }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    /// The input step being edited, or `None` while the overview is shown.
    pub fn step(&self) -> Option<Step> {
        match self.state {
            WizardState::Editing(step) => Some(step),
            WizardState::Overview => None,
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ProjectConfig {
        &mut self.config
    }

    pub fn into_config(self) -> ProjectConfig {
        self.config
    }

    pub fn update(&mut self, patch: ProjectPatch) {
        self.config.apply(patch);
    }

    pub fn can_advance(&self) -> bool {
        match self.state {
            WizardState::Editing(step) => can_advance(step, &self.config),
            WizardState::Overview => false,
        }
    }

    /// Moves to the following step. Does nothing when the current step is
    /// incomplete or already the last one.
    pub fn next(&mut self) -> bool {
        let WizardState::Editing(step) = self.state else {
            return false;
        };
        if !can_advance(step, &self.config) {
            debug!(step = step.label(), missing = ?missing_fields(step, &self.config), "step incomplete");
            return false;
        }
        match step.next() {
            Some(next) => {
                self.state = WizardState::Editing(next);
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) -> bool {
        match self.state {
            WizardState::Editing(step) => match step.prev() {
                Some(prev) => {
                    self.state = WizardState::Editing(prev);
                    true
                }
                None => false,
            },
            WizardState::Overview => false,
        }
    }

    /// Jumps back to an earlier step through its indicator.
    pub fn jump_to(&mut self, target: Step) -> bool {
        match self.state {
            WizardState::Editing(step) if target < step => {
                self.state = WizardState::Editing(target);
                true
            }
            _ => false,
        }
    }

    pub fn generate_overview(&mut self) -> bool {
        match self.state {
            WizardState::Editing(step) if step.is_last() && can_advance(step, &self.config) => {
                info!(project = %self.config.project_name, "overview generated");
                self.state = WizardState::Overview;
                true
            }
            _ => false,
        }
    }

    pub fn back_to_form(&mut self) -> bool {
        if self.state != WizardState::Overview {
            return false;
        }
        self.state = WizardState::Editing(Step::TeamAndMilestones);
        true
    }

    /// Discards everything entered and starts over at step one.
    pub fn reset(&mut self) {
        info!("wizard reset");
        self.config = ProjectConfig::default();
        self.state = WizardState::Editing(Step::Identity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::model::{Discipline, RiskLevel};

    fn identity_filled() -> ProjectConfig {
        let mut cfg = ProjectConfig::default();
        cfg.discipline = Discipline::Civil;
        cfg.project_name = "N1 Interchange Upgrade".into();
        cfg.client_name = "City of Tshwane".into();
        cfg.location = "Pretoria, Gauteng".into();
        cfg.phone = "+27 12 000 0000".into();
        cfg.start_date = "2026-03-01".into();
        cfg
    }

    fn complete() -> ProjectConfig {
        let mut cfg = identity_filled();
        cfg.description = "Upgrade of the interchange".into();
        cfg.objectives = vec!["".into(), "Build road".into()];
        cfg.budget = "2500000".into();
        cfg.risk_level = RiskLevel::Medium;
        cfg.deliverables = vec!["Design report".into()];
        cfg
    }

    #[test]
    fn identity_requires_each_field() {
        assert!(can_advance(Step::Identity, &identity_filled()));
        assert!(!can_advance(Step::Identity, &ProjectConfig::default()));

        let clear: [fn(&mut ProjectConfig); 6] = [
            |c| c.discipline = Discipline::Unset,
            |c| c.project_name.clear(),
            |c| c.client_name.clear(),
            |c| c.location.clear(),
            |c| c.phone.clear(),
            |c| c.start_date.clear(),
        ];
        for f in clear {
            let mut cfg = identity_filled();
            f(&mut cfg);
            assert!(!can_advance(Step::Identity, &cfg), "{:?}", missing_fields(Step::Identity, &cfg));
        }

        // reference and end date are optional
        let mut cfg = identity_filled();
        cfg.project_ref.clear();
        cfg.end_date.clear();
        assert!(can_advance(Step::Identity, &cfg));
    }

    #[test]
    fn scope_needs_a_non_blank_objective() {
        let mut cfg = ProjectConfig::default();
        cfg.description = "desc".into();
        cfg.objectives = vec!["".into(), "   ".into()];
        assert_eq!(missing_fields(Step::Scope, &cfg), vec!["at least one objective"]);
        cfg.objectives.push("Deliver on time".into());
        assert!(can_advance(Step::Scope, &cfg));
        cfg.description.clear();
        assert!(!can_advance(Step::Scope, &cfg));
    }

    #[test]
    fn whitespace_scalar_counts_as_filled() {
        let mut cfg = ProjectConfig::default();
        cfg.description = "   ".into();
        cfg.objectives = vec!["Deliver".into()];
        assert!(can_advance(Step::Scope, &cfg));

        cfg.objectives = vec!["   ".into()];
        assert_eq!(missing_fields(Step::Scope, &cfg), vec!["at least one objective"]);
    }

    #[test]
    fn technical_needs_budget_risk_and_deliverable() {
        let mut cfg = ProjectConfig::default();
        assert_eq!(
            missing_fields(Step::Technical, &cfg),
            vec!["budget", "risk level", "at least one deliverable"]
        );
        cfg.budget = "100".into();
        cfg.risk_level = RiskLevel::Critical;
        cfg.deliverables = vec!["As-built drawings".into()];
        assert!(can_advance(Step::Technical, &cfg));
    }

    #[test]
    fn last_step_never_blocks() {
        assert!(can_advance(Step::TeamAndMilestones, &ProjectConfig::default()));
    }

    #[test]
    fn next_is_noop_when_incomplete() {
        let mut wizard = Wizard::new();
        assert!(!wizard.next());
        assert_eq!(wizard.step(), Some(Step::Identity));
    }

    #[test]
    fn walks_forward_and_back() {
        let mut wizard = Wizard::with_config(complete());
        assert!(wizard.next());
        assert!(wizard.next());
        assert!(wizard.next());
        assert_eq!(wizard.step(), Some(Step::TeamAndMilestones));
        assert!(!wizard.next());

        assert!(wizard.back());
        assert_eq!(wizard.step(), Some(Step::Technical));
        assert!(wizard.jump_to(Step::Identity));
        assert!(!wizard.back());
        assert_eq!(wizard.step(), Some(Step::Identity));
    }

    #[test]
    fn jump_only_goes_backwards() {
        let mut wizard = Wizard::with_config(complete());
        wizard.next();
        assert!(!wizard.jump_to(Step::Technical));
        assert!(!wizard.jump_to(Step::Scope));
        assert!(wizard.jump_to(Step::Identity));
    }

    #[test]
    fn overview_from_last_step_and_back() {
        let mut wizard = Wizard::with_config(complete());
        assert!(!wizard.generate_overview());
        while wizard.next() {}
        assert!(wizard.generate_overview());
        assert_eq!(wizard.state(), WizardState::Overview);
        assert!(!wizard.next());
        assert!(!wizard.back());
        assert!(wizard.back_to_form());
        assert_eq!(wizard.step(), Some(Step::TeamAndMilestones));
        assert!(!wizard.back_to_form());
    }

    #[test]
    fn reset_returns_to_defaults() {
        let mut wizard = Wizard::with_config(complete());
        wizard.next();
        wizard.next();
        wizard.reset();
        assert_eq!(wizard.step(), Some(Step::Identity));

        let cfg = wizard.config();
        let fresh = ProjectConfig::default();
        assert_eq!(cfg.project_name, fresh.project_name);
        assert_eq!(cfg.objectives, vec![String::new()]);
        assert_eq!(cfg.deliverables, vec![String::new()]);
        assert_eq!(cfg.team.len(), 1);
        assert_eq!(cfg.milestones.len(), 1);
        assert!(cfg.team[0].name.is_empty());
        assert_eq!(cfg.discipline, Discipline::Unset);
        assert_eq!(cfg.risk_level, RiskLevel::Unset);
    }

    #[test]
    fn discipline_change_through_wizard_clears_standards() {
        let mut wizard = Wizard::with_config(complete());
        wizard.config_mut().toggle_standard("TMH7");
        wizard.update(ProjectPatch { discipline: Some(Discipline::Electrical), ..Default::default() });
        assert!(wizard.config().standards.is_empty());
    }

    #[test]
    fn step_labels() {
        assert_eq!(Step::Scope.to_string(), "2. Scope & Objectives");
        assert_eq!(Step::Identity.prev(), None);
        assert_eq!(Step::TeamAndMilestones.next(), None);
    }
}
