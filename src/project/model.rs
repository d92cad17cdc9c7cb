use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CURRENCIES: [&str; 4] = ["ZAR", "USD", "EUR", "GBP"];

fn uid() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discipline {
    #[default]
    #[serde(rename = "")]
    Unset,
    #[serde(rename = "civil")]
    Civil,
    #[serde(rename = "electrical")]
    Electrical,
    #[serde(rename = "process")]
    Process,
    #[serde(rename = "planning", alias = "project")]
    Planning,
}

impl Discipline {
    pub const ALL: [Discipline; 4] = [
        Discipline::Civil,
        Discipline::Electrical,
        Discipline::Process,
        Discipline::Planning,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Discipline::Unset => "",
            Discipline::Civil => "Civil & Infrastructure",
            Discipline::Electrical => "Electrical & Power",
            Discipline::Process => "Process & Industrial",
            Discipline::Planning => "Project Planning & Feasibility",
        }
    }

    /// Standards and codes that may be selected for this discipline.
    pub fn standards(self) -> &'static [&'static str] {
        match self {
            Discipline::Unset => &[],
            Discipline::Civil => &["SANS 10160", "TMH7", "COLTO", "SANS 1200", "NHBRC Guidelines"],
            Discipline::Electrical => &[
                "SANS 10142",
                "IEC 60364",
                "NRS 048",
                "SAIEE Guidelines",
                "NERSA Regulations",
            ],
            Discipline::Process => &["ASME B31.3", "API 650", "ISO 9001", "OHSAS 18001", "SANS 347"],
            Discipline::Planning => &["PMBOK Guide", "PRINCE2", "ISO 21500", "SACPCMP Guidelines"],
        }
    }

    pub fn is_set(self) -> bool {
        self != Discipline::Unset
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskLevel {
    #[default]
    #[serde(rename = "")]
    Unset,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical];

    pub fn is_set(self) -> bool {
        self != RiskLevel::Unset
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Unset => "",
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl TeamMember {
    pub fn blank() -> Self {
        Self { id: uid(), name: String::new(), role: String::new() }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Milestone {
    pub id: String,
    pub name: String,
    pub duration: String,
    pub deliverable: String,
}

impl Milestone {
    pub fn blank() -> Self {
        Self {
            id: uid(),
            name: String::new(),
            duration: String::new(),
            deliverable: String::new(),
        }
    }
}

/// Everything the project wizard collects.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    // Project identity
    pub project_name: String,
    pub project_ref: String,
    pub client_name: String,
    pub discipline: Discipline,
    pub location: String,
    pub phone: String,
    pub start_date: String,
    pub end_date: String,

    // Scope & objectives
    pub description: String,
    pub objectives: Vec<String>,
    pub exclusions: String,
    pub constraints: String,

    // Technical details
    pub budget: String,
    pub currency: String,
    pub risk_level: RiskLevel,
    pub standards: Vec<String>,
    pub deliverables: Vec<String>,

    // Team & milestones
    pub team: Vec<TeamMember>,
    pub milestones: Vec<Milestone>,
    pub notes: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            project_ref: String::new(),
            client_name: String::new(),
            discipline: Discipline::Unset,
            location: String::new(),
            phone: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            description: String::new(),
            objectives: vec![String::new()],
            exclusions: String::new(),
            constraints: String::new(),
            budget: String::new(),
            currency: "ZAR".to_string(),
            risk_level: RiskLevel::Unset,
            standards: Vec::new(),
            deliverables: vec![String::new()],
            team: vec![TeamMember::blank()],
            milestones: vec![Milestone::blank()],
            notes: String::new(),
        }
    }
}

/// A partial update. `None` fields are left alone.
#[derive(Debug, Default, Clone)]
pub struct ProjectPatch {
    pub project_name: Option<String>,
    pub project_ref: Option<String>,
    pub client_name: Option<String>,
    pub discipline: Option<Discipline>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
    pub objectives: Option<Vec<String>>,
    pub exclusions: Option<String>,
    pub constraints: Option<String>,
    pub budget: Option<String>,
    pub currency: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub standards: Option<Vec<String>>,
    pub deliverables: Option<Vec<String>>,
    pub team: Option<Vec<TeamMember>>,
    pub milestones: Option<Vec<Milestone>>,
    pub notes: Option<String>,
}

macro_rules! merge {
    ($cfg:expr, $patch:ident, $($field:ident),+ $(,)?) => {
        $(if let Some(v) = $patch.$field { $cfg.$field = v; })+
    };
}

impl ProjectConfig {
    /// Shallow-merges `patch` into the config.
    ///
    /// Switching to a different discipline clears the selected standards, since
    /// each catalogue only applies to its own discipline.
    pub fn apply(&mut self, patch: ProjectPatch) {
        if let Some(discipline) = patch.discipline {
            if discipline != self.discipline {
                self.standards.clear();
            }
            self.discipline = discipline;
        }
        merge!(
            self, patch, project_name, project_ref, client_name, location, phone, start_date, end_date,
            description, objectives, exclusions, constraints, budget, currency, risk_level,
            standards, deliverables, team, milestones, notes,
        );
    }

    pub fn set_discipline(&mut self, discipline: Discipline) {
        self.apply(ProjectPatch { discipline: Some(discipline), ..ProjectPatch::default() });
    }

    /// Adds or removes `standard`. Standards outside the current discipline's
    /// catalogue are ignored; returns whether the config changed.
    pub fn toggle_standard(&mut self, standard: &str) -> bool {
        if !self.discipline.standards().iter().any(|s| *s == standard) {
            return false;
        }
        if let Some(pos) = self.standards.iter().position(|s| s == standard) {
            self.standards.remove(pos);
        } else {
            self.standards.push(standard.to_string());
        }
        true
    }

    // Index keyed lists

    pub fn add_objective(&mut self) {
        self.objectives.push(String::new());
    }

    pub fn update_objective(&mut self, index: usize, value: &str) -> bool {
        update_at(&mut self.objectives, index, value)
    }

    pub fn remove_objective(&mut self, index: usize) -> bool {
        remove_at(&mut self.objectives, index)
    }

    pub fn add_deliverable(&mut self) {
        self.deliverables.push(String::new());
    }

    pub fn update_deliverable(&mut self, index: usize, value: &str) -> bool {
        update_at(&mut self.deliverables, index, value)
    }

    pub fn remove_deliverable(&mut self, index: usize) -> bool {
        remove_at(&mut self.deliverables, index)
    }

    // Id keyed lists

    /// Appends a blank member and returns its id.
    pub fn add_team_member(&mut self) -> String {
        let member = TeamMember::blank();
        let id = member.id.clone();
        self.team.push(member);
        id
    }

    pub fn update_team_member(&mut self, id: &str, name: Option<&str>, role: Option<&str>) -> bool {
        let Some(member) = self.team.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        if let Some(name) = name {
            member.name = name.to_string();
        }
        if let Some(role) = role {
            member.role = role.to_string();
        }
        true
    }

    pub fn remove_team_member(&mut self, id: &str) -> bool {
        if self.team.len() <= 1 {
            return false;
        }
        let before = self.team.len();
        self.team.retain(|m| m.id != id);
        self.team.len() != before
    }

    pub fn add_milestone(&mut self) -> String {
        let milestone = Milestone::blank();
        let id = milestone.id.clone();
        self.milestones.push(milestone);
        id
    }

    pub fn update_milestone(&mut self, id: &str, update: impl FnOnce(&mut Milestone)) -> bool {
        match self.milestones.iter_mut().find(|m| m.id == id) {
            Some(milestone) => {
                let keep_id = milestone.id.clone();
                update(milestone);
                milestone.id = keep_id;
                true
            }
            None => false,
        }
    }

    pub fn remove_milestone(&mut self, id: &str) -> bool {
        if self.milestones.len() <= 1 {
            return false;
        }
        let before = self.milestones.len();
        self.milestones.retain(|m| m.id != id);
        self.milestones.len() != before
    }
}

fn update_at(list: &mut [String], index: usize, value: &str) -> bool {
    match list.get_mut(index) {
        Some(slot) => {
            *slot = value.to_string();
            true
        }
        None => false,
    }
}

/// Removal keeps at least one entry so the form always has a row to fill in.
fn remove_at(list: &mut Vec<String>, index: usize) -> bool {
    if list.len() <= 1 || index >= list.len() {
        return false;
    }
    list.remove(index);
    true
}

/// Entries that are not blank, in order.
pub fn filled(list: &[String]) -> impl Iterator<Item = &str> {
    list.iter().map(String::as_str).filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_one_blank_row_per_list() {
        let cfg = ProjectConfig::default();
        assert_eq!(cfg.objectives, vec![String::new()]);
        assert_eq!(cfg.deliverables, vec![String::new()]);
        assert_eq!(cfg.team.len(), 1);
        assert_eq!(cfg.milestones.len(), 1);
        assert!(cfg.team[0].name.is_empty() && cfg.team[0].role.is_empty());
        assert!(cfg.standards.is_empty());
        assert_eq!(cfg.currency, "ZAR");
        assert_ne!(cfg.team[0].id, cfg.milestones[0].id);
    }

    #[test]
    fn changing_discipline_clears_standards() {
        let mut cfg = ProjectConfig::default();
        cfg.set_discipline(Discipline::Civil);
        assert!(cfg.toggle_standard("TMH7"));
        assert!(cfg.toggle_standard("COLTO"));
        assert_eq!(cfg.standards, vec!["TMH7", "COLTO"]);

        cfg.set_discipline(Discipline::Electrical);
        assert!(cfg.standards.is_empty());
        assert_eq!(cfg.discipline, Discipline::Electrical);
    }

    #[test]
    fn reselecting_same_discipline_keeps_standards() {
        let mut cfg = ProjectConfig::default();
        cfg.set_discipline(Discipline::Process);
        cfg.toggle_standard("API 650");
        cfg.set_discipline(Discipline::Process);
        assert_eq!(cfg.standards, vec!["API 650"]);
    }

    #[test]
    fn standards_outside_catalogue_are_rejected() {
        let mut cfg = ProjectConfig::default();
        assert!(!cfg.toggle_standard("TMH7"));
        cfg.set_discipline(Discipline::Planning);
        assert!(!cfg.toggle_standard("TMH7"));
        assert!(cfg.toggle_standard("PRINCE2"));
        assert!(cfg.toggle_standard("PRINCE2"));
        assert!(cfg.standards.is_empty());
    }

    #[test]
    fn patch_merges_only_given_fields() {
        let mut cfg = ProjectConfig::default();
        cfg.apply(ProjectPatch {
            project_name: Some("N1 Interchange".into()),
            budget: Some("1500000".into()),
            ..ProjectPatch::default()
        });
        cfg.apply(ProjectPatch { phone: Some("+27 11 000 0000".into()), ..ProjectPatch::default() });
        assert_eq!(cfg.project_name, "N1 Interchange");
        assert_eq!(cfg.budget, "1500000");
        assert_eq!(cfg.phone, "+27 11 000 0000");
        assert_eq!(cfg.currency, "ZAR");
    }

    #[test]
    fn patch_may_empty_lists_wholesale() {
        let mut cfg = ProjectConfig::default();
        cfg.apply(ProjectPatch { objectives: Some(vec![]), ..ProjectPatch::default() });
        assert!(cfg.objectives.is_empty());
    }

    #[test]
    fn index_lists_keep_last_row() {
        let mut cfg = ProjectConfig::default();
        assert!(!cfg.remove_objective(0));
        cfg.add_objective();
        assert!(cfg.update_objective(1, "Deliver on time"));
        assert!(!cfg.update_objective(5, "nope"));
        assert!(cfg.remove_objective(0));
        assert_eq!(cfg.objectives, vec!["Deliver on time"]);

        cfg.add_deliverable();
        assert!(cfg.update_deliverable(0, "Design report"));
        assert!(cfg.remove_deliverable(1));
        assert!(!cfg.remove_deliverable(0));
        assert_eq!(cfg.deliverables, vec!["Design report"]);
    }

    #[test]
    fn id_lists_update_in_place() {
        let mut cfg = ProjectConfig::default();
        let first = cfg.team[0].id.clone();
        let second = cfg.add_team_member();
        assert!(cfg.update_team_member(&second, Some("Thandi"), Some("Lead Engineer")));
        assert!(!cfg.update_team_member("missing", Some("x"), None));
        assert!(cfg.remove_team_member(&first));
        assert!(!cfg.remove_team_member(&second));
        assert_eq!(cfg.team[0].name, "Thandi");

        let ms = cfg.add_milestone();
        assert!(cfg.update_milestone(&ms, |m| {
            m.name = "Detailed design".into();
            m.id = "overwritten".into();
        }));
        assert_eq!(cfg.milestones[1].id, ms);
        assert_eq!(cfg.milestones[1].name, "Detailed design");
        let first_ms = cfg.milestones[0].id.clone();
        assert!(cfg.remove_milestone(&first_ms));
        assert!(!cfg.remove_milestone(&ms));
    }

    #[test]
    fn json_uses_form_field_names() {
        let mut cfg = ProjectConfig::default();
        cfg.project_ref = "VE-2026-001".into();
        cfg.risk_level = RiskLevel::High;
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["projectRef"], "VE-2026-001");
        assert_eq!(json["riskLevel"], "High");
        assert_eq!(json["discipline"], "");
        assert!(json["team"][0]["id"].is_string());
    }

    #[test]
    fn legacy_project_tag_reads_as_planning() {
        let d: Discipline = serde_json::from_str("\"project\"").unwrap();
        assert_eq!(d, Discipline::Planning);
        let d: Discipline = serde_json::from_str("\"\"").unwrap();
        assert_eq!(d, Discipline::Unset);
    }

    #[test]
    fn filled_skips_blank_entries() {
        let list = vec!["".to_string(), "Build road".to_string(), "  ".to_string()];
        assert_eq!(filled(&list).collect::<Vec<_>>(), vec!["Build road"]);
    }
}
