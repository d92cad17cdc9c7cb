//! The read-only overview document derived from a finished [`ProjectConfig`].

use chrono::NaiveDate;
use comfy_table::{Attribute, Cell, Color, Table};
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use super::model::{filled, ProjectConfig, RiskLevel};

const OVERVIEW_TEMPLATE: &str = include_str!("../../templates/overview.html.tera");
const DEFAULT_FOOTER_REF: &str = "VE-PROJECT";
const EMPTY_VALUE: &str = "—";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberedItem {
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamEntry {
    pub initial: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneEntry {
    pub number: usize,
    pub name: String,
    pub duration: Option<String>,
    pub deliverable: Option<String>,
}

/// Sections are `None`/empty when there is nothing to show for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub title: String,
    pub reference: Option<String>,
    pub phone: Option<String>,
    pub discipline: Option<&'static str>,
    pub risk: Option<String>,
    pub generated: String,
    pub cards: Vec<InfoCard>,
    pub description: Option<String>,
    pub objectives: Vec<NumberedItem>,
    pub exclusions: Option<String>,
    pub constraints: Option<String>,
    pub standards: Vec<String>,
    pub deliverables: Vec<NumberedItem>,
    pub team: Vec<TeamEntry>,
    pub milestones: Vec<MilestoneEntry>,
    pub notes: Option<String>,
    pub footer_ref: String,
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn numbered<'a>(items: impl Iterator<Item = &'a str>) -> Vec<NumberedItem> {
    items
        .enumerate()
        .map(|(i, text)| NumberedItem { number: i + 1, text: text.trim().to_string() })
        .collect()
}

impl Overview {
    pub fn from_config(config: &ProjectConfig, generated: NaiveDate) -> Self {
        let duration = match (non_empty(&config.start_date), non_empty(&config.end_date)) {
            (Some(start), Some(end)) => format!("{start} → {end}"),
            (Some(start), None) => start,
            _ => EMPTY_VALUE.to_string(),
        };
        let budget = if config.budget.is_empty() {
            EMPTY_VALUE.to_string()
        } else {
            format_currency(&config.budget, &config.currency)
        };

        let cards = vec![
            InfoCard {
                label: "Client",
                value: non_empty(&config.client_name).unwrap_or_else(|| EMPTY_VALUE.to_string()),
            },
            InfoCard {
                label: "Location",
                value: non_empty(&config.location).unwrap_or_else(|| EMPTY_VALUE.to_string()),
            },
            InfoCard { label: "Duration", value: duration },
            InfoCard { label: "Budget", value: budget },
        ];

        let team = config
            .team
            .iter()
            .filter(|m| !m.name.trim().is_empty())
            .map(|m| TeamEntry {
                initial: m.name.trim().chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default(),
                name: m.name.trim().to_string(),
                role: m.role.trim().to_string(),
            })
            .collect();

        let milestones = config
            .milestones
            .iter()
            .filter(|m| !m.name.trim().is_empty())
            .enumerate()
            .map(|(i, m)| MilestoneEntry {
                number: i + 1,
                name: m.name.trim().to_string(),
                duration: non_empty(&m.duration),
                deliverable: non_empty(&m.deliverable),
            })
            .collect();

        Self {
            title: non_empty(&config.project_name).unwrap_or_else(|| "Untitled Project".to_string()),
            reference: non_empty(&config.project_ref),
            phone: non_empty(&config.phone),
            discipline: config.discipline.is_set().then(|| config.discipline.label()),
            risk: (config.risk_level != RiskLevel::Unset).then(|| format!("{} Risk", config.risk_level)),
            generated: generated.format("%-d %B %Y").to_string(),
            cards,
            description: non_empty(&config.description),
            objectives: numbered(filled(&config.objectives)),
            exclusions: non_empty(&config.exclusions),
            constraints: non_empty(&config.constraints),
            standards: config.standards.clone(),
            deliverables: numbered(filled(&config.deliverables)),
            team,
            milestones,
            notes: non_empty(&config.notes),
            footer_ref: non_empty(&config.project_ref).unwrap_or_else(|| DEFAULT_FOOTER_REF.to_string()),
        }
    }

    /// Printable HTML. Print media hide the navigation chrome.
    pub fn render_html(&self) -> Result<String, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template("overview.html", OVERVIEW_TEMPLATE)?;
        let context = Context::from_serialize(self)?;
        Ok(tera.render("overview.html", &context)?)
    }

    /// Terminal rendering of the same document.
    pub fn render_table(&self) -> String {
        let mut table = Table::new();
        table.set_header(vec![
            Cell::new(&self.title).add_attribute(Attribute::Bold),
            Cell::new(self.reference.as_deref().map(|r| format!("Ref: {r}")).unwrap_or_default()),
        ]);

        let mut row = |label: &str, value: String| {
            table.add_row(vec![Cell::new(label).fg(Color::Rgb { r: 0, g: 102, b: 255 }), Cell::new(value)]);
        };

        if let Some(discipline) = self.discipline {
            row("Discipline", discipline.to_string());
        }
        if let Some(risk) = &self.risk {
            row("Risk", risk.clone());
        }
        if let Some(phone) = &self.phone {
            row("Tel", phone.clone());
        }
        row("Generated", self.generated.clone());
        for card in &self.cards {
            row(card.label, card.value.clone());
        }
        if let Some(description) = &self.description {
            row("Project Description", description.clone());
        }
        if !self.objectives.is_empty() {
            row("Project Objectives", list_lines(&self.objectives));
        }
        if let Some(exclusions) = &self.exclusions {
            row("Exclusions / Out of Scope", exclusions.clone());
        }
        if let Some(constraints) = &self.constraints {
            row("Assumptions & Constraints", constraints.clone());
        }
        if !self.standards.is_empty() {
            row("Applicable Standards & Codes", self.standards.join(", "));
        }
        if !self.deliverables.is_empty() {
            row("Key Deliverables", list_lines(&self.deliverables));
        }
        if !self.team.is_empty() {
            let lines: Vec<String> = self
                .team
                .iter()
                .map(|m| if m.role.is_empty() { m.name.clone() } else { format!("{} ({})", m.name, m.role) })
                .collect();
            row("Project Team", lines.join("\n"));
        }
        if !self.milestones.is_empty() {
            let lines: Vec<String> = self
                .milestones
                .iter()
                .map(|m| {
                    let mut line = format!("{}. {}", m.number, m.name);
                    for extra in [&m.duration, &m.deliverable].into_iter().flatten() {
                        line.push_str(" · ");
                        line.push_str(extra);
                    }
                    line
                })
                .collect();
            row("Project Milestones", lines.join("\n"));
        }
        if let Some(notes) = &self.notes {
            row("Additional Notes", notes.clone());
        }
        row("Footer", format!("{} · {}", self.footer_ref, self.generated));

        table.to_string()
    }
}

fn list_lines(items: &[NumberedItem]) -> String {
    items
        .iter()
        .map(|i| format!("{}. {}", i.number, i.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats a budget the way an en-ZA locale prints numbers: non-breaking space
/// for thousands, comma for decimals, at most three fraction digits.
///
/// Commas in the input are treated as grouping and removed. Anything that is
/// not a finite number afterwards yields `"<currency> 0"`.
pub fn format_currency(budget: &str, currency: &str) -> String {
    let cleaned: String = budget.chars().filter(|c| *c != ',').collect();
    match cleaned.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => format!("{currency} {}", group_en_za(n)),
        _ => format!("{currency} 0"),
    }
}

fn group_en_za(n: f64) -> String {
    // Ties round away from zero, as locale formatting does.
    let rounded = (n.abs() * 1000.0).round() / 1000.0;
    let rounded = if rounded.is_finite() { rounded } else { n.abs() };
    let fixed = format!("{rounded:.3}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::new();
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('\u{a0}');
        }
        out.push(*d);
    }
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    if n.is_sign_negative() && !is_zero {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::model::{Discipline, Milestone, TeamMember};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn sample() -> ProjectConfig {
        let mut cfg = ProjectConfig::default();
        cfg.project_name = "N1 Interchange Upgrade".into();
        cfg.project_ref = "VE-2026-001".into();
        cfg.client_name = "City of Tshwane".into();
        cfg.discipline = Discipline::Civil;
        cfg.location = "Pretoria".into();
        cfg.start_date = "2026-03-01".into();
        cfg.end_date = "2026-11-30".into();
        cfg.budget = "2500000".into();
        cfg.risk_level = RiskLevel::High;
        cfg.objectives = vec!["".into(), "Build road".into()];
        cfg.standards = vec!["TMH7".into()];
        cfg.team = vec![
            TeamMember { id: "a".into(), name: "".into(), role: "Surveyor".into() },
            TeamMember { id: "b".into(), name: "thandi".into(), role: "Lead".into() },
        ];
        cfg.milestones = vec![
            Milestone { id: "m0".into(), name: "".into(), duration: "1 week".into(), deliverable: "".into() },
            Milestone { id: "m1".into(), name: "Design".into(), duration: "4 weeks".into(), deliverable: "".into() },
        ];
        cfg
    }

    #[test]
    fn objectives_are_numbered_after_filtering() {
        let overview = Overview::from_config(&sample(), date());
        assert_eq!(
            overview.objectives,
            vec![NumberedItem { number: 1, text: "Build road".into() }]
        );
        assert!(overview.deliverables.is_empty());
    }

    #[test]
    fn unnamed_team_and_milestones_are_dropped() {
        let overview = Overview::from_config(&sample(), date());
        assert_eq!(overview.team.len(), 1);
        assert_eq!(overview.team[0].initial, "T");
        assert_eq!(overview.milestones.len(), 1);
        assert_eq!(overview.milestones[0].number, 1);
        assert_eq!(overview.milestones[0].duration.as_deref(), Some("4 weeks"));
        assert_eq!(overview.milestones[0].deliverable, None);
    }

    #[test]
    fn header_and_cards() {
        let overview = Overview::from_config(&sample(), date());
        assert_eq!(overview.generated, "16 October 2026");
        assert_eq!(overview.discipline, Some("Civil & Infrastructure"));
        assert_eq!(overview.risk.as_deref(), Some("High Risk"));
        assert_eq!(overview.footer_ref, "VE-2026-001");
        let values: Vec<&str> = overview.cards.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["City of Tshwane", "Pretoria", "2026-03-01 → 2026-11-30", "ZAR 2\u{a0}500\u{a0}000"]
        );
    }

    #[test]
    fn empty_config_falls_back() {
        let overview = Overview::from_config(&ProjectConfig::default(), date());
        assert_eq!(overview.title, "Untitled Project");
        assert_eq!(overview.footer_ref, "VE-PROJECT");
        assert!(overview.cards.iter().all(|c| c.value == "—"));
        assert!(overview.objectives.is_empty());
        assert!(overview.team.is_empty());
        assert!(overview.description.is_none());
        assert!(overview.risk.is_none());
        assert!(overview.discipline.is_none());
    }

    #[test]
    fn duration_with_start_only() {
        let mut cfg = sample();
        cfg.end_date.clear();
        let overview = Overview::from_config(&cfg, date());
        assert_eq!(overview.cards[2].value, "2026-03-01");
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency("1234567.5", "ZAR"), "ZAR 1\u{a0}234\u{a0}567,5");
        assert_eq!(format_currency("1,000", "USD"), "USD 1\u{a0}000");
        assert_eq!(format_currency("999", "EUR"), "EUR 999");
        assert_eq!(format_currency("0.1234", "GBP"), "GBP 0,123");
        assert_eq!(format_currency("-2500", "ZAR"), "ZAR -2\u{a0}500");
        assert_eq!(format_currency("abc", "ZAR"), "ZAR 0");
        assert_eq!(format_currency("", "ZAR"), "ZAR 0");
        assert_eq!(format_currency("inf", "ZAR"), "ZAR 0");
    }

    #[test]
    fn currency_ties_round_away_from_zero() {
        assert_eq!(format_currency("0.0625", "ZAR"), "ZAR 0,063");
        assert_eq!(format_currency("1234.5625", "ZAR"), "ZAR 1\u{a0}234,563");
        assert_eq!(format_currency("-0.0625", "ZAR"), "ZAR -0,063");
        assert_eq!(format_currency("0.0004", "ZAR"), "ZAR 0");
    }

    #[test]
    fn html_contains_sections_and_print_rule() {
        let html = Overview::from_config(&sample(), date()).render_html().unwrap();
        assert!(html.contains("@media print"));
        assert!(html.contains("N1 Interchange Upgrade"));
        assert!(html.contains("Project Objectives"));
        assert!(html.contains("Build road"));
        assert!(!html.contains("Key Deliverables"));
        assert!(!html.contains("Additional Notes"));
    }

    #[test]
    fn printed_html_keeps_reference_footer() {
        let html = Overview::from_config(&sample(), date()).render_html().unwrap();
        assert!(html.contains(r#"<div class="doc-footer"><span>VE-2026-001 · 16 October 2026</span></div>"#));
        assert!(!html.contains("<footer"));
        assert!(!html.contains("doc-footer { display: none"));
    }

    #[test]
    fn html_escapes_user_text() {
        let mut cfg = sample();
        cfg.notes = "<script>alert(1)</script>".into();
        let html = Overview::from_config(&cfg, date()).render_html().unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("Additional Notes"));
    }

    #[test]
    fn table_lists_filled_sections() {
        let table = Overview::from_config(&sample(), date()).render_table();
        assert!(table.contains("1. Build road"));
        assert!(table.contains("thandi (Lead)"));
        assert!(!table.contains("Key Deliverables"));
    }
}
