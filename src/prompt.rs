//! Interactive terminal front-end for the project wizard.

use chrono::{Local, NaiveDate};
use inquire::validator::Validation;
use inquire::{DateSelect, InquireError, MultiSelect, Select, Text};
use tracing::warn;

use crate::project::export::{print_html, save_json, FileExporter, PrintSink};
use crate::project::model::{Discipline, ProjectConfig, ProjectPatch, RiskLevel, CURRENCIES};
use crate::project::wizard::{missing_fields, Step, Wizard, WizardState};
use crate::project::Overview;

pub type PromptResult<T> = Result<T, InquireError>;

const DATE_FORMAT: &str = "%Y-%m-%d";

const OPT_CONTINUE: &str = "➡️  Continue";
const OPT_GENERATE: &str = "📄 Generate Overview";
const OPT_EDIT: &str = "✏️  Edit this step";
const OPT_BACK: &str = "⬅️  Back";
const OPT_RESET: &str = "♻️  Reset (discards everything)";
const OPT_QUIT: &str = "🚪 Quit";
const JUMP_PREFIX: &str = "↩️  Go to ";

const OPT_SAVE_JSON: &str = "💾 Save JSON";
const OPT_PRINT: &str = "🖨️  Print";
const OPT_BACK_TO_FORM: &str = "⬅️  Back to Form";

enum Flow {
    Stay,
    Quit,
}

/// Drives the wizard until the user quits. Cancelling a prompt (Esc / Ctrl-C)
/// also ends the session.
pub fn run_wizard(wizard: &mut Wizard, exporter: &dyn FileExporter, sink: &dyn PrintSink) -> PromptResult<()> {
    let mut edit = true;
    loop {
        let flow = match wizard.state() {
            WizardState::Editing(step) => {
                print_step_indicator(step);
                if edit {
                    edit_step(step, wizard.config_mut())?;
                }
                let (flow, edit_next) = navigate(wizard, step)?;
                edit = edit_next;
                flow
            }
            WizardState::Overview => {
                edit = false;
                overview_menu(wizard, exporter, sink)?
            }
        };
        if let Flow::Quit = flow {
            return Ok(());
        }
    }
}

fn print_step_indicator(current: Step) {
    let line: Vec<String> = Step::ALL
        .iter()
        .map(|s| {
            if *s == current {
                format!("[{}]", s)
            } else if *s < current {
                format!("✅ {}", s.label())
            } else {
                s.to_string()
            }
        })
        .collect();
    println!("\n{}", line.join("  ›  "));
}

fn edit_step(step: Step, config: &mut ProjectConfig) -> PromptResult<()> {
    match step {
        Step::Identity => edit_identity(config),
        Step::Scope => edit_scope(config),
        Step::Technical => edit_technical(config),
        Step::TeamAndMilestones => edit_team(config),
    }
}

// Returns the flow and whether the next step should open for editing.
fn navigate(wizard: &mut Wizard, step: Step) -> PromptResult<(Flow, bool)> {
    let missing = missing_fields(step, wizard.config());
    if !missing.is_empty() {
        println!("⚠️  Still required: {}", missing.join(", "));
    }

    let mut options = Vec::new();
    if missing.is_empty() {
        options.push(if step.is_last() { OPT_GENERATE } else { OPT_CONTINUE }.to_string());
    }
    options.push(OPT_EDIT.to_string());
    if step.prev().is_some() {
        options.push(OPT_BACK.to_string());
    }
    for earlier in Step::ALL.iter().filter(|s| **s < step) {
        options.push(format!("{JUMP_PREFIX}{earlier}"));
    }
    options.push(OPT_RESET.to_string());
    options.push(OPT_QUIT.to_string());

    let choice = Select::new("Next:", options).prompt()?;
    let result = match choice.as_str() {
        OPT_CONTINUE => (Flow::Stay, wizard.next()),
        OPT_GENERATE => {
            wizard.generate_overview();
            (Flow::Stay, false)
        }
        OPT_EDIT => (Flow::Stay, true),
        OPT_BACK => (Flow::Stay, wizard.back()),
        OPT_RESET => {
            wizard.reset();
            println!("♻️  Form cleared.");
            (Flow::Stay, true)
        }
        OPT_QUIT => (Flow::Quit, false),
        other => {
            let target = Step::ALL
                .iter()
                .copied()
                .find(|s| other.strip_prefix(JUMP_PREFIX) == Some(s.to_string().as_str()));
            match target {
                Some(target) => (Flow::Stay, wizard.jump_to(target)),
                None => (Flow::Stay, false),
            }
        }
    };
    Ok(result)
}

fn overview_menu(wizard: &mut Wizard, exporter: &dyn FileExporter, sink: &dyn PrintSink) -> PromptResult<Flow> {
    let overview = Overview::from_config(wizard.config(), Local::now().date_naive());
    println!("\n{}", overview.render_table());

    let options = vec![OPT_SAVE_JSON, OPT_PRINT, OPT_BACK_TO_FORM, OPT_QUIT];
    match Select::new("Overview:", options).prompt()? {
        OPT_SAVE_JSON => match save_json(exporter, wizard.config()) {
            Ok(path) => println!("✅ Saved: {}", path.display()),
            Err(e) => println!("❌ Could not save: {e}"),
        },
        OPT_PRINT => {
            let printed = overview
                .render_html()
                .map_err(|e| e.to_string())
                .and_then(|html| print_html(exporter, sink, wizard.config(), &html).map_err(|e| e.to_string()));
            match printed {
                Ok(path) => println!("🖨️  Opened for printing: {}", path.display()),
                Err(e) => {
                    warn!(error = %e, "print failed");
                    println!("❌ Could not print: {e}");
                }
            }
        }
        OPT_BACK_TO_FORM => {
            wizard.back_to_form();
        }
        _ => return Ok(Flow::Quit),
    }
    Ok(Flow::Stay)
}

// ==========================================
// Step editors
// ==========================================

fn text(prompt: &str, current: &str) -> PromptResult<String> {
    Ok(Text::new(prompt).with_initial_value(current).prompt()?.trim().to_string())
}

fn date(prompt: &str, current: &str) -> PromptResult<String> {
    let default = NaiveDate::parse_from_str(current, DATE_FORMAT).unwrap_or_else(|_| Local::now().date_naive());
    let picked = DateSelect::new(prompt).with_default(default).prompt()?;
    Ok(picked.format(DATE_FORMAT).to_string())
}

fn edit_identity(config: &mut ProjectConfig) -> PromptResult<()> {
    println!("\n--- Project Identity ---");

    let cursor = Discipline::ALL.iter().position(|d| *d == config.discipline).unwrap_or(0);
    let discipline = Select::new("Engineering Discipline:", Discipline::ALL.to_vec())
        .with_starting_cursor(cursor)
        .prompt()?;

    let mut patch = ProjectPatch {
        discipline: Some(discipline),
        project_name: Some(text("Project Name (Required):", &config.project_name)?),
        project_ref: Some(text("Project Reference No. (Optional):", &config.project_ref)?),
        client_name: Some(text("Client Name (Required):", &config.client_name)?),
        location: Some(text("Project Location (Required):", &config.location)?),
        phone: Some(text("Contact Phone Number (Required):", &config.phone)?),
        start_date: Some(date("Start Date:", &config.start_date)?),
        ..ProjectPatch::default()
    };

    let end_prompt = if config.end_date.is_empty() {
        "Set an estimated completion date?"
    } else {
        "Change the estimated completion date?"
    };
    if inquire::Confirm::new(end_prompt).with_default(config.end_date.is_empty()).prompt()? {
        patch.end_date = Some(date("Estimated Completion Date:", &config.end_date)?);
    }

    config.apply(patch);
    Ok(())
}

fn edit_scope(config: &mut ProjectConfig) -> PromptResult<()> {
    println!("\n--- Scope & Objectives ---");
    let description = text("Project Description (Required):", &config.description)?;
    config.apply(ProjectPatch { description: Some(description), ..ProjectPatch::default() });

    loop {
        match list_action("Project Objectives", &config.objectives)? {
            ListAction::Add => config.add_objective(),
            ListAction::Edit(i) => {
                let value = text(&format!("Objective {}:", i + 1), &config.objectives[i])?;
                config.update_objective(i, &value);
            }
            ListAction::Remove(i) => {
                config.remove_objective(i);
            }
            ListAction::Done => break,
        }
    }

    let exclusions = text("Exclusions / Out of Scope (Optional):", &config.exclusions)?;
    let constraints = text("Assumptions & Constraints (Optional):", &config.constraints)?;
    config.apply(ProjectPatch {
        exclusions: Some(exclusions),
        constraints: Some(constraints),
        ..ProjectPatch::default()
    });
    Ok(())
}

fn edit_technical(config: &mut ProjectConfig) -> PromptResult<()> {
    println!("\n--- Technical Details ---");
    let budget = Text::new("Project Budget (Required):")
        .with_initial_value(&config.budget)
        .with_validator(|input: &str| {
            let cleaned = input.replace(',', "");
            if cleaned.trim().is_empty() || cleaned.trim().parse::<f64>().is_ok() {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid("Enter a number, e.g. 1500000.00".into()))
            }
        })
        .prompt()?;

    let currencies = CURRENCIES.to_vec();
    let cursor = currencies.iter().position(|c| *c == config.currency).unwrap_or(0);
    let currency = Select::new("Currency:", currencies).with_starting_cursor(cursor).prompt()?;

    let cursor = RiskLevel::ALL.iter().position(|r| *r == config.risk_level).unwrap_or(0);
    let risk = Select::new("Risk Level:", RiskLevel::ALL.to_vec()).with_starting_cursor(cursor).prompt()?;

    let catalogue = config.discipline.standards();
    let standards = if catalogue.is_empty() {
        Vec::new()
    } else {
        let selected: Vec<usize> = catalogue
            .iter()
            .enumerate()
            .filter(|(_, s)| config.standards.iter().any(|c| c == *s))
            .map(|(i, _)| i)
            .collect();
        MultiSelect::new("Applicable Standards & Codes:", catalogue.to_vec())
            .with_default(&selected)
            .prompt()?
            .into_iter()
            .map(str::to_string)
            .collect()
    };

    config.apply(ProjectPatch {
        budget: Some(budget.trim().to_string()),
        currency: Some(currency.to_string()),
        risk_level: Some(risk),
        standards: Some(standards),
        ..ProjectPatch::default()
    });

    loop {
        match list_action("Key Deliverables", &config.deliverables)? {
            ListAction::Add => config.add_deliverable(),
            ListAction::Edit(i) => {
                let value = text(&format!("Deliverable {}:", i + 1), &config.deliverables[i])?;
                config.update_deliverable(i, &value);
            }
            ListAction::Remove(i) => {
                config.remove_deliverable(i);
            }
            ListAction::Done => break,
        }
    }
    Ok(())
}

fn edit_team(config: &mut ProjectConfig) -> PromptResult<()> {
    println!("\n--- Team & Milestones ---");

    loop {
        let rows: Vec<String> = config
            .team
            .iter()
            .map(|m| if m.role.is_empty() { m.name.clone() } else { format!("{} ({})", m.name, m.role) })
            .collect();
        match list_action("Project Team", &rows)? {
            ListAction::Add => {
                config.add_team_member();
            }
            ListAction::Edit(i) => {
                let member = config.team[i].clone();
                let name = text("Full Name:", &member.name)?;
                let role = text("Role / Designation:", &member.role)?;
                config.update_team_member(&member.id, Some(&name), Some(&role));
            }
            ListAction::Remove(i) => {
                let id = config.team[i].id.clone();
                config.remove_team_member(&id);
            }
            ListAction::Done => break,
        }
    }

    loop {
        let rows: Vec<String> = config
            .milestones
            .iter()
            .map(|m| if m.duration.is_empty() { m.name.clone() } else { format!("{} · {}", m.name, m.duration) })
            .collect();
        match list_action("Project Milestones", &rows)? {
            ListAction::Add => {
                config.add_milestone();
            }
            ListAction::Edit(i) => {
                let current = config.milestones[i].clone();
                let name = text("Milestone Name:", &current.name)?;
                let duration = text("Duration (e.g. 4 weeks):", &current.duration)?;
                let deliverable = text("Key Deliverable:", &current.deliverable)?;
                config.update_milestone(&current.id, |m| {
                    m.name = name;
                    m.duration = duration;
                    m.deliverable = deliverable;
                });
            }
            ListAction::Remove(i) => {
                let id = config.milestones[i].id.clone();
                config.remove_milestone(&id);
            }
            ListAction::Done => break,
        }
    }

    let notes = text("Additional Notes (Optional):", &config.notes)?;
    config.apply(ProjectPatch { notes: Some(notes), ..ProjectPatch::default() });
    Ok(())
}

// ==========================================
// List editing
// ==========================================

enum ListAction {
    Add,
    Edit(usize),
    Remove(usize),
    Done,
}

fn list_action(title: &str, rows: &[String]) -> PromptResult<ListAction> {
    println!("\n{title}:");
    for (i, row) in rows.iter().enumerate() {
        let shown = if row.trim().is_empty() { "(empty)" } else { row.as_str() };
        println!("  {}. {}", i + 1, shown);
    }

    let mut options = vec!["✅ Done".to_string(), "➕ Add".to_string()];
    for i in 0..rows.len() {
        options.push(format!("✏️  Edit {}", i + 1));
    }
    // The last remaining row cannot be removed.
    if rows.len() > 1 {
        for i in 0..rows.len() {
            options.push(format!("🗑️  Remove {}", i + 1));
        }
    }

    let choice = Select::new(&format!("{title}:"), options).with_page_size(10).prompt()?;
    let index = |prefix: &str| {
        choice
            .strip_prefix(prefix)
            .and_then(|n| n.trim().parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .filter(|i| *i < rows.len())
    };

    let action = if choice.starts_with("➕") {
        ListAction::Add
    } else if let Some(i) = index("✏️  Edit") {
        ListAction::Edit(i)
    } else if let Some(i) = index("🗑️  Remove") {
        ListAction::Remove(i)
    } else {
        ListAction::Done
    };
    Ok(action)
}
