//! Output rendering and formatting

use apkm_state::{InstallRecord, RecordedError};
use apkm_types::{ColorChoice, InstallId, SessionState};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use serde::Serialize;
use std::io;

/// Outcome of an `install` command
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub install_id: Option<InstallId>,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RecordedError>,
    /// Whether the app was launched afterwards
    pub launched: bool,
}

/// Result of a CLI command, ready for rendering
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CommandResult {
    Install(InstallReport),
    Records(Vec<InstallRecord>),
    Record(Box<InstallRecord>),
    Launched { package: String, launched: bool },
    Success(String),
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render command result
    pub fn render_result(&self, result: &CommandResult) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match result {
            CommandResult::Install(report) => self.render_install_report(report),
            CommandResult::Records(records) => self.render_records(records),
            CommandResult::Record(record) => self.render_record(record),
            CommandResult::Launched { package, launched } => {
                if *launched {
                    println!("Launched {package}");
                } else {
                    println!("{package} has no launcher activity");
                }
                Ok(())
            }
            CommandResult::Success(message) => {
                println!("{message}");
                Ok(())
            }
        }
    }

    fn render_install_report(&self, report: &InstallReport) -> io::Result<()> {
        println!();
        match &report.state {
            SessionState::Success => {
                println!("{}", self.styled("[OK] Installation complete", &Style::new().green().bold()));
                if report.launched {
                    println!("App launched.");
                }
            }
            SessionState::CloseScreen => {
                println!("{}", self.styled("Installation cancelled", &Style::new().yellow()));
            }
            SessionState::Failed { .. } => {
                println!("{}", self.styled("[ERROR] Installation failed", &Style::new().red().bold()));
                if let Some(error) = &report.error {
                    render_recorded_error(error);
                }
            }
            SessionState::Working => println!("Installation still in progress"),
        }
        if let Some(id) = report.install_id {
            println!("Install id: {id}");
        }
        Ok(())
    }

    fn render_records(&self, records: &[InstallRecord]) -> io::Result<()> {
        if records.is_empty() {
            println!("No installation records found.");
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("Install ID").add_attribute(Attribute::Bold),
            Cell::new("Started").add_attribute(Attribute::Bold),
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Duration").add_attribute(Attribute::Bold),
            Cell::new("Result").add_attribute(Attribute::Bold),
        ]);

        for record in records {
            table.add_row(vec![
                Cell::new(record.id),
                Cell::new(record.started_at.format("%Y-%m-%d %H:%M:%S")),
                Cell::new(&record.options.package_name),
                Cell::new(format!("{}ms", record.duration_ms)),
                self.result_cell(record),
            ]);
        }

        println!("{table}");
        Ok(())
    }

    fn render_record(&self, record: &InstallRecord) -> io::Result<()> {
        println!("{}", self.styled(&format!("Installation {}", record.id), &Style::new().bold()));
        println!("Started:  {}", record.started_at.to_rfc3339());
        println!("Duration: {}ms", record.duration_ms);
        println!(
            "Package:  {} ({})",
            record.options.package_name, record.options.app_name
        );
        println!("Channel:  {}", record.options.version_preference);
        println!(
            "Host:     apkm {} on {}/{}",
            record.environment.app_version, record.environment.os, record.environment.arch
        );
        println!();
        print!("{}", record.log);
        if !record.log.ends_with('\n') {
            println!();
        }
        if let Some(error) = &record.error {
            println!();
            render_recorded_error(error);
        }
        Ok(())
    }

    fn result_cell(&self, record: &InstallRecord) -> Cell {
        let (label, color) = match &record.error {
            None => ("success", Color::Green),
            Some(e) if e.aborted => ("cancelled", Color::Yellow),
            Some(e) if e.insufficient_storage => ("no storage", Color::Red),
            Some(_) => ("failed", Color::Red),
        };
        let cell = Cell::new(label);
        if self.supports_color() {
            cell.fg(color)
        } else {
            cell
        }
    }

    fn styled(&self, text: &str, style: &Style) -> String {
        if self.supports_color() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn render_recorded_error(error: &RecordedError) {
    println!("  {}", error.message);
    if let Some(code) = &error.code {
        println!("  Code: {code}");
    }
    if let Some(hint) = &error.hint {
        println!("  Hint: {hint}");
    }
}
