//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use accord_core::{SurveySchema, SessionView};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the survey schema: sections and their fields
    pub fn print_schema(&self, schema: &SurveySchema) {
        match self.format {
            OutputFormat::Human => {
                for section in schema.sections() {
                    println!("{} ({})", section.title, section.id);
                    for field in schema.fields().iter().filter(|f| f.section == section.id) {
                        let marker = if field.required { "*" } else { " " };
                        println!("  {} {:<24} {:?}", marker, field.key, field.kind);
                    }
                    println!();
                }
                println!("* = required for section completion");
            }
            OutputFormat::Json => {
                let sections: Vec<_> = schema
                    .sections()
                    .iter()
                    .map(|section| {
                        let fields: Vec<_> = schema
                            .fields()
                            .iter()
                            .filter(|f| f.section == section.id)
                            .map(|f| {
                                serde_json::json!({
                                    "key": f.key,
                                    "kind": format!("{:?}", f.kind),
                                    "required": f.required,
                                })
                            })
                            .collect();
                        serde_json::json!({
                            "id": section.id,
                            "title": section.title,
                            "fields": fields,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&sections).unwrap());
            }
            OutputFormat::Quiet => {
                for section in schema.sections() {
                    println!("{}", section.id);
                }
            }
        }
    }

    /// Print a completion report: per-section flags plus progress
    pub fn print_completion(&self, sections: &[(String, String, bool)], progress: u8) {
        match self.format {
            OutputFormat::Human => {
                for (_, title, completed) in sections {
                    let mark = if *completed { "✓" } else { "·" };
                    println!("{} {}", mark, title);
                }
                println!("\nProgress: {}%", progress);
            }
            OutputFormat::Json => {
                let json_sections: Vec<_> = sections
                    .iter()
                    .map(|(id, title, completed)| {
                        serde_json::json!({"id": id, "title": title, "completed": completed})
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(
                        &serde_json::json!({"sections": json_sections, "progress": progress})
                    )
                    .unwrap()
                );
            }
            OutputFormat::Quiet => {
                println!("{}", progress);
            }
        }
    }

    /// Print one line of session state during the demo
    pub fn print_session_state(&self, label: &str, view: &SessionView) {
        match self.format {
            OutputFormat::Human => {
                println!(
                    "{:<28} status={:<7} progress={}% approvals={}",
                    label,
                    view.save_status.to_string(),
                    view.calculate_progress(),
                    view.project.approval_count(),
                );
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "label": label,
                        "status": view.save_status,
                        "progress": view.calculate_progress(),
                        "approvals": view.project.approval_count(),
                    })
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }
}
