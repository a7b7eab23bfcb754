//! Accord CLI
//!
//! Command-line companion to `accord-core`: inspect the survey schema,
//! validate an exported project document, normalize a survey payload,
//! and run a scripted demo session against the in-memory store.

mod output;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use accord_core::{
    spawn_session, Config, Editor, FieldValue, FormState, MemoryStore, Project, SessionConfig,
    SessionEvent, SurveySchema,
};
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "accord")]
#[command(version, about = "Collaborative survey sync for cofounder agreements")]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the survey schema: sections, fields, and requiredness
    Schema,

    /// Check a project document for section completion and progress
    Check {
        /// Path to a project JSON file
        path: PathBuf,
    },

    /// Normalize a project's survey data and print the result
    Normalize {
        /// Path to a project JSON file
        path: PathBuf,
    },

    /// Run a scripted editing session against an in-memory store
    Demo {
        /// Debounce window in milliseconds (overrides config)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let out = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match cli.command {
        Commands::Schema => {
            out.print_schema(&SurveySchema::cofounder_agreement());
            Ok(())
        }
        Commands::Check { path } => check_project(&out, &path),
        Commands::Normalize { path } => normalize_project(&out, &path),
        Commands::Demo { debounce_ms } => run_demo(&out, debounce_ms).await,
    }
}

fn load_project(path: &Path) -> Result<Project> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid project file {}", path.display()))
}

fn check_project(out: &Output, path: &Path) -> Result<()> {
    let schema = SurveySchema::cofounder_agreement();
    let project = load_project(path)?;
    let form = FormState::from_remote(&schema, &project.survey_data);

    let sections: Vec<(String, String, bool)> = schema
        .sections()
        .iter()
        .map(|section| {
            let completed = accord_core::validation::is_section_completed(
                &schema,
                &section.id,
                &form,
                &project.collaborators,
            );
            (section.id.clone(), section.title.clone(), completed)
        })
        .collect();

    let progress =
        accord_core::validation::calculate_progress(&schema, &form, &project.collaborators);
    out.print_completion(&sections, progress);
    Ok(())
}

fn normalize_project(out: &Output, path: &Path) -> Result<()> {
    let schema = SurveySchema::cofounder_agreement();
    let project = load_project(path)?;

    let normalized = schema.normalize(&schema.merged(&project.survey_data));
    match out.format {
        OutputFormat::Quiet => {}
        _ => println!("{}", serde_json::to_string_pretty(&normalized)?),
    }
    Ok(())
}

/// Scripted session against the in-memory store
///
/// Edits a few fields, waits for the debounced write to land, then
/// shows that a second identical save leaves approvals untouched.
async fn run_demo(out: &Output, debounce_ms: Option<u64>) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let mut session_config = config.session_config();
    if let Some(ms) = debounce_ms {
        session_config = SessionConfig {
            debounce: Duration::from_millis(ms),
            ..session_config
        };
    }
    debug!(debounce_ms = session_config.debounce.as_millis() as u64, "starting demo session");

    let store = MemoryStore::new();
    let mut project = Project::new(vec![
        "alice@example.com".to_string(),
        "bob@example.com".to_string(),
    ])
    .with_required_approvals();
    project.approvals.insert("bob@example.com".to_string(), true);
    let project_id = project.id;
    store.insert(project);

    let editor = Editor::new("alice@example.com", "Alice");
    let mut handle = spawn_session(
        store.clone(),
        project_id,
        editor,
        SurveySchema::cofounder_agreement(),
        session_config,
    )
    .context("failed to open sync session")?;

    out.message("Editing company section...");
    handle
        .edit("companyName", FieldValue::Text("Acme Robotics".to_string()))
        .await;
    handle
        .edit("entityType", FieldValue::Choice("LLC".to_string()))
        .await;
    handle
        .edit(
            "stateOfFormation",
            FieldValue::Choice("Delaware".to_string()),
        )
        .await;
    out.print_session_state("after edits", &handle.view());

    wait_for_save(&mut handle).await?;
    out.print_session_state("after debounced save", &handle.view());

    out.message("Flushing an identical payload...");
    handle
        .edit("companyName", FieldValue::Text("Acme Robotics".to_string()))
        .await;
    handle.flush().await;
    wait_for_save(&mut handle).await?;
    out.print_session_state("after no-op save", &handle.view());

    handle.shutdown().await;
    out.success(&format!("demo complete ({} store writes)", store.update_count()));
    Ok(())
}

/// Block until the session reports a terminal save status
async fn wait_for_save(handle: &mut accord_core::SessionHandle) -> Result<()> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let event = tokio::time::timeout_at(deadline, handle.event_rx.recv())
            .await
            .context("timed out waiting for save")?;
        match event {
            Some(SessionEvent::SaveStatusChanged(status)) if status.is_terminal() => {
                return Ok(());
            }
            Some(SessionEvent::SyncError(err)) => {
                anyhow::bail!("sync error: {err}");
            }
            Some(_) => continue,
            None => anyhow::bail!("session closed unexpectedly"),
        }
    }
}
