use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use draftdesk::config::EditorConfig;
use draftdesk::download::DirectorySink;
use draftdesk::editor::{DispatchOutcome, Editor, ExportOutcome, LoadOutcome, SkipReason};
use draftdesk::models::{ExportFormat, FeedbackAction, ProjectId, SectionId};

#[derive(Parser)]
#[command(name = "draftdesk")]
#[command(about = "Refine, review and export AI-generated documents")]
struct Cli {
    /// Document service base URL (overrides DRAFTDESK_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Session token (overrides DRAFTDESK_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the project with its sections and counters
    Show { project: ProjectId },
    /// Rewrite a section according to an instruction
    Refine {
        project: ProjectId,
        section: SectionId,
        instruction: String,
    },
    /// Like a section
    Like {
        project: ProjectId,
        section: SectionId,
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Dislike a section
    Dislike {
        project: ProjectId,
        section: SectionId,
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Download the project as a document
    Export {
        project: ProjectId,
        /// docx or pptx; defaults to the project's own type
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },
}

impl Commands {
    fn project(&self) -> ProjectId {
        match *self {
            Self::Show { project }
            | Self::Refine { project, .. }
            | Self::Like { project, .. }
            | Self::Dislike { project, .. }
            | Self::Export { project, .. } => project,
        }
    }
}

/// Initialize tracing with output to stderr so stdout only carries the document.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "draftdesk=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = EditorConfig::load();
    if let Some(url) = cli.url {
        config.base_url = url;
    }
    if let Some(token) = cli.token {
        config.token = Some(token);
    }

    let client = config.client()?;
    let sink = DirectorySink::new(config.download_dir.clone());
    let editor = Editor::new(cli.command.project(), Arc::new(client), Arc::new(sink));

    if let LoadOutcome::Failed(error) = editor.mount().await {
        eprintln!("{}", error);
        return Ok(ExitCode::FAILURE);
    }

    let is_export = matches!(cli.command, Commands::Export { .. });
    let ok = match cli.command {
        Commands::Show { .. } => true,
        Commands::Refine {
            section,
            instruction,
            ..
        } => {
            editor.set_refinement(section, instruction);
            report(editor.refine(section).await)
        }
        Commands::Like {
            section, comment, ..
        } => {
            editor.set_comment(section, comment.unwrap_or_default());
            report(editor.feedback(section, FeedbackAction::Like).await)
        }
        Commands::Dislike {
            section, comment, ..
        } => {
            editor.set_comment(section, comment.unwrap_or_default());
            report(editor.feedback(section, FeedbackAction::Dislike).await)
        }
        Commands::Export { format, .. } => {
            let outcome = match format {
                Some(format) => editor.export(format).await,
                None => editor.export_native().await,
            };
            match outcome {
                ExportOutcome::Saved(path) => {
                    println!("Saved {}", path.display());
                    true
                }
                ExportOutcome::Skipped(reason) => {
                    eprintln!("Export skipped: {:?}", reason);
                    false
                }
                ExportOutcome::Failed(alert) => {
                    eprintln!("{}", alert);
                    false
                }
            }
        }
    };

    if !is_export {
        editor.take_alerts();
        print!("{}", editor.view());
    }

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn report(outcome: DispatchOutcome) -> bool {
    match outcome {
        DispatchOutcome::Completed { reload } => {
            if let LoadOutcome::Failed(error) = reload {
                eprintln!("Saved, but reloading failed: {}", error);
            }
            true
        }
        DispatchOutcome::Skipped(SkipReason::EmptyDraft) => {
            eprintln!("Nothing to submit: the instruction is empty");
            false
        }
        DispatchOutcome::Skipped(reason) => {
            eprintln!("Skipped: {:?}", reason);
            false
        }
        DispatchOutcome::Failed(alert) => {
            eprintln!("{}", alert);
            false
        }
    }
}
