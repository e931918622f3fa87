//! Term template CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use termhub_core::config::AppConfig;
use termhub_core::error::AppError;
use termhub_core::types::id::{TemplateId, UserId};
use termhub_entity::template::{CreateTemplate, TermTemplate};

/// Arguments for template commands
#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Template subcommand
    #[command(subcommand)]
    pub command: TemplateCommand,
}

/// Template subcommands
#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// Create a template
    Create {
        /// Display title
        #[arg(long)]
        title: String,
        /// Version label
        #[arg(long)]
        version: String,
        /// Agreement text
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,
        /// Read the agreement text from a file
        #[arg(long)]
        content_file: Option<String>,
        /// Make it the active template
        #[arg(long)]
        activate: bool,
        /// Creating administrator
        #[arg(long)]
        created_by: Option<UserId>,
    },
    /// List all templates
    List,
    /// Make a template the active one
    Activate {
        /// Template ID
        id: TemplateId,
    },
    /// Show a template, or the active one
    Show {
        /// Template ID (defaults to the active template)
        id: Option<TemplateId>,
    },
    /// Delete a template no term references
    Delete {
        /// Template ID
        id: TemplateId,
    },
}

/// Template display row for table output
#[derive(Debug, Serialize, Tabled)]
struct TemplateRow {
    /// Template ID
    id: String,
    /// Title
    title: String,
    /// Version
    version: String,
    /// Active flag
    active: String,
    /// Created at
    created_at: String,
}

impl From<&TermTemplate> for TemplateRow {
    fn from(t: &TermTemplate) -> Self {
        Self {
            id: t.id.to_string(),
            title: t.title.clone(),
            version: t.version.clone(),
            active: if t.is_active { "yes" } else { "" }.to_string(),
            created_at: t.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute template commands
pub async fn execute(
    args: &TemplateArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::connect(config).await?;
    let templates = &services.templates;

    match &args.command {
        TemplateCommand::Create {
            title,
            version,
            content,
            content_file,
            activate,
            created_by,
        } => {
            let content = match (content, content_file) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => tokio::fs::read_to_string(path).await.map_err(|e| {
                    AppError::validation(format!("Failed to read content file '{path}': {e}"))
                })?,
                (None, None) => {
                    return Err(AppError::validation(
                        "either --content or --content-file is required",
                    ));
                }
            };

            let template = templates
                .create_template(CreateTemplate {
                    title: title.clone(),
                    content,
                    version: version.clone(),
                    make_active: *activate,
                    created_by: *created_by,
                })
                .await?;
            output::print_success(&format!("Template {} created", template.id));
            show(&template, format);
        }
        TemplateCommand::List => {
            let rows: Vec<TemplateRow> = templates.list().await?.iter().map(Into::into).collect();
            output::print_list(&rows, format);
        }
        TemplateCommand::Activate { id } => {
            let template = templates.set_active(*id).await?;
            output::print_success(&format!(
                "Template {} ({}) is now active",
                template.id, template.version
            ));
        }
        TemplateCommand::Show { id } => {
            let template = match id {
                Some(id) => templates.get(*id).await?,
                None => templates.get_active().await?,
            };
            show(&template, format);
        }
        TemplateCommand::Delete { id } => {
            templates.delete(*id).await?;
            output::print_success(&format!("Template {id} deleted"));
        }
    }

    Ok(())
}

fn show(template: &TermTemplate, format: OutputFormat) {
    output::print_record(
        &[
            ("ID", template.id.to_string()),
            ("Title", template.title.clone()),
            ("Version", template.version.clone()),
            ("Active", template.is_active.to_string()),
            ("Created by", output::or_dash(template.created_by)),
            ("Created at", template.created_at.to_rfc3339()),
            ("Content", template.content.clone()),
        ],
        template,
        format,
    );
}
