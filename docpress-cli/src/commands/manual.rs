use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use client::App;
use shared::models::{
    ManualSection, SectionCreateRequest, SectionReorderRequest, SectionUpdateRequest,
};

use super::print_json;

/// Section body given inline or read from a Markdown file.
#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct BodyArgs {
    /// Markdown body
    #[arg(long)]
    body: Option<String>,
    /// Read the Markdown body from a file
    #[arg(long)]
    body_file: Option<PathBuf>,
}

impl BodyArgs {
    fn resolve(self) -> Result<Option<String>> {
        match (self.body, self.body_file) {
            (Some(body), _) => Ok(Some(body)),
            (None, Some(path)) => fs::read_to_string(&path)
                .map(Some)
                .with_context(|| format!("failed to read {}", path.display())),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ManualCommand {
    /// List the sections of a manual project
    List {
        project_id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Print one section
    Show { section_id: i64 },
    /// Append a section to a manual project
    Add {
        project_id: i64,
        #[arg(long)]
        title: String,
        #[command(flatten)]
        body: BodyArgs,
        /// Uploaded image shown with the section
        #[arg(long)]
        image: Option<i64>,
    },
    /// Change a section's title, body, or image
    Edit {
        section_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        body: BodyArgs,
        #[arg(long)]
        image: Option<i64>,
    },
    /// Delete a section
    Delete { section_id: i64 },
    /// Set the order of a project's sections
    Reorder {
        project_id: i64,
        /// Section ids in their new order
        #[arg(required = true)]
        section_ids: Vec<i64>,
    },
}

pub async fn run(app: &App, command: ManualCommand) -> Result<()> {
    let api = app.api();
    match command {
        ManualCommand::List { project_id, json } => {
            let sections = api
                .list_sections(project_id)
                .await
                .with_context(|| format!("failed to list sections of project {project_id}"))?;
            if json {
                return print_json(&sections);
            }
            if sections.is_empty() {
                println!("No sections yet.");
            }
            for section in &sections {
                println!("{:>3}. [{}] {}", section.order_index, section.id, section.title);
            }
        }
        ManualCommand::Show { section_id } => {
            let section = api
                .get_section(section_id)
                .await
                .with_context(|| format!("failed to load section {section_id}"))?;
            print_section(&section);
        }
        ManualCommand::Add {
            project_id,
            title,
            body,
            image,
        } => {
            let request = SectionCreateRequest {
                title,
                body_markdown: body.resolve()?.unwrap_or_default(),
                image_file_id: image,
            };
            let section = api
                .create_section(project_id, &request)
                .await
                .with_context(|| format!("failed to add a section to project {project_id}"))?;
            println!("Added section {} ({})", section.id, section.title);
        }
        ManualCommand::Edit {
            section_id,
            title,
            body,
            image,
        } => {
            let request = SectionUpdateRequest {
                title,
                body_markdown: body.resolve()?,
                image_file_id: image,
            };
            if request.is_empty() {
                bail!("nothing to change; pass --title, --body, --body-file, or --image");
            }
            let section = api
                .update_section(section_id, &request)
                .await
                .with_context(|| format!("failed to update section {section_id}"))?;
            println!("Updated section {} ({})", section.id, section.title);
        }
        ManualCommand::Delete { section_id } => {
            let message = api
                .delete_section(section_id)
                .await
                .with_context(|| format!("failed to delete section {section_id}"))?;
            println!("{message}");
        }
        ManualCommand::Reorder {
            project_id,
            section_ids,
        } => {
            let message = api
                .reorder_sections(project_id, &SectionReorderRequest::from_ids(&section_ids))
                .await
                .with_context(|| format!("failed to reorder sections of project {project_id}"))?;
            println!("{message}");
        }
    }
    Ok(())
}

fn print_section(section: &ManualSection) {
    println!("# {}", section.title);
    if let Some(image) = section.image_file_id {
        println!("(image: file {image})");
    }
    println!();
    println!("{}", section.body_markdown);
}
