use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use client::App;
use serde_json::Value;
use shared::models::{
    CodeOptions, ManualOptions, Project, ProjectCreateRequest, ProjectListQuery, ProjectType,
    ProjectUpdateRequest,
};

use super::print_json;

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    /// List your projects
    List {
        /// Only show projects of this type (code or manual)
        #[arg(long = "type")]
        project_type: Option<ProjectType>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Print the raw JSON payload
        #[arg(long)]
        json: bool,
    },
    /// Show one project and its configuration
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Create a project
    Create {
        #[arg(long)]
        name: String,
        /// Project type (code or manual)
        #[arg(long = "type", default_value = "code")]
        project_type: ProjectType,
        /// Manual template name
        #[arg(long)]
        template: Option<String>,
        /// Code layout, e.g. `single` or `two-column`
        #[arg(long)]
        layout: Option<String>,
    },
    /// Rename a project or replace its configuration
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// Configuration as a JSON document
        #[arg(long)]
        config: Option<String>,
    },
    /// Delete a project
    Delete { id: i64 },
    /// Render a project to PDF synchronously
    ExportPdf {
        id: i64,
        /// Destination file
        #[arg(long, short)]
        output: PathBuf,
        /// Export options as a JSON document
        #[arg(long)]
        options: Option<String>,
    },
}

pub async fn run(app: &App, command: ProjectsCommand) -> Result<()> {
    let api = app.api();
    match command {
        ProjectsCommand::List {
            project_type,
            page,
            page_size,
            json,
        } => {
            let query = ProjectListQuery {
                project_type,
                page,
                page_size,
            };
            let listing = api
                .list_projects(&query)
                .await
                .context("failed to list projects")?;
            if json {
                return print_json(&listing.projects);
            }
            if listing.projects.is_empty() {
                println!("No projects found.");
                return Ok(());
            }
            println!("{:>6}  {:<7}  {:<17}  NAME", "ID", "TYPE", "UPDATED");
            for project in &listing.projects {
                println!(
                    "{:>6}  {:<7}  {:<17}  {}",
                    project.id,
                    project.project_type.to_string(),
                    project.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                    project.project_name
                );
            }
            println!(
                "page {} of {} ({} projects)",
                listing.page,
                listing.total_pages.max(1),
                listing.total
            );
        }
        ProjectsCommand::Show { id, json } => {
            let project = api
                .get_project(id)
                .await
                .with_context(|| format!("failed to load project {id}"))?;
            if json {
                return print_json(&project);
            }
            print_project(&project)?;
        }
        ProjectsCommand::Create {
            name,
            project_type,
            template,
            layout,
        } => {
            let mut request = ProjectCreateRequest::new(name, project_type);
            match project_type {
                ProjectType::Code => {
                    request.code_options = layout.map(|layout| CodeOptions {
                        layout,
                        ..CodeOptions::default()
                    });
                }
                ProjectType::Manual => {
                    request.manual_options = template.map(|template| ManualOptions {
                        template,
                        ..ManualOptions::default()
                    });
                }
            }
            let created = api
                .create_project(&request)
                .await
                .context("failed to create project")?;
            println!(
                "Created project {} ({})",
                created.project_id, created.project_name
            );
        }
        ProjectsCommand::Update { id, name, config } => {
            let config_json = config.as_deref().map(parse_json).transpose()?;
            let request = ProjectUpdateRequest {
                project_name: name,
                config_json,
            };
            if request.project_name.is_none() && request.config_json.is_none() {
                bail!("nothing to update; pass --name and/or --config");
            }
            let project = api
                .update_project(id, &request)
                .await
                .with_context(|| format!("failed to update project {id}"))?;
            println!("Updated project {} ({})", project.id, project.project_name);
        }
        ProjectsCommand::Delete { id } => {
            let message = api
                .delete_project(id)
                .await
                .with_context(|| format!("failed to delete project {id}"))?;
            println!("{message}");
        }
        ProjectsCommand::ExportPdf {
            id,
            output,
            options,
        } => {
            let options = options
                .as_deref()
                .map(parse_json)
                .transpose()?
                .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
            let pdf = api
                .export_project_pdf(id, &options)
                .await
                .with_context(|| format!("failed to export project {id}"))?;
            fs::write(&output, &pdf)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Wrote {} bytes to {}", pdf.len(), output.display());
        }
    }
    Ok(())
}

fn print_project(project: &Project) -> Result<()> {
    println!("{} (id {})", project.project_name, project.id);
    println!("type: {}", project.project_type);
    println!("created: {}", project.created_at.format("%Y-%m-%d %H:%M"));
    println!("updated: {}", project.updated_at.format("%Y-%m-%d %H:%M"));
    let config = project.config();
    if !config.is_null() {
        println!("config:");
        print_json(&config)?;
    }
    Ok(())
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("expected a JSON document")
}
