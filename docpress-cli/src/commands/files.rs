use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use client::App;
use shared::models::{FileOrder, ProjectFileUpdate};

use super::print_json;

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    /// Upload one or more local files
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Attach each uploaded file to this project
        #[arg(long)]
        project: Option<i64>,
    },
    /// List uploaded files
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete an uploaded file
    Delete { file_id: i64 },
    /// Show a file's contents as the exporter will highlight them
    Preview {
        file_id: i64,
        /// Force the highlight language
        #[arg(long)]
        language: Option<String>,
        /// Print highlighted HTML instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// Attach an uploaded file to a project
    Attach { project_id: i64, file_id: i64 },
    /// Detach a file from a project
    Detach { project_id: i64, file_id: i64 },
    /// List the files attached to a project, in export order
    ProjectList {
        project_id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Change how an attached file is exported
    Update {
        project_id: i64,
        file_id: i64,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        language: Option<String>,
        /// Include the file in exports (true or false)
        #[arg(long)]
        include: Option<bool>,
    },
    /// Set the export order of a project's files
    Reorder {
        project_id: i64,
        /// File ids in their new order
        #[arg(required = true)]
        file_ids: Vec<i64>,
    },
    /// Print the stylesheet used by highlighted previews
    Css,
}

pub async fn run(app: &App, command: FilesCommand) -> Result<()> {
    let api = app.api();
    match command {
        FilesCommand::Upload { paths, project } => {
            for path in paths {
                let receipt = api
                    .upload_file(&path)
                    .await
                    .with_context(|| format!("failed to upload {}", path.display()))?;
                println!(
                    "Uploaded {} as file {} ({} bytes)",
                    receipt.filename, receipt.file_id, receipt.file_size
                );
                if let Some(project_id) = project {
                    let file_id = receipt.file_id;
                    let message = api
                        .add_file_to_project(project_id, file_id)
                        .await
                        .with_context(|| {
                            format!("failed to attach file {file_id} to project {project_id}")
                        })?;
                    println!("{message}");
                }
            }
        }
        FilesCommand::List { json } => {
            let listing = api.list_files().await.context("failed to list files")?;
            if json {
                return print_json(&listing.files);
            }
            if listing.files.is_empty() {
                println!("No files uploaded.");
            }
            for file in &listing.files {
                println!(
                    "{:>6}  {:>9}  {:<10}  {}",
                    file.id,
                    file.file_size,
                    file.file_type,
                    file.original_filename
                );
            }
        }
        FilesCommand::Delete { file_id } => {
            let message = api
                .delete_file(file_id)
                .await
                .with_context(|| format!("failed to delete file {file_id}"))?;
            println!("{message}");
        }
        FilesCommand::Preview {
            file_id,
            language,
            html,
        } => {
            let preview = api
                .preview_file(file_id, language.as_deref())
                .await
                .with_context(|| format!("failed to preview file {file_id}"))?;
            eprintln!(
                "{} ({}, {} lines)",
                preview.filename, preview.language, preview.line_count
            );
            if html {
                println!("{}", preview.highlighted_html);
            } else {
                println!("{}", preview.content);
            }
        }
        FilesCommand::Attach {
            project_id,
            file_id,
        } => {
            let message = api
                .add_file_to_project(project_id, file_id)
                .await
                .with_context(|| format!("failed to attach file {file_id}"))?;
            println!("{message}");
        }
        FilesCommand::Detach {
            project_id,
            file_id,
        } => {
            let message = api
                .remove_file_from_project(project_id, file_id)
                .await
                .with_context(|| format!("failed to detach file {file_id}"))?;
            println!("{message}");
        }
        FilesCommand::ProjectList { project_id, json } => {
            let listing = api
                .project_files(project_id)
                .await
                .with_context(|| format!("failed to list files of project {project_id}"))?;
            if json {
                return print_json(&listing.files);
            }
            for file in &listing.files {
                let language = file.language_override.as_deref().unwrap_or("auto");
                let marker = if file.include_in_export { ' ' } else { '-' };
                println!(
                    "{marker}{:>3}  {:>6}  {:<10}  {}",
                    file.order_index, file.file_id, language, file.display_name
                );
            }
        }
        FilesCommand::Update {
            project_id,
            file_id,
            display_name,
            language,
            include,
        } => {
            let update = ProjectFileUpdate {
                display_name,
                language_override: language,
                include_in_export: include,
            };
            if update == ProjectFileUpdate::default() {
                bail!("nothing to update; pass --display-name, --language, or --include");
            }
            let message = api
                .update_project_file(project_id, file_id, &update)
                .await
                .with_context(|| format!("failed to update file {file_id}"))?;
            println!("{message}");
        }
        FilesCommand::Reorder {
            project_id,
            file_ids,
        } => {
            let orders: Vec<FileOrder> = file_ids
                .iter()
                .zip(0..)
                .map(|(&file_id, order_index)| FileOrder {
                    file_id,
                    order_index,
                })
                .collect();
            let message = api
                .reorder_project_files(project_id, &orders)
                .await
                .with_context(|| format!("failed to reorder files of project {project_id}"))?;
            println!("{message}");
        }
        FilesCommand::Css => {
            let css = api
                .highlight_css()
                .await
                .context("failed to fetch highlight stylesheet")?;
            println!("{}", css.css);
        }
    }
    Ok(())
}
