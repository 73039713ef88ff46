use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use intake_core::{FormDependencies, GrievanceForm};
use shared::domain::{Attachment, OrganizationType, ReferenceId};
use storage::{MemoryRecordStore, RecordStore, Storage};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url, MEMORY_STORE};

#[derive(Parser, Debug)]
#[command(name = "grievance", about = "Lodge and look up grievance reports")]
struct Cli {
    /// Overrides the configured store (`memory` or a SQLite path/URL).
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill in the grievance form and submit it.
    Submit {
        /// ngo, labor-officer or internal-committee
        #[arg(long)]
        org_type: Option<OrganizationType>,
        #[arg(long, default_value = "")]
        org_name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Evidence file; images, video, audio and PDF are accepted.
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
        /// Print the stored record as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show a submitted grievance by its reference id.
    Lookup { reference_id: String },
    /// List the organization types the form offers.
    OrgTypes,
    /// Check that the configured store is reachable.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Submit {
            org_type,
            org_name,
            description,
            attachments,
            json,
        } => {
            let store = open_store(&settings.database_url).await?;
            let mut form = GrievanceForm::new_with_dependencies(
                FormDependencies::new(store.clone())
                    .with_dictation_locale(settings.dictation_locale.clone()),
            );
            form.set_on_close(|| debug!("grievance form dismissed"));
            form.open();

            form.set_organization_type(org_type)?;
            form.set_organization_name(org_name)?;
            form.set_issue_description(description)?;

            let picked = attachments
                .iter()
                .map(|path| attachment_from_path(path))
                .collect::<Result<Vec<_>>>()?;
            let outcome = form.add_files(picked)?;
            for rejected in &outcome.rejected {
                eprintln!(
                    "skipped {}: {} files are not accepted (images, video, audio or PDF only)",
                    rejected.name, rejected.mime_type
                );
            }

            let reference_id = match form.submit().await {
                Ok(reference_id) => reference_id,
                Err(err) => {
                    if let Some(errors) = err.validation_errors() {
                        for (field, message) in errors.iter() {
                            eprintln!("{field}: {message}");
                        }
                    } else {
                        eprintln!("{}", err.notice().message);
                    }
                    form.close();
                    return Err(err).context("grievance was not submitted");
                }
            };

            if json {
                let record = store
                    .get(&reference_id)
                    .await?
                    .context("submitted record is missing from the store")?;
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("Grievance submitted successfully!");
                println!("Your reference id: {reference_id}");
                if !form.attachments().is_empty() {
                    println!("Attached files:");
                    for attachment in form.attachments() {
                        println!("  {}", attachment_line(attachment));
                    }
                }
                println!("Please save this reference id for tracking your grievance.");
            }
            form.close();
        }
        Command::Lookup { reference_id } => {
            let reference_id = ReferenceId::parse(&reference_id)?;
            let store = open_store(&settings.database_url).await?;
            match store.get(&reference_id).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => bail!("no grievance found for reference id {reference_id}"),
            }
        }
        Command::OrgTypes => {
            for organization_type in OrganizationType::ALL {
                println!("{organization_type}");
            }
        }
        Command::Health => {
            if settings.database_url.trim() == MEMORY_STORE {
                println!("ok (in-memory store)");
            } else {
                let database_url = prepare_database_url(&settings.database_url)?;
                let storage = Storage::new(&database_url).await?;
                storage.health_check().await?;
                println!(
                    "ok ({} grievances stored)",
                    storage.count_records().await?
                );
            }
        }
    }

    Ok(())
}

async fn open_store(raw_database_url: &str) -> Result<Arc<dyn RecordStore>> {
    if raw_database_url.trim() == MEMORY_STORE {
        return Ok(Arc::new(MemoryRecordStore::new()));
    }

    let database_url = prepare_database_url(raw_database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    Ok(Arc::new(storage))
}

fn attachment_from_path(path: &Path) -> Result<Attachment> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("cannot read attachment '{}'", path.display()))?;
    if !metadata.is_file() {
        bail!("attachment '{}' is not a file", path.display());
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok(Attachment::new(name, mime_type, metadata.len()))
}

/// One row of the acknowledged file list, e.g. `[pdf] payslip.pdf (2.5 MB)`.
fn attachment_line(attachment: &Attachment) -> String {
    let kind = attachment
        .kind()
        .map(|kind| kind.label())
        .unwrap_or("file");
    format!(
        "[{kind}] {} ({})",
        attachment.name,
        attachment.display_size()
    )
}
