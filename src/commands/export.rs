//! Archive export command.

use std::path::PathBuf;

use clap::Args;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::output;
use filevault_core::config::AppConfig;
use filevault_core::error::{AppError, ErrorKind};

/// Arguments for the export command
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Acting user ID
    #[arg(short, long)]
    pub user: i64,

    /// Folder IDs to export (repeatable)
    #[arg(long = "folder", required = true)]
    pub folders: Vec<i64>,

    /// Archive path to write
    #[arg(short, long, default_value = "export.zip")]
    pub output: PathBuf,
}

/// Execute the export command
pub async fn execute(args: &ExportArgs, config: &AppConfig) -> Result<(), AppError> {
    let services = super::create_services(config).await?;
    let ctx = super::as_user(args.user);

    let archive = &services.archive;
    let export = match archive
        .export_as_archive(&ctx, &args.folders, None, false)
        .await
    {
        Err(e) if e.kind == ErrorKind::Authentication => {
            let password = super::file::prompt_lock_password()?;
            archive
                .export_as_archive(&ctx, &args.folders, Some(&password), false)
                .await?
        }
        other => other?,
    };

    let write_error = |e: std::io::Error| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to write {}", args.output.display()),
            e,
        )
    };

    let mut out = tokio::fs::File::create(&args.output)
        .await
        .map_err(write_error)?;
    let mut stream = export.output.stream;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(write_error)?;
        out.write_all(&chunk).await.map_err(write_error)?;
    }
    out.flush().await.map_err(write_error)?;

    output::print_success(&format!(
        "Wrote {} entries ({} bytes) to {}",
        export.entries,
        export.output.size_bytes,
        args.output.display()
    ));
    if export.skipped_files > 0 {
        output::print_warning(&format!(
            "{} files were skipped because their content is missing",
            export.skipped_files
        ));
    }

    Ok(())
}
