use std::{ffi::OsString, path::Path};

use tokio::io::{self, AsyncWriteExt};

/// Replaces the whole content of `path`. Data is written into a sibling temporary file first and
/// then renamed over the target, so an interrupted write never leaves a truncated file behind.
pub async fn overwrite_file(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    let temporary = temporary_path(path);

    {
        let mut file = tokio::fs::File::create(&temporary).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
    }

    match tokio::fs::rename(&temporary, path).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = tokio::fs::remove_file(&temporary).await;
            Err(e)
        }
    }
}

fn temporary_path(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|v| v.to_os_string())
        .unwrap_or_else(|| OsString::from("daytally"));
    name.push(".tmp");
    path.with_file_name(name)
}
