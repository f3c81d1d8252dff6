use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, io::AsyncWriteExt};

use crate::errors::ServiceError;

/// Read and decode a JSON document. A missing file is `Ok(None)`.
pub async fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ServiceError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ServiceError::storage(e)),
    }
}

/// Whether a document exists at `path`; unreadable metadata counts as absent.
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Write `value` as pretty-printed JSON.
///
/// The bytes go to a sibling temp file which is then renamed over `path`, so a
/// reader sees either the previous document or the new one, never a prefix.
/// The temp file is flushed to disk before the rename. Callers serialize
/// writers themselves.
pub async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ServiceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
    }

    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');

    let tmp = temp_path(path);
    if let Err(e) = write_synced(&tmp, &data).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(ServiceError::storage(e));
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(ServiceError::storage(e));
    }
    Ok(())
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("document"));
    name.push(".tmp");
    path.with_file_name(name)
}
