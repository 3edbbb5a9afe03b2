//! Read-only access to files inside an Electron asar archive.
//!
//! Layout: an 8 byte size pickle whose second `u32` is the length of the
//! header pickle, then the header pickle (payload length, JSON length, JSON
//! text padded to 4 bytes), then the concatenated file contents. File
//! offsets in the JSON header are decimal strings relative to the end of the
//! header pickle. Entries flagged `unpacked` live next to the archive in
//! `<archive>.unpacked/`.

use crate::error::ManifestError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

/// Upper bound on the JSON header we are willing to buffer
const MAX_HEADER_SIZE: u32 = 64 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    files: Option<HashMap<String, Entry>>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    offset: Option<String>,
    #[serde(default)]
    unpacked: bool,
}

/// Extract the contents of `inner_path` (forward-slash separated) from `archive`.
pub async fn extract_file(archive: &Path, inner_path: &str) -> Result<Vec<u8>, ManifestError> {
    let read_err = |source: std::io::Error| ManifestError::Read {
        path: archive.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::open(archive).await.map_err(read_err)?;

    let mut size_pickle = [0u8; 8];
    file.read_exact(&mut size_pickle).await.map_err(read_err)?;
    let header_size =
        u32::from_le_bytes([size_pickle[4], size_pickle[5], size_pickle[6], size_pickle[7]]);
    if !(8..=MAX_HEADER_SIZE).contains(&header_size) {
        return Err(invalid(archive, format!("header size {header_size} out of range")));
    }

    let mut header = vec![0u8; header_size as usize];
    file.read_exact(&mut header).await.map_err(read_err)?;
    let json_len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let json = header
        .get(8..8 + json_len)
        .ok_or_else(|| invalid(archive, "header JSON truncated".to_string()))?;

    let root: Entry = serde_json::from_slice(json)
        .map_err(|e| invalid(archive, format!("header JSON: {e}")))?;
    let entry = lookup(&root, inner_path)
        .ok_or_else(|| invalid(archive, format!("no entry for {inner_path}")))?;

    if entry.unpacked {
        let mut unpacked = archive.as_os_str().to_owned();
        unpacked.push(".unpacked");
        let path = inner_path
            .split('/')
            .fold(PathBuf::from(unpacked), |path, part| path.join(part));
        return tokio::fs::read(&path)
            .await
            .map_err(|source| ManifestError::Read { path, source });
    }

    let (Some(size), Some(offset)) = (entry.size, entry.offset.as_deref()) else {
        return Err(invalid(archive, format!("{inner_path} is not a file")));
    };
    let offset: u64 = offset
        .parse()
        .map_err(|_| invalid(archive, format!("bad offset {offset:?} for {inner_path}")))?;

    let archive_len = file.metadata().await.map_err(read_err)?.len();
    let start = (8 + u64::from(header_size)).checked_add(offset);
    let end = start.and_then(|start| start.checked_add(size));
    let (Some(start), Some(end)) = (start, end) else {
        return Err(invalid(archive, format!("{inner_path} lies outside the archive")));
    };
    if end > archive_len {
        return Err(invalid(archive, format!("{inner_path} lies outside the archive")));
    }

    file.seek(SeekFrom::Start(start)).await.map_err(read_err)?;
    let mut contents = Vec::new();
    file.take(size)
        .read_to_end(&mut contents)
        .await
        .map_err(read_err)?;
    Ok(contents)
}

fn lookup<'a>(root: &'a Entry, inner_path: &str) -> Option<&'a Entry> {
    inner_path
        .split('/')
        .filter(|part| !part.is_empty())
        .try_fold(root, |entry, part| entry.files.as_ref()?.get(part))
}

fn invalid(archive: &Path, reason: String) -> ManifestError {
    ManifestError::Asar {
        path: archive.to_path_buf(),
        reason,
    }
}

/// Build an asar archive in memory. Test support only.
#[cfg(test)]
pub(crate) fn build_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut entries = serde_json::Map::new();
    let mut data = Vec::new();
    for (name, contents) in files {
        entries.insert(
            name.to_string(),
            serde_json::json!({ "size": contents.len(), "offset": data.len().to_string() }),
        );
        data.extend_from_slice(contents);
    }
    let json = serde_json::json!({ "files": entries }).to_string();
    build_raw_archive(json.as_bytes(), &data)
}

/// Build an archive around a hand-written JSON header. Test support only.
#[cfg(test)]
pub(crate) fn build_raw_archive(json: &[u8], data: &[u8]) -> Vec<u8> {
    let padded = json.len().div_ceil(4) * 4;
    let payload_size = 4 + padded as u32;
    let header_size = 4 + payload_size;

    let mut out = Vec::new();
    out.extend_from_slice(&4u32.to_le_bytes());
    out.extend_from_slice(&header_size.to_le_bytes());
    out.extend_from_slice(&payload_size.to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(json);
    out.resize(out.len() + padded - json.len(), 0);
    out.extend_from_slice(data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_packed_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("app.asar");
        std::fs::write(
            &archive,
            build_archive(&[
                ("main.js", b"console.log(1)".as_slice()),
                ("package.json", b"{\"name\":\"foo\"}".as_slice()),
            ]),
        )
        .unwrap();

        let contents = extract_file(&archive, "package.json").await.unwrap();
        assert_eq!(contents, b"{\"name\":\"foo\"}");
    }

    #[tokio::test]
    async fn test_missing_entry_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("app.asar");
        std::fs::write(&archive, build_archive(&[("main.js", b"x".as_slice())])).unwrap();

        let err = extract_file(&archive, "package.json").await.unwrap_err();
        assert!(matches!(err, ManifestError::Asar { .. }));
    }

    #[tokio::test]
    async fn test_garbage_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("app.asar");
        std::fs::write(&archive, b"not an archive at all").unwrap();

        assert!(extract_file(&archive, "package.json").await.is_err());
    }

    #[tokio::test]
    async fn test_unpacked_entry_read_from_side_directory() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("app.asar");
        let json = br#"{"files":{"native":{"files":{"addon.node":{"size":3,"unpacked":true}}}}}"#;
        std::fs::write(&archive, build_raw_archive(json, b"")).unwrap();

        let side = dir.path().join("app.asar.unpacked").join("native");
        std::fs::create_dir_all(&side).unwrap();
        std::fs::write(side.join("addon.node"), b"bin").unwrap();

        let contents = extract_file(&archive, "native/addon.node").await.unwrap();
        assert_eq!(contents, b"bin");
    }

    #[tokio::test]
    async fn test_oversized_entry_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("app.asar");
        let json = br#"{"files":{"package.json":{"size":18446744073709551615,"offset":"0"}}}"#;
        std::fs::write(&archive, build_raw_archive(json, b"{}")).unwrap();

        let err = extract_file(&archive, "package.json").await.unwrap_err();
        assert!(matches!(err, ManifestError::Asar { .. }));
    }

    #[tokio::test]
    async fn test_overflowing_offset_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("app.asar");
        let json = br#"{"files":{"package.json":{"size":2,"offset":"18446744073709551615"}}}"#;
        std::fs::write(&archive, build_raw_archive(json, b"{}")).unwrap();

        let err = extract_file(&archive, "package.json").await.unwrap_err();
        assert!(matches!(err, ManifestError::Asar { .. }));
    }

    #[tokio::test]
    async fn test_entry_past_end_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("app.asar");
        let json = br#"{"files":{"package.json":{"size":64,"offset":"0"}}}"#;
        std::fs::write(&archive, build_raw_archive(json, b"{}")).unwrap();

        let err = extract_file(&archive, "package.json").await.unwrap_err();
        assert!(matches!(err, ManifestError::Asar { .. }));
    }
}
