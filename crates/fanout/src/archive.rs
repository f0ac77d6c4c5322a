// archive.rs
// 归档读取器，从ZIP或RAR归档中读取指定名称的JSON文件并解析。
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{Error, Result};

// RAR4 与 RAR5 共同的签名前缀
const RAR_SIGNATURE: &[u8] = b"Rar!\x1a\x07";

/// 归档格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
}

/// 判断归档格式，不是ZIP也不是RAR时返回 `None`
pub fn detect(path: impl AsRef<Path>) -> Result<Option<ArchiveKind>> {
    let path = path.as_ref();
    if ZipArchive::new(BufReader::new(File::open(path)?)).is_ok() {
        return Ok(Some(ArchiveKind::Zip));
    }
    let mut signature = [0u8; 6];
    let mut file = File::open(path)?;
    let mut read = 0;
    while read < signature.len() {
        let n = file.read(&mut signature[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    if read == signature.len() && signature == RAR_SIGNATURE {
        return Ok(Some(ArchiveKind::Rar));
    }
    Ok(None)
}

/// 从ZIP或RAR归档中读取JSON文件
///
/// `entry_name` 必须与归档内的文件名完全一致。
pub fn read_json_from_archive(archive_path: impl AsRef<Path>, entry_name: &str) -> Result<Value> {
    let archive_path = archive_path.as_ref();
    match detect(archive_path)? {
        Some(ArchiveKind::Zip) => read_from_zip(archive_path, entry_name),
        Some(ArchiveKind::Rar) => {
            info!(path = %archive_path.display(), "读取RAR归档");
            read_from_rar(archive_path, entry_name)
        }
        None => Err(Error::UnsupportedArchive(archive_path.to_path_buf())),
    }
}

fn read_from_zip(archive_path: &Path, entry_name: &str) -> Result<Value> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(archive_path)?))?;
    let entry = match archive.by_name(entry_name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(Error::EntryNotFound {
                entry: entry_name.to_string(),
                archive: archive_path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    debug!(entry = entry_name, size = entry.size(), "解析ZIP中的JSON");
    Ok(serde_json::from_reader(BufReader::new(entry))?)
}

fn read_from_rar(archive_path: &Path, entry_name: &str) -> Result<Value> {
    let target = Path::new(entry_name);
    let mut archive = unrar::Archive::new(archive_path)
        .open_for_processing()
        .map_err(|e| Error::Rar(e.to_string()))?;
    while let Some(header) = archive.read_header().map_err(|e| Error::Rar(e.to_string()))? {
        if header.entry().filename.as_path() == target {
            let (data, _rest) = header.read().map_err(|e| Error::Rar(e.to_string()))?;
            debug!(entry = entry_name, size = data.len(), "解析RAR中的JSON");
            return Ok(serde_json::from_slice(&data)?);
        }
        archive = header.skip().map_err(|e| Error::Rar(e.to_string()))?;
    }
    Err(Error::EntryNotFound {
        entry: entry_name.to_string(),
        archive: archive_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_read_json_from_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.zip");
        write_zip(
            &path,
            &[
                ("readme.txt", "不是JSON"),
                ("nested/items.json", r#"{"items": [{"id": 1}], "total": 1}"#),
            ],
        );

        assert_eq!(detect(&path).unwrap(), Some(ArchiveKind::Zip));
        let value = read_json_from_archive(&path, "nested/items.json").unwrap();
        assert_eq!(value, json!({"items": [{"id": 1}], "total": 1}));
    }

    #[test]
    fn test_missing_entry_in_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.zip");
        write_zip(&path, &[("a.json", "{}")]);

        match read_json_from_archive(&path, "b.json") {
            Err(Error::EntryNotFound { entry, .. }) => assert_eq!(entry, "b.json"),
            other => panic!("期望 EntryNotFound，实际 {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_in_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.zip");
        write_zip(&path, &[("a.json", "{不完整")]);
        assert!(matches!(read_json_from_archive(&path, "a.json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.json");
        std::fs::write(&path, r#"{"a": 1}"#).unwrap();

        assert_eq!(detect(&path).unwrap(), None);
        assert!(matches!(
            read_json_from_archive(&path, "a.json"),
            Err(Error::UnsupportedArchive(_))
        ));
    }

    #[test]
    fn test_detect_rar_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.rar");
        let mut bytes = b"Rar!\x1a\x07\x01\x00".to_vec();
        bytes.extend_from_slice(&[0u8; 32]);
        std::fs::write(&path, bytes).unwrap();
        assert_eq!(detect(&path).unwrap(), Some(ArchiveKind::Rar));
    }

    #[test]
    fn test_missing_archive_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_json_from_archive(dir.path().join("none.zip"), "a.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
