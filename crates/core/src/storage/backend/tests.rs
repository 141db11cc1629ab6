use std::time::Duration;

use chrono::Utc;
use opendal::services;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

use super::*;
use crate::storage::config::{S3Config, StorageConfig};

fn local_storage() -> (TempDir, OpendalStorage) {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig::local(dir.path().to_string_lossy(), "http://localhost:8080")
        .with_preview_url("http://preview.local/onlinePreview");
    let storage = OpendalStorage::local(&config).unwrap();
    (dir, storage)
}

/// Filesystem operator driven with object-store move semantics.
fn object_store() -> (TempDir, OpendalStorage) {
    let dir = TempDir::new().unwrap();
    let op = build_operator(services::Fs::default().root(&dir.path().to_string_lossy())).unwrap();
    let storage = OpendalStorage::from_operator(
        op,
        StorageType::S3,
        Relocation::CopyThenDelete,
        AccessUrl::public_or_presigned("https://cdn.example.com/", Duration::from_secs(60)),
        "",
    );
    (dir, storage)
}

fn stream(bytes: &[u8]) -> ByteStream {
    Box::pin(std::io::Cursor::new(bytes.to_vec()))
}

fn file_at(name: &str, stored: &StoredObject) -> File {
    let now = Utc::now();
    File {
        id: "f1".to_string(),
        name: name.to_string(),
        generated_name: stored.generated_name.clone(),
        path: stored.path.clone(),
        original_path: String::new(),
        folder_id: "0".to_string(),
        size: stored.size,
        file_type: extension_of(name),
        storage_type: stored.storage_type,
        url: stored.url.clone(),
        tenant_id: "t1".to_string(),
        created_by: "tester".to_string(),
        created_at: now,
        updated_at: now,
        is_deleted: false,
        deleted_by: None,
        deleted_at: None,
    }
}

async fn read_all(storage: &OpendalStorage, file: &File) -> Vec<u8> {
    let mut out = Vec::new();
    storage
        .download(file)
        .await
        .unwrap()
        .read_to_end(&mut out)
        .await
        .unwrap();
    out
}

async fn exists(storage: &OpendalStorage, path: &str) -> bool {
    storage.operator().exists(path).await.unwrap()
}

/// Every regular file under `root`.
fn files_under(root: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                found.push(path);
            }
        }
    }
    found
}

#[tokio::test]
async fn test_local_upload_creates_directories_and_url() {
    let (dir, storage) = local_storage();
    let body = b"quarterly numbers";

    let stored = storage
        .upload(stream(body), "report.pdf", body.len() as u64, "docs/2024")
        .await
        .unwrap();

    assert!(stored.generated_name.ends_with(".pdf"));
    assert_eq!(stored.path, format!("docs/2024/{}", stored.generated_name));
    assert_eq!(
        stored.url,
        format!("http://localhost:8080/files/docs/2024/{}", stored.generated_name)
    );
    assert_eq!(stored.storage_type, StorageType::Local);
    assert_eq!(stored.size, body.len() as u64);
    assert!(dir.path().join(&stored.path).is_file());
}

#[tokio::test]
async fn test_local_download_returns_content() {
    let (_dir, storage) = local_storage();
    let body = vec![7u8; 300_000];
    let stored = storage
        .upload(stream(&body), "blob.bin", body.len() as u64, "")
        .await
        .unwrap();

    let file = file_at("blob.bin", &stored);
    assert_eq!(read_all(&storage, &file).await, body);
}

#[tokio::test]
async fn test_local_move_renames() {
    let (_dir, storage) = local_storage();
    let stored = storage.upload(stream(b"abc"), "a.txt", 3, "from").await.unwrap();

    let mut file = file_at("a.txt", &stored);
    let old_path = file.path.clone();
    file.path = join_key("to", &file.generated_name);
    storage.move_object(&file, &old_path).await.unwrap();

    assert!(!exists(&storage, &old_path).await);
    assert_eq!(read_all(&storage, &file).await, b"abc");
}

#[tokio::test]
async fn test_object_store_move_copies_then_deletes() {
    let (_dir, storage) = object_store();
    let stored = storage.upload(stream(b"abc"), "a.txt", 3, "from").await.unwrap();

    let mut file = file_at("a.txt", &stored);
    let old_path = file.path.clone();
    file.path = join_key("recycle", &file.generated_name);
    storage.move_object(&file, &old_path).await.unwrap();

    assert!(!exists(&storage, &old_path).await);
    assert!(exists(&storage, &file.path).await);
}

#[tokio::test]
async fn test_move_of_missing_object_fails() {
    let (_dir, storage) = object_store();
    let stored = storage.upload(stream(b"abc"), "a.txt", 3, "").await.unwrap();

    let mut file = file_at("a.txt", &stored);
    file.path = "elsewhere/a.txt".to_string();
    assert!(storage.move_object(&file, "missing.txt").await.is_err());
    assert!(!exists(&storage, "elsewhere/a.txt").await);
}

#[tokio::test]
async fn test_upload_rejects_size_mismatch() {
    let (dir, storage) = local_storage();

    let short = storage.upload(stream(b"abc"), "a.txt", 10, "").await;
    assert!(matches!(
        short,
        Err(StorageError::SizeMismatch {
            declared: 10,
            received: 3
        })
    ));

    let long = storage.upload(stream(b"abcdef"), "a.txt", 2, "").await;
    assert!(matches!(long, Err(StorageError::SizeMismatch { declared: 2, .. })));

    // Neither attempt leaves a partial object behind
    assert!(files_under(dir.path()).is_empty());
}

#[tokio::test]
async fn test_failed_upload_leaves_nothing_under_folder() {
    let (dir, storage) = local_storage();
    let body = vec![1u8; 300 * 1024];

    let result = storage.upload(stream(&body), "big.bin", 3, "reports/2024").await;

    assert!(matches!(result, Err(StorageError::SizeMismatch { declared: 3, .. })));
    assert!(files_under(dir.path()).is_empty());
}

#[tokio::test]
async fn test_empty_upload_buffer_is_rejected() {
    let (dir, storage) = local_storage();
    let mut buf = [0u8; 0];

    let result = storage
        .upload_buffered(stream(b"abc"), "a.txt", 3, "", &mut buf)
        .await;

    assert!(matches!(result, Err(StorageError::Configuration(_))));
    assert!(files_under(dir.path()).is_empty());
}

#[tokio::test]
async fn test_delete_removes_object() {
    let (_dir, storage) = local_storage();
    let stored = storage.upload(stream(b"abc"), "a.txt", 3, "").await.unwrap();
    let file = file_at("a.txt", &stored);

    storage.delete(&file).await.unwrap();
    assert!(!exists(&storage, &file.path).await);
    assert!(matches!(
        storage.download(&file).await,
        Err(StorageError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_public_url_joins_prefix_and_key() {
    let (_dir, storage) = object_store();
    let stored = storage.upload(stream(b"abc"), "a.png", 3, "img").await.unwrap();
    let file = file_at("a.png", &stored);

    let url = storage.get_url(&file).await.unwrap();
    assert_eq!(url, format!("https://cdn.example.com/{}", file.path));
    // Images preview as themselves
    assert_eq!(storage.get_preview_url(&file).await.unwrap(), url);
}

#[tokio::test]
async fn test_document_preview_goes_through_service() {
    let (_dir, storage) = local_storage();
    let stored = storage.upload(stream(b"%PDF"), "a.pdf", 4, "").await.unwrap();
    let file = file_at("a.pdf", &stored);

    let preview = storage.get_preview_url(&file).await.unwrap();
    assert!(preview.starts_with("http://preview.local/onlinePreview?url=http%3A%2F%2Flocalhost"));
}

#[tokio::test]
async fn test_unsupported_preview_type() {
    let (_dir, storage) = local_storage();
    let stored = storage.upload(stream(b"MZ"), "setup.exe", 2, "").await.unwrap();
    let file = file_at("setup.exe", &stored);

    assert!(matches!(
        storage.get_preview_url(&file).await,
        Err(StorageError::UnsupportedPreviewType(_))
    ));
}

#[test]
fn test_object_store_constructors_validate_config() {
    let config = StorageConfig::default();
    assert!(matches!(
        OpendalStorage::s3(&config),
        Err(StorageError::MissingConfig { backend: "s3", .. })
    ));
    assert!(matches!(
        OpendalStorage::oss(&config),
        Err(StorageError::MissingConfig { backend: "oss", .. })
    ));
    assert!(matches!(
        OpendalStorage::cos(&config),
        Err(StorageError::MissingConfig { backend: "cos", .. })
    ));
    assert!(matches!(
        OpendalStorage::local(&config),
        Err(StorageError::MissingConfig { field: "root_path", .. })
    ));
}

#[tokio::test]
async fn test_s3_without_public_url_presigns() {
    let config = StorageConfig {
        kind: "s3".to_string(),
        s3: S3Config {
            endpoint: "http://127.0.0.1:9000".to_string(),
            access_key: "minio".to_string(),
            secret_key: "minio123".to_string(),
            bucket: "files".to_string(),
            region: "us-east-1".to_string(),
            public_url: String::new(),
        },
        ..StorageConfig::default()
    };
    let storage = OpendalStorage::s3(&config).unwrap();
    let stored = StoredObject {
        generated_name: "abc.pdf".to_string(),
        path: "docs/abc.pdf".to_string(),
        url: String::new(),
        storage_type: StorageType::S3,
        size: 1,
    };

    let url = storage.get_url(&file_at("a.pdf", &stored)).await.unwrap();
    assert!(url.contains("docs/abc.pdf"));
    assert!(url.contains("X-Amz-Signature"));
    assert!(url.contains("X-Amz-Expires=86400"));
}
