use std::sync::Arc;

use storekit_core::backend::{FirebaseStorage, MemoryStorage, MinioStorage, S3Storage, StaticToken};
use storekit_core::{Page, StorageFile, StoragePath, StorageService};

fn random_folder() -> StoragePath {
    StoragePath::from_segments(["folder".to_string(), uuid::Uuid::new_v4().to_string()])
}

fn env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set for live tests"))
}

async fn exercise(storage: Arc<dyn StorageService>) {
    let folder = random_folder();

    // save / find / exists / delete with a path
    let file = StorageFile::with_path("file1.txt", Some(folder.clone()), "text/plain", "hello")
        .unwrap();
    let saved = storage.save(file.clone()).await.unwrap();
    assert_eq!(saved, folder.join("file1.txt"));

    let found = storage.find_in("file1.txt", &folder).await.unwrap().unwrap();
    assert_eq!(found.file_name(), file.file_name());
    assert_eq!(found.path(), file.path());
    assert_eq!(found.content_type(), "text/plain");
    assert_eq!(found.content(), b"hello");
    assert!(storage.exists_in("file1.txt", &folder).await);
    assert!(storage.exists(&saved.to_string()).await);

    assert!(storage.find_in("notExisting.txt", &folder).await.unwrap().is_none());
    storage.delete_in("notExisting.txt", &folder).await.unwrap();
    assert!(!storage.exists_in("notExisting.txt", &folder).await);

    // listing and folder removal
    let second = StorageFile::with_path("file2.txt", Some(folder.clone()), "text/plain", "world")
        .unwrap();
    storage.save(second).await.unwrap();
    let sibling = StoragePath::new(&format!("{folder}x"));
    let unrelated = StorageFile::with_path("file3.txt", Some(sibling.clone()), "text/plain", "!")
        .unwrap();
    storage.save(unrelated).await.unwrap();

    let all = storage
        .find_all(&folder, Page::new(1, 10).unwrap())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    let first_page = storage.find_all(&folder, Page::new(1, 1).unwrap()).await.unwrap();
    let second_page = storage.find_all(&folder, Page::new(2, 1).unwrap()).await.unwrap();
    let past_end = storage.find_all(&folder, Page::new(3, 1).unwrap()).await.unwrap();
    assert_eq!(first_page.len(), 1);
    assert_eq!(second_page.len(), 1);
    assert_ne!(first_page[0].file_name(), second_page[0].file_name());
    assert!(past_end.is_empty());

    storage.delete_all(&folder).await.unwrap();
    assert!(storage.find_all(&folder, Page::all()).await.unwrap().is_empty());
    assert!(!storage.exists_in("file1.txt", &folder).await);
    assert!(storage.exists_in("file3.txt", &sibling).await);

    storage.delete_all(&sibling).await.unwrap();
    storage.delete_all(&folder).await.unwrap();
}

#[tokio::test]
async fn memory_storage_honours_contract() {
    exercise(Arc::new(MemoryStorage::new())).await;
}

#[tokio::test]
async fn file1_scenario_without_path() {
    let storage: Arc<dyn StorageService> = Arc::new(MemoryStorage::new());
    let file = StorageFile::new("file1.txt", "text/plain", "hello").unwrap();
    storage.save(file).await.unwrap();

    let found = storage.find("file1.txt").await.unwrap().unwrap();
    assert_eq!(found.content(), b"hello");
    assert_eq!(found.content_type(), "text/plain");
    assert!(storage.exists("file1.txt").await);

    storage.delete("file1.txt").await.unwrap();
    assert!(!storage.exists("file1.txt").await);
    storage.delete("file1.txt").await.unwrap();
    assert!(!storage.exists("file1.txt").await);
}

// Live backends: run with `--ignored` and the STOREKIT_* variables set.

#[tokio::test]
#[ignore]
async fn minio_honours_contract() {
    let storage = MinioStorage::connect(
        &env("STOREKIT_MINIO_ENDPOINT"),
        &env("STOREKIT_MINIO_ACCESS_KEY"),
        &env("STOREKIT_MINIO_SECRET_KEY"),
        "storekit-test",
    )
    .await
    .unwrap();
    exercise(Arc::new(storage)).await;
}

#[tokio::test]
#[ignore]
async fn s3_honours_contract() {
    let endpoint = std::env::var("STOREKIT_S3_ENDPOINT").ok();
    let storage = S3Storage::connect(
        &env("STOREKIT_S3_ACCESS_KEY"),
        &env("STOREKIT_S3_SECRET_KEY"),
        &env("STOREKIT_S3_REGION"),
        endpoint.as_deref(),
        &env("STOREKIT_S3_BUCKET"),
    )
    .await
    .unwrap();
    exercise(Arc::new(storage)).await;
}

#[tokio::test]
#[ignore]
async fn firebase_honours_contract() {
    let endpoint = std::env::var("STOREKIT_FIREBASE_ENDPOINT").ok();
    let storage = FirebaseStorage::connect(
        endpoint.as_deref(),
        StaticToken::new(env("STOREKIT_FIREBASE_TOKEN")),
        &env("STOREKIT_FIREBASE_BUCKET"),
    )
    .await
    .unwrap();
    exercise(Arc::new(storage)).await;
}
