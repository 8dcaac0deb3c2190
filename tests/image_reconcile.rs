use std::{path::Path, sync::Mutex};

use async_trait::async_trait;
use chrono::Utc;
use marketplace_api::{
    catalog::{CatalogStore, ImageReconciler, NewProductImage, ReconcileRequest},
    entity::{product_images, products},
    error::{AppError, AppResult},
    storage::{LocalFileStorage, PRODUCT_IMAGE_DIR, UploadFile},
};
use rust_decimal::Decimal;
use tempfile::TempDir;

const PRODUCT_ID: i64 = 7;

#[derive(Default)]
struct Rows {
    images: Vec<product_images::Model>,
    next_id: i64,
    updates: Vec<products::Model>,
}

/// In-memory catalog with switches for the failure paths.
#[derive(Default)]
struct MemoryCatalog {
    rows: Mutex<Rows>,
    short_delete: bool,
    fail_insert: bool,
    ignore_delete: bool,
}

impl MemoryCatalog {
    fn with_images(paths: &[&str]) -> Self {
        let catalog = MemoryCatalog::default();
        for path in paths {
            catalog.push(path);
        }
        catalog
    }

    fn push(&self, path: &str) {
        let mut rows = self.rows.lock().unwrap();
        rows.next_id += 1;
        let id = rows.next_id;
        rows.images.push(product_images::Model {
            id,
            image: path.to_string(),
            product_id: PRODUCT_ID,
            created_at: Utc::now().fixed_offset(),
            updated_at: Utc::now().fixed_offset(),
        });
    }

    fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .rows
            .lock()
            .unwrap()
            .images
            .iter()
            .map(|img| img.image.clone())
            .collect();
        paths.sort();
        paths
    }

    fn update_count(&self) -> usize {
        self.rows.lock().unwrap().updates.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find_images_by_product(&self, product_id: i64) -> AppResult<Vec<product_images::Model>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .images
            .iter()
            .filter(|img| img.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn delete_images_batch(&self, ids: &[i64]) -> AppResult<u64> {
        if self.short_delete {
            return Ok(ids.len() as u64 - 1);
        }
        if self.ignore_delete {
            return Ok(ids.len() as u64);
        }
        let mut rows = self.rows.lock().unwrap();
        let before = rows.images.len();
        rows.images.retain(|img| !ids.contains(&img.id));
        Ok((before - rows.images.len()) as u64)
    }

    async fn insert_images_batch(&self, images: Vec<NewProductImage>) -> AppResult<()> {
        if self.fail_insert {
            return Err(AppError::internal("insert failed"));
        }
        for image in images {
            self.push(&image.image);
        }
        Ok(())
    }

    async fn delete_images_by_path(&self, product_id: i64, path: &str) -> AppResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.images.len();
        rows.images
            .retain(|img| !(img.product_id == product_id && img.image == path));
        Ok((before - rows.images.len()) as u64)
    }

    async fn update_product(&self, product: products::Model) -> AppResult<products::Model> {
        self.rows.lock().unwrap().updates.push(product.clone());
        Ok(product)
    }

    async fn product_slug_exists(&self, slug: &str) -> AppResult<bool> {
        Ok(self.rows.lock().unwrap().updates.iter().any(|p| p.slug == slug))
    }
}

fn product(thumbnail: &str) -> products::Model {
    products::Model {
        id: PRODUCT_ID,
        slug: "batik-parang".into(),
        name: "Batik Parang".into(),
        description: "Hand-drawn parang motif".into(),
        price: Decimal::new(150_000, 0),
        store_id: 1,
        category_id: 1,
        thumbnail: thumbnail.into(),
        created_at: Utc::now().fixed_offset(),
        updated_at: Utc::now().fixed_offset(),
    }
}

fn png(name: &str) -> UploadFile {
    UploadFile::new(name, vec![0x89, b'P', b'N', b'G'])
}

fn stored_files(root: &Path) -> usize {
    std::fs::read_dir(root.join(PRODUCT_IMAGE_DIR))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

const A: &str = "/uploads/product-images/a.png";
const B: &str = "/uploads/product-images/b.png";
const C: &str = "/uploads/product-images/c.png";

#[tokio::test]
async fn deleting_thumbnail_moves_it_to_a_remaining_image() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let catalog = MemoryCatalog::with_images(&[A, B, C]);

    let outcome = ImageReconciler::new(&catalog, &storage)
        .reconcile(
            product(A),
            false,
            ReconcileRequest {
                images_to_delete: vec![A.into()],
                new_files: vec![],
            },
        )
        .await?;

    assert!([B, C].contains(&outcome.product.thumbnail.as_str()));
    assert_eq!(catalog.paths(), vec![B.to_string(), C.to_string()]);
    assert_eq!(outcome.deleted_paths, vec![A.to_string()]);
    assert!(outcome.persisted);
    Ok(())
}

#[tokio::test]
async fn deleting_the_last_image_clears_the_thumbnail() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let catalog = MemoryCatalog::with_images(&[A]);

    let outcome = ImageReconciler::new(&catalog, &storage)
        .reconcile(
            product(A),
            false,
            ReconcileRequest {
                images_to_delete: vec![A.into()],
                new_files: vec![],
            },
        )
        .await?;

    assert_eq!(outcome.product.thumbnail, "");
    assert!(catalog.paths().is_empty());
    Ok(())
}

#[tokio::test]
async fn new_upload_replaces_deleted_thumbnail() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let catalog = MemoryCatalog::with_images(&[A, B]);

    let outcome = ImageReconciler::new(&catalog, &storage)
        .reconcile(
            product(A),
            false,
            ReconcileRequest {
                images_to_delete: vec![A.into()],
                new_files: vec![png("d.png")],
            },
        )
        .await?;

    assert_eq!(outcome.added_paths.len(), 1);
    let d = outcome.added_paths[0].clone();
    assert_eq!(outcome.product.thumbnail, d);

    let mut expected = vec![B.to_string(), d];
    expected.sort();
    assert_eq!(catalog.paths(), expected);
    assert_eq!(stored_files(tmp.path()), 1);
    Ok(())
}

#[tokio::test]
async fn unmatched_deletion_paths_are_ignored() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let catalog = MemoryCatalog::with_images(&[A, B]);

    let outcome = ImageReconciler::new(&catalog, &storage)
        .reconcile(
            product(A),
            false,
            ReconcileRequest {
                images_to_delete: vec!["/uploads/product-images/missing.png".into(), B.into(), B.into()],
                new_files: vec![],
            },
        )
        .await?;

    assert_eq!(outcome.product.thumbnail, A);
    assert_eq!(outcome.deleted_paths, vec![B.to_string()]);
    assert_eq!(catalog.paths(), vec![A.to_string()]);
    Ok(())
}

#[tokio::test]
async fn nothing_changed_skips_the_product_update() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let catalog = MemoryCatalog::with_images(&[A]);

    let outcome = ImageReconciler::new(&catalog, &storage)
        .reconcile(product(A), false, ReconcileRequest::default())
        .await?;

    assert!(!outcome.persisted);
    assert_eq!(catalog.update_count(), 0);
    Ok(())
}

#[tokio::test]
async fn empty_thumbnail_adopts_first_remaining_image() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let catalog = MemoryCatalog::with_images(&[B, C]);

    let outcome = ImageReconciler::new(&catalog, &storage)
        .reconcile(product(""), false, ReconcileRequest::default())
        .await?;

    assert_eq!(outcome.product.thumbnail, B);
    assert!(outcome.persisted);
    Ok(())
}

#[tokio::test]
async fn delete_count_mismatch_aborts_and_removes_uploads() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let catalog = MemoryCatalog {
        short_delete: true,
        ..MemoryCatalog::with_images(&[A, B])
    };

    let err = ImageReconciler::new(&catalog, &storage)
        .reconcile(
            product(A),
            true,
            ReconcileRequest {
                images_to_delete: vec![A.into(), B.into()],
                new_files: vec![png("d.png")],
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(catalog.update_count(), 0);
    assert_eq!(stored_files(tmp.path()), 0);
    Ok(())
}

#[tokio::test]
async fn insert_failure_removes_uploaded_files() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let catalog = MemoryCatalog {
        fail_insert: true,
        ..MemoryCatalog::with_images(&[A])
    };

    let result = ImageReconciler::new(&catalog, &storage)
        .reconcile(
            product(A),
            false,
            ReconcileRequest {
                images_to_delete: vec![],
                new_files: vec![png("d.png"), png("e.webp")],
            },
        )
        .await;

    assert!(result.is_err());
    assert_eq!(stored_files(tmp.path()), 0);
    assert_eq!(catalog.paths(), vec![A.to_string()]);
    Ok(())
}

#[tokio::test]
async fn invalid_files_are_skipped() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let catalog = MemoryCatalog::with_images(&[A]);

    let outcome = ImageReconciler::new(&catalog, &storage)
        .with_max_bytes(16)
        .reconcile(
            product(A),
            false,
            ReconcileRequest {
                images_to_delete: vec![],
                new_files: vec![
                    UploadFile::new("notes.txt", vec![1, 2, 3]),
                    UploadFile::new("huge.jpg", vec![0; 64]),
                    png("ok.png"),
                ],
            },
        )
        .await?;

    assert_eq!(outcome.skipped_files, vec!["notes.txt".to_string(), "huge.jpg".to_string()]);
    assert_eq!(outcome.added_paths.len(), 1);
    assert_eq!(outcome.product.thumbnail, A);
    assert_eq!(catalog.paths().len(), 2);
    Ok(())
}

#[tokio::test]
async fn verify_repairs_rows_that_survived_deletion() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let catalog = MemoryCatalog {
        ignore_delete: true,
        ..MemoryCatalog::with_images(&[A, B])
    };
    let reconciler = ImageReconciler::new(&catalog, &storage);

    let requested = vec![B.to_string()];
    let outcome = reconciler
        .reconcile(
            product(A),
            false,
            ReconcileRequest {
                images_to_delete: requested.clone(),
                new_files: vec![],
            },
        )
        .await?;
    assert_eq!(catalog.paths(), vec![A.to_string(), B.to_string()]);

    let report = reconciler.verify(&outcome.product, &requested).await;
    assert_eq!(report.strays, requested);
    assert_eq!(report.repaired, requested);
    assert!(report.failed.is_empty());
    assert_eq!(report.thumbnail, None);
    assert_eq!(catalog.paths(), vec![A.to_string()]);
    Ok(())
}

#[tokio::test]
async fn verify_moves_thumbnail_off_a_repaired_row_and_removes_its_file() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let dir = tmp.path().join(PRODUCT_IMAGE_DIR);
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join("a.png"), b"a")?;
    std::fs::write(dir.join("b.png"), b"b")?;
    let catalog = MemoryCatalog {
        ignore_delete: true,
        ..MemoryCatalog::with_images(&[A, B])
    };
    let reconciler = ImageReconciler::new(&catalog, &storage);

    // The row for A survives the batch delete, so the refetch picks it again.
    let requested = vec![A.to_string()];
    let outcome = reconciler
        .reconcile(
            product(A),
            false,
            ReconcileRequest {
                images_to_delete: requested.clone(),
                new_files: vec![],
            },
        )
        .await?;
    assert_eq!(outcome.product.thumbnail, A);

    let report = reconciler.verify(&outcome.product, &requested).await;
    assert_eq!(report.repaired, requested);
    assert_eq!(report.thumbnail.as_deref(), Some(B));
    assert_eq!(catalog.paths(), vec![B.to_string()]);
    assert!(!dir.join("a.png").exists());
    assert!(dir.join("b.png").exists());

    let last_update = catalog.rows.lock().unwrap().updates.last().cloned().unwrap();
    assert_eq!(last_update.thumbnail, B);
    Ok(())
}

#[tokio::test]
async fn purge_removes_files_of_deleted_rows() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let storage = LocalFileStorage::new(tmp.path());
    let dir = tmp.path().join(PRODUCT_IMAGE_DIR);
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join("a.png"), b"a")?;
    std::fs::write(dir.join("b.png"), b"b")?;
    let catalog = MemoryCatalog::with_images(&[A, B]);
    let reconciler = ImageReconciler::new(&catalog, &storage);

    let outcome = reconciler
        .reconcile(
            product(A),
            false,
            ReconcileRequest {
                images_to_delete: vec![A.into()],
                new_files: vec![],
            },
        )
        .await?;
    assert_eq!(stored_files(tmp.path()), 2);

    reconciler.purge_deleted_files(&outcome).await;
    assert!(!dir.join("a.png").exists());
    assert!(dir.join("b.png").exists());
    Ok(())
}
