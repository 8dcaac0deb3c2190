//! Keeps a product's image set and thumbnail consistent across an update
//! that removes some images and uploads others.
//!
//! The caller owns the transaction: [`ImageReconciler::reconcile`] runs
//! against whatever connection the [`CatalogStore`] wraps, physical files of
//! deleted images are only removed by [`ImageReconciler::purge_deleted_files`]
//! once the caller has committed, and [`ImageReconciler::verify`] is meant to
//! run afterwards against the pool.

use std::collections::HashSet;

use crate::{
    catalog::repository::{CatalogStore, NewProductImage},
    entity::products,
    error::{AppError, AppResult},
    storage::{FileStorage, MAX_IMAGE_BYTES, PRODUCT_IMAGE_DIR, UploadFile, discard_files},
};

#[derive(Debug, Default)]
pub struct ReconcileRequest {
    /// Public paths the client wants gone. Already checked to live under
    /// the upload prefix.
    pub images_to_delete: Vec<String>,
    pub new_files: Vec<UploadFile>,
}

#[derive(Debug)]
pub struct Reconciliation {
    pub product: products::Model,
    /// Paths whose rows were deleted. Their files still exist on disk.
    pub deleted_paths: Vec<String>,
    /// Paths stored and inserted during this run.
    pub added_paths: Vec<String>,
    /// Names of uploads rejected by validation or storage.
    pub skipped_files: Vec<String>,
    pub persisted: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct VerificationReport {
    /// Requested deletions still present after commit.
    pub strays: Vec<String>,
    pub repaired: Vec<String>,
    pub failed: Vec<String>,
    /// New thumbnail when the old one was a repaired row.
    pub thumbnail: Option<String>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.strays.is_empty()
    }
}

pub struct ImageReconciler<'a, R: ?Sized, S: ?Sized> {
    repo: &'a R,
    storage: &'a S,
    directory: &'a str,
    max_bytes: usize,
}

impl<'a, R, S> ImageReconciler<'a, R, S>
where
    R: CatalogStore + ?Sized,
    S: FileStorage + ?Sized,
{
    pub fn new(repo: &'a R, storage: &'a S) -> Self {
        Self {
            repo,
            storage,
            directory: PRODUCT_IMAGE_DIR,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Applies deletions and uploads, recomputes the thumbnail and saves the
    /// product if anything changed. On error every file stored by this run
    /// is removed again.
    pub async fn reconcile(
        &self,
        product: products::Model,
        fields_changed: bool,
        request: ReconcileRequest,
    ) -> AppResult<Reconciliation> {
        let mut uploaded = Vec::new();
        match self
            .apply(product, fields_changed, request, &mut uploaded)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if !uploaded.is_empty() {
                    tracing::warn!(count = uploaded.len(), "rolling back uploaded product images");
                    discard_files(self.storage, &uploaded).await;
                }
                Err(err)
            }
        }
    }

    async fn apply(
        &self,
        mut product: products::Model,
        fields_changed: bool,
        request: ReconcileRequest,
        uploaded: &mut Vec<String>,
    ) -> AppResult<Reconciliation> {
        let product_id = product.id;
        let current = self.repo.find_images_by_product(product_id).await?;
        tracing::debug!(
            product_id,
            current = current.len(),
            to_delete = request.images_to_delete.len(),
            new_files = request.new_files.len(),
            "reconciling product images"
        );

        let mut seen = HashSet::new();
        let mut ids_to_delete = Vec::new();
        let mut deleted_paths = Vec::new();
        for path in &request.images_to_delete {
            match current.iter().find(|img| &img.image == path) {
                Some(img) if seen.insert(img.id) => {
                    ids_to_delete.push(img.id);
                    deleted_paths.push(img.image.clone());
                }
                Some(_) => {}
                None => tracing::debug!(product_id, path = %path, "deletion path not found, skipping"),
            }
        }

        let thumbnail_needs_update =
            !product.thumbnail.is_empty() && deleted_paths.contains(&product.thumbnail);
        let mut images_changed = false;

        if !ids_to_delete.is_empty() {
            let expected = ids_to_delete.len() as u64;
            let deleted = self.repo.delete_images_batch(&ids_to_delete).await?;
            if deleted != expected {
                tracing::error!(product_id, expected, deleted, "batch image delete mismatch");
                return Err(AppError::internal(format!(
                    "expected to delete {expected} images, deleted {deleted}"
                )));
            }
            images_changed = true;
        }

        let mut staged = Vec::new();
        let mut skipped_files = Vec::new();
        let mut first_new_image: Option<String> = None;
        for file in &request.new_files {
            if let Err(err) = self.storage.validate(file, self.max_bytes) {
                tracing::warn!(product_id, file = %file.file_name, error = %err, "skipping invalid image");
                skipped_files.push(file.file_name.clone());
                continue;
            }
            let path = match self.storage.store(file, self.directory).await {
                Ok(path) => path,
                Err(err) => {
                    tracing::warn!(product_id, file = %file.file_name, error = %err, "skipping image that failed to upload");
                    skipped_files.push(file.file_name.clone());
                    continue;
                }
            };
            uploaded.push(path.clone());
            first_new_image.get_or_insert_with(|| path.clone());
            staged.push(NewProductImage {
                product_id,
                image: path,
            });
        }

        if !staged.is_empty() {
            let count = staged.len();
            if let Err(err) = self.repo.insert_images_batch(staged).await {
                tracing::error!(product_id, error = %err, "failed to save new product images");
                return Err(err);
            }
            tracing::debug!(product_id, count, "saved new product images");
            images_changed = true;
        }

        let mut thumbnail_changed = false;
        if thumbnail_needs_update || product.thumbnail.is_empty() {
            let next = match &first_new_image {
                Some(path) => path.clone(),
                None => self
                    .repo
                    .find_images_by_product(product_id)
                    .await?
                    .into_iter()
                    .next()
                    .map(|img| img.image)
                    .unwrap_or_default(),
            };
            if next != product.thumbnail {
                tracing::debug!(product_id, thumbnail = %next, "thumbnail reassigned");
                product.thumbnail = next;
                thumbnail_changed = true;
            }
        }

        let persisted = fields_changed || images_changed || thumbnail_changed;
        if persisted {
            product = self.repo.update_product(product).await?;
        }

        Ok(Reconciliation {
            product,
            deleted_paths,
            added_paths: uploaded.clone(),
            skipped_files,
            persisted,
        })
    }

    /// Removes the files of rows deleted by a committed reconciliation.
    pub async fn purge_deleted_files(&self, outcome: &Reconciliation) {
        discard_files(self.storage, &outcome.deleted_paths).await;
    }

    /// Re-reads the product's images and deletes by path any requested
    /// deletion that is still there, along with its file. A repaired
    /// thumbnail is moved to the first remaining image. Never fails the
    /// update; problems are logged and reported.
    pub async fn verify(
        &self,
        product: &products::Model,
        requested: &[String],
    ) -> VerificationReport {
        let product_id = product.id;
        let mut report = VerificationReport::default();
        if requested.is_empty() {
            return report;
        }

        let images = match self.repo.find_images_by_product(product_id).await {
            Ok(images) => images,
            Err(err) => {
                tracing::warn!(product_id, error = %err, "image verification skipped");
                return report;
            }
        };

        for path in requested {
            if !images.iter().any(|img| &img.image == path) {
                continue;
            }
            tracing::warn!(product_id, path = %path, "deleted image still present, repairing");
            report.strays.push(path.clone());
            match self.repo.delete_images_by_path(product_id, path).await {
                Ok(_) => report.repaired.push(path.clone()),
                Err(err) => {
                    tracing::error!(product_id, path = %path, error = %err, "failed to remove stray image");
                    report.failed.push(path.clone());
                }
            }
        }

        if report.repaired.is_empty() {
            return report;
        }
        discard_files(self.storage, &report.repaired).await;

        if report.repaired.contains(&product.thumbnail) {
            report.thumbnail = self.reassign_thumbnail(product).await;
        }

        report
    }

    async fn reassign_thumbnail(&self, product: &products::Model) -> Option<String> {
        let product_id = product.id;
        let next = match self.repo.find_images_by_product(product_id).await {
            Ok(images) => images.into_iter().next().map(|img| img.image).unwrap_or_default(),
            Err(err) => {
                tracing::error!(product_id, error = %err, "could not reload images for thumbnail");
                return None;
            }
        };

        let mut updated = product.clone();
        updated.thumbnail = next.clone();
        match self.repo.update_product(updated).await {
            Ok(_) => {
                tracing::debug!(product_id, thumbnail = %next, "thumbnail moved off repaired image");
                Some(next)
            }
            Err(err) => {
                tracing::error!(product_id, error = %err, "failed to move thumbnail off repaired image");
                None
            }
        }
    }
}
