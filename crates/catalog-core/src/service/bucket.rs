//! Bucket registration and lookup.

use catalog_types::bucket::{Bucket, BucketId};
use catalog_types::error::{CatalogError, RepositoryError};

use crate::repository::catalog::CatalogRepository;

const MAX_BUCKET_NAME_LEN: usize = 255;

pub struct BucketService<R: CatalogRepository> {
    repo: R,
}

impl<R: CatalogRepository> BucketService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Register a new bucket. Names are trimmed and must be unique.
    pub async fn create_bucket(&self, name: &str) -> Result<Bucket, CatalogError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_BUCKET_NAME_LEN {
            return Err(CatalogError::InvalidBucketName(format!(
                "bucket name must be 1 to {MAX_BUCKET_NAME_LEN} characters"
            )));
        }

        let bucket = Bucket::new(name);
        self.repo.create_bucket(&bucket).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => CatalogError::BucketConflict(name.to_string()),
            other => CatalogError::Storage(other),
        })?;

        tracing::info!(bucket_id = %bucket.id, name = %bucket.name, "created bucket");
        Ok(bucket)
    }

    pub async fn get_bucket(&self, id: &BucketId) -> Result<Bucket, CatalogError> {
        self.repo
            .find_bucket(id)
            .await?
            .ok_or(CatalogError::BucketNotFound)
    }

    pub async fn list_buckets(&self) -> Result<Vec<Bucket>, CatalogError> {
        Ok(self.repo.list_buckets().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryCatalog;

    #[tokio::test]
    async fn test_create_and_get_bucket() {
        let service = BucketService::new(MemoryCatalog::new());
        let bucket = service.create_bucket("  pipelines ").await.unwrap();
        assert_eq!(bucket.name, "pipelines");

        let found = service.get_bucket(&bucket.id).await.unwrap();
        assert_eq!(found, bucket);
        assert_eq!(service.list_buckets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_bucket_name_conflicts() {
        let service = BucketService::new(MemoryCatalog::new());
        service.create_bucket("dup").await.unwrap();
        let err = service.create_bucket("dup").await.unwrap_err();
        assert!(matches!(err, CatalogError::BucketConflict(ref n) if n == "dup"));
    }

    #[tokio::test]
    async fn test_bucket_name_length_limit() {
        let service = BucketService::new(MemoryCatalog::new());
        let longest = "b".repeat(MAX_BUCKET_NAME_LEN);
        assert_eq!(service.create_bucket(&longest).await.unwrap().name, longest);

        let wide = "é".repeat(MAX_BUCKET_NAME_LEN);
        assert!(service.create_bucket(&wide).await.is_ok());

        let too_long = "b".repeat(MAX_BUCKET_NAME_LEN + 1);
        let err = service.create_bucket(&too_long).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidBucketName(_)));
    }

    #[tokio::test]
    async fn test_blank_bucket_name_rejected() {
        let service = BucketService::new(MemoryCatalog::new());
        let err = service.create_bucket("   ").await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidBucketName(_)));
    }

    #[tokio::test]
    async fn test_unknown_bucket() {
        let service = BucketService::new(MemoryCatalog::new());
        let err = service.get_bucket(&BucketId::new()).await.unwrap_err();
        assert!(matches!(err, CatalogError::BucketNotFound));
    }
}
