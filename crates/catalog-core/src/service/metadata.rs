//! Persistence of the metadata entries extracted from a document.
//!
//! Each entry becomes a new record; nothing is shared with earlier revisions.
//! Records are written inside the caller's unit of work so they exist before
//! the revision that references them.

use catalog_types::error::RepositoryError;
use catalog_types::workflow::{GenericInformation, Variable};
use indexmap::IndexMap;

use crate::repository::catalog::RevisionUnitOfWork;

pub async fn persist_generic_information<U: RevisionUnitOfWork>(
    uow: &mut U,
    entries: &IndexMap<String, String>,
) -> Result<Vec<GenericInformation>, RepositoryError> {
    let records: Vec<GenericInformation> = entries
        .iter()
        .map(|(key, value)| GenericInformation::new(key.as_str(), value.as_str()))
        .collect();
    uow.save_generic_information(&records).await?;
    Ok(records)
}

pub async fn persist_variables<U: RevisionUnitOfWork>(
    uow: &mut U,
    entries: &IndexMap<String, String>,
) -> Result<Vec<Variable>, RepositoryError> {
    let records: Vec<Variable> = entries
        .iter()
        .map(|(key, value)| Variable::new(key.as_str(), value.as_str()))
        .collect();
    uow.save_variables(&records).await?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::catalog::CatalogRepository;
    use crate::test_support::MemoryCatalog;

    #[tokio::test]
    async fn test_persists_one_record_per_entry_in_order() {
        let repo = MemoryCatalog::new();
        let mut uow = repo.begin().await.unwrap();

        let mut entries = IndexMap::new();
        entries.insert("b".to_string(), "2".to_string());
        entries.insert("a".to_string(), "1".to_string());

        let records = persist_generic_information(&mut uow, &entries).await.unwrap();
        let keys: Vec<_> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_ne!(records[0].id, records[1].id);

        uow.commit().await.unwrap();
        assert_eq!(repo.counts().generic_information, 2);
    }

    #[tokio::test]
    async fn test_same_entries_twice_are_not_deduplicated() {
        let repo = MemoryCatalog::new();
        let mut entries = IndexMap::new();
        entries.insert("k".to_string(), "v".to_string());

        for _ in 0..2 {
            let mut uow = repo.begin().await.unwrap();
            persist_variables(&mut uow, &entries).await.unwrap();
            uow.commit().await.unwrap();
        }

        assert_eq!(repo.counts().variables, 2);
    }

    #[tokio::test]
    async fn test_empty_map_writes_nothing() {
        let repo = MemoryCatalog::new();
        let mut uow = repo.begin().await.unwrap();
        let records = persist_variables(&mut uow, &IndexMap::new()).await.unwrap();
        assert!(records.is_empty());
        uow.commit().await.unwrap();
        assert_eq!(repo.counts().variables, 0);
    }
}
