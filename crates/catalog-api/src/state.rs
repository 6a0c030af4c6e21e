//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository/parser traits, but AppState pins them
//! to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use catalog_core::parser::XmlWorkflowParser;
use catalog_core::service::bucket::BucketService;
use catalog_core::service::query::CatalogQueryService;
use catalog_core::service::revision::RevisionService;
use catalog_infra::config::resolve_database_url;
use catalog_infra::sqlite::catalog::SqliteCatalogRepository;
use catalog_infra::sqlite::pool::DatabasePool;
use catalog_types::config::CatalogConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteBucketService = BucketService<SqliteCatalogRepository>;

pub type ConcreteRevisionService = RevisionService<SqliteCatalogRepository, XmlWorkflowParser>;

pub type ConcreteQueryService = CatalogQueryService<SqliteCatalogRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub bucket_service: Arc<ConcreteBucketService>,
    pub revision_service: Arc<ConcreteRevisionService>,
    pub query_service: Arc<ConcreteQueryService>,
    pub config: Arc<CatalogConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init(data_dir: PathBuf, config: CatalogConfig) -> anyhow::Result<Self> {
        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_url = resolve_database_url(&config, &data_dir);
        let db_pool = DatabasePool::new(&db_url).await?;

        Ok(Self::from_pool(db_pool, config, data_dir))
    }

    /// Wire services on top of an already opened pool.
    pub fn from_pool(db_pool: DatabasePool, config: CatalogConfig, data_dir: PathBuf) -> Self {
        let repo = SqliteCatalogRepository::new(db_pool);

        Self {
            bucket_service: Arc::new(BucketService::new(repo.clone())),
            revision_service: Arc::new(RevisionService::new(repo.clone(), XmlWorkflowParser::new())),
            query_service: Arc::new(CatalogQueryService::new(repo, config.pagination.clone())),
            config: Arc::new(config),
            data_dir,
        }
    }
}
