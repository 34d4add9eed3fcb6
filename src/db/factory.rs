//! Factory for constructing repository instances.

use std::sync::Arc;

use crate::db::repositories::LocalRepository;
use crate::db::repository::{FullRepository, RepositoryResult};

/// Factory for repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create an in-memory repository.
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create a Postgres repository from explicit configuration.
    #[cfg(feature = "postgres-repo")]
    pub fn create_postgres(
        config: &crate::db::repositories::PostgresConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo = crate::db::repositories::PostgresRepository::new(config.clone())?;
        Ok(Arc::new(repo))
    }

    /// Create the repository selected by the build's features: Postgres
    /// when `postgres-repo` is enabled (configured from the environment),
    /// otherwise the in-memory backend.
    #[cfg(feature = "postgres-repo")]
    pub fn create_default() -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = crate::db::repositories::PostgresConfig::from_env()
            .map_err(crate::db::repository::RepositoryError::configuration)?;
        Self::create_postgres(&config)
    }

    /// Create the repository selected by the build's features.
    #[cfg(not(feature = "postgres-repo"))]
    pub fn create_default() -> RepositoryResult<Arc<dyn FullRepository>> {
        Ok(Self::create_local())
    }
}
