use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{DbConn, DbErr, EntityTrait, PrimaryKeyTrait};

use forum_core::error::RepoError;
use forum_core::ports::ReadRepository;

/// Lookup by primary key for any table whose row converts straight into a
/// domain value.
pub struct PostgresBaseRepository<E: EntityTrait> {
    pub(crate) db: DbConn,
    entity: PhantomData<E>,
}

impl<E: EntityTrait> PostgresBaseRepository<E> {
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E, T, ID> ReadRepository<T, ID> for PostgresBaseRepository<E>
where
    E: EntityTrait,
    E::Model: Send + Sync,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = ID>,
    ID: Into<sea_orm::Value> + Copy + Send + Sync + 'static,
    T: From<E::Model> + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError> {
        let row = E::find_by_id(id).one(&self.db).await.map_err(map_db_err)?;
        Ok(row.map(T::from))
    }
}

const CONSTRAINT_MARKERS: [&str; 3] = ["duplicate", "unique", "foreign key"];

/// Sort a SeaORM failure into the repository error kinds.
pub(crate) fn map_db_err(err: DbErr) -> RepoError {
    match err {
        DbErr::Conn(e) => RepoError::Connection(e.to_string()),
        DbErr::ConnectionAcquire(e) => RepoError::Connection(e.to_string()),
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
        other => {
            let message = other.to_string();
            let lowered = message.to_lowercase();
            if CONSTRAINT_MARKERS.iter().any(|m| lowered.contains(m)) {
                RepoError::Constraint(message)
            } else {
                RepoError::Query(message)
            }
        }
    }
}
