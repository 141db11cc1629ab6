//! Copy-then-delete moves for stores without atomic rename.

use async_trait::async_trait;
use opendal::Operator;
use tracing::{error, warn};

use crate::storage::error::StorageError;

/// The two primitives a non-atomic move is built from.
#[async_trait]
pub(crate) trait ObjectOps: Send + Sync {
    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError>;
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl ObjectOps for Operator {
    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        Operator::copy(self, from, to).await.map_err(Into::into)
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        Operator::delete(self, path).await.map_err(Into::into)
    }
}

/// Move `from` to `to` without ever leaving two live copies.
///
/// If the source cannot be deleted after the copy, the copy is deleted and
/// the original error is returned. A failed rollback is logged and does not
/// replace the original error.
pub(crate) async fn relocate<O>(ops: &O, from: &str, to: &str) -> Result<(), StorageError>
where
    O: ObjectOps + ?Sized,
{
    ops.copy(from, to).await?;

    if let Err(err) = ops.delete(from).await {
        warn!(from = %from, to = %to, error = %err, "delete after copy failed, rolling back copy");
        if let Err(rollback_err) = ops.delete(to).await {
            error!(
                from = %from,
                to = %to,
                error = %rollback_err,
                "rollback of copied object failed, two copies remain"
            );
        }
        return Err(err);
    }
    Ok(())
}
