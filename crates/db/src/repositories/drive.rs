//! Drive repository for database operations.
//!
//! Implements the file, folder, and share repositories using SeaORM.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr,
};
use stowage_core::drive::{
    DriveError, File, FileFilter, FileRepository, FileShare, Folder, FolderFilter,
    FolderRepository, ShareRepository,
};
use stowage_shared::types::PageRequest;

use crate::entities::{file_shares, files, folders};

/// Drive repository implementation over one connection pool.
#[derive(Debug, Clone)]
pub struct DriveStore {
    db: DatabaseConnection,
}

impl DriveStore {
    /// Create a new drive repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

const LIKE_ESCAPE: char = '\\';

/// Make `%`, `_` and the escape character match literally in a LIKE pattern.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn db_err(err: DbErr) -> DriveError {
    DriveError::repository(err.to_string())
}

/// Count, then fetch one page of, a select.
async fn fetch_page<E>(
    db: &DatabaseConnection,
    query: Select<E>,
    page: PageRequest,
) -> Result<(Vec<E::Model>, u64), DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let total = query.clone().count(db).await?;
    let rows = query
        .offset(page.offset())
        .limit(page.limit())
        .all(db)
        .await?;
    Ok((rows, total))
}

impl FileRepository for DriveStore {
    async fn create_file(&self, file: &File) -> Result<File, DriveError> {
        let model = to_file_model(file)?
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        to_file(model)
    }

    async fn update_file(&self, file: &File) -> Result<File, DriveError> {
        let model = to_file_model(file)?
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => DriveError::FileNotFound(file.id.clone()),
                other => db_err(other),
            })?;
        to_file(model)
    }

    async fn delete_file(&self, id: &str) -> Result<bool, DriveError> {
        let result = files::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn get_file(&self, id: &str) -> Result<Option<File>, DriveError> {
        files::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(to_file)
            .transpose()
    }

    async fn list_files(
        &self,
        filter: &FileFilter,
        page: PageRequest,
    ) -> Result<(Vec<File>, u64), DriveError> {
        let mut condition = Condition::all();
        if let Some(folder_id) = &filter.folder_id {
            condition = condition.add(files::Column::FolderId.eq(folder_id.as_str()));
        }
        if let Some(is_deleted) = filter.is_deleted {
            condition = condition.add(files::Column::IsDeleted.eq(is_deleted));
        }
        if let Some(tenant_id) = &filter.tenant_id {
            condition = condition.add(files::Column::TenantId.eq(tenant_id.as_str()));
        }
        if let Some(needle) = &filter.name_contains {
            condition = condition.add(
                Expr::expr(Func::lower(Expr::col(files::Column::Name))).like(
                    LikeExpr::new(format!("%{}%", escape_like(&needle.to_lowercase())))
                        .escape(LIKE_ESCAPE),
                ),
            );
        }

        let query = files::Entity::find()
            .filter(condition)
            .order_by_asc(files::Column::CreatedAt)
            .order_by_asc(files::Column::Id);
        let (rows, total) = fetch_page(&self.db, query, page).await.map_err(db_err)?;

        let files = rows.into_iter().map(to_file).collect::<Result<_, _>>()?;
        Ok((files, total))
    }

    async fn get_expired_recycle_files(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Vec<File>, DriveError> {
        files::Entity::find()
            .filter(files::Column::IsDeleted.eq(true))
            .filter(files::Column::DeletedAt.lt(before))
            .order_by_asc(files::Column::DeletedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(to_file)
            .collect()
    }
}

impl FolderRepository for DriveStore {
    async fn create_folder(&self, folder: &Folder) -> Result<Folder, DriveError> {
        let model = to_folder_model(folder)
            .insert(&self.db)
            .await
            .map_err(|e| folder_write_err(e, folder))?;

        Ok(to_folder(model))
    }

    async fn update_folder(&self, folder: &Folder) -> Result<Folder, DriveError> {
        let model = to_folder_model(folder)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => DriveError::FolderNotFound(folder.id.clone()),
                other => folder_write_err(other, folder),
            })?;

        Ok(to_folder(model))
    }

    async fn delete_folder(&self, id: &str) -> Result<bool, DriveError> {
        let result = folders::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn get_folder(&self, id: &str) -> Result<Option<Folder>, DriveError> {
        let model = folders::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(to_folder))
    }

    async fn list_folders(
        &self,
        filter: &FolderFilter,
        page: PageRequest,
    ) -> Result<(Vec<Folder>, u64), DriveError> {
        let mut query = folders::Entity::find();
        if let Some(parent_id) = &filter.parent_id {
            query = query.filter(folders::Column::ParentId.eq(parent_id.as_str()));
        }
        if let Some(name) = &filter.name {
            query = query.filter(folders::Column::Name.eq(name.as_str()));
        }
        if let Some(tenant_id) = &filter.tenant_id {
            query = query.filter(folders::Column::TenantId.eq(tenant_id.as_str()));
        }
        let query = query
            .order_by_asc(folders::Column::Name)
            .order_by_asc(folders::Column::Id);

        let (rows, total) = fetch_page(&self.db, query, page).await.map_err(db_err)?;
        Ok((rows.into_iter().map(to_folder).collect(), total))
    }
}

impl ShareRepository for DriveStore {
    async fn create_file_share(&self, share: &FileShare) -> Result<FileShare, DriveError> {
        let active_model = file_shares::ActiveModel {
            id: Set(share.id.clone()),
            file_id: Set(share.file_id.clone()),
            share_code: Set(share.share_code.clone()),
            password_hash: Set(share.password_hash.clone()),
            expire_time: Set(share.expire_time),
            created_by: Set(share.created_by.clone()),
            created_at: Set(share.created_at),
        };

        let model = active_model.insert(&self.db).await.map_err(db_err)?;
        Ok(to_share(model))
    }

    async fn get_file_share(&self, code: &str) -> Result<Option<FileShare>, DriveError> {
        let model = file_shares::Entity::find()
            .filter(file_shares::Column::ShareCode.eq(code))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(to_share))
    }
}

/// Sibling-name index violations surface as `AlreadyExists`.
fn folder_write_err(err: DbErr, folder: &Folder) -> DriveError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DriveError::AlreadyExists(format!(
            "{} already exists in folder {}",
            folder.name, folder.parent_id
        )),
        _ => db_err(err),
    }
}

fn to_file_model(file: &File) -> Result<files::ActiveModel, DriveError> {
    let size = i64::try_from(file.size)
        .map_err(|_| DriveError::invalid_input(format!("file size {} too large", file.size)))?;

    Ok(files::ActiveModel {
        id: Set(file.id.clone()),
        name: Set(file.name.clone()),
        generated_name: Set(file.generated_name.clone()),
        path: Set(file.path.clone()),
        original_path: Set(file.original_path.clone()),
        folder_id: Set(file.folder_id.clone()),
        size: Set(size),
        file_type: Set(file.file_type.clone()),
        storage_type: Set(file.storage_type.as_str().to_string()),
        url: Set(file.url.clone()),
        tenant_id: Set(file.tenant_id.clone()),
        created_by: Set(file.created_by.clone()),
        created_at: Set(file.created_at),
        updated_at: Set(file.updated_at),
        is_deleted: Set(file.is_deleted),
        deleted_by: Set(file.deleted_by.clone()),
        deleted_at: Set(file.deleted_at),
    })
}

fn to_file(model: files::Model) -> Result<File, DriveError> {
    let storage_type = model.storage_type.parse().map_err(|e| {
        DriveError::repository(format!("file {} has bad storage type: {e}", model.id))
    })?;
    let size = u64::try_from(model.size)
        .map_err(|_| DriveError::repository(format!("file {} has negative size", model.id)))?;

    Ok(File {
        id: model.id,
        name: model.name,
        generated_name: model.generated_name,
        path: model.path,
        original_path: model.original_path,
        folder_id: model.folder_id,
        size,
        file_type: model.file_type,
        storage_type,
        url: model.url,
        tenant_id: model.tenant_id,
        created_by: model.created_by,
        created_at: model.created_at,
        updated_at: model.updated_at,
        is_deleted: model.is_deleted,
        deleted_by: model.deleted_by,
        deleted_at: model.deleted_at,
    })
}

fn to_folder_model(folder: &Folder) -> folders::ActiveModel {
    folders::ActiveModel {
        id: Set(folder.id.clone()),
        name: Set(folder.name.clone()),
        parent_id: Set(folder.parent_id.clone()),
        path: Set(folder.path.clone()),
        tenant_id: Set(folder.tenant_id.clone()),
        created_by: Set(folder.created_by.clone()),
        created_at: Set(folder.created_at),
        updated_at: Set(folder.updated_at),
    }
}

fn to_folder(model: folders::Model) -> Folder {
    Folder {
        id: model.id,
        name: model.name,
        parent_id: model.parent_id,
        path: model.path,
        tenant_id: model.tenant_id,
        created_by: model.created_by,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn to_share(model: file_shares::Model) -> FileShare {
    FileShare {
        id: model.id,
        file_id: model.file_id,
        share_code: model.share_code,
        password_hash: model.password_hash,
        expire_time: model.expire_time,
        created_by: model.created_by,
        created_at: model.created_at,
    }
}

#[cfg(test)]
#[path = "drive_tests.rs"]
mod tests;
