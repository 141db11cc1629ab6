//! Drive schema: folders, files, and file shares.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DRIVE_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS file_shares CASCADE;
             DROP TABLE IF EXISTS files CASCADE;
             DROP TABLE IF EXISTS folders CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const DRIVE_SQL: &str = r"
-- Folders. parent_id '0' is the root; path is fixed at creation.
CREATE TABLE folders (
    id VARCHAR(64) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    parent_id VARCHAR(64) NOT NULL DEFAULT '0',
    path TEXT NOT NULL,
    tenant_id TEXT NOT NULL DEFAULT '',
    created_by TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_folder_not_own_parent CHECK (parent_id <> id)
);

-- Sibling names are unique per tenant
CREATE UNIQUE INDEX idx_folders_sibling_name ON folders(tenant_id, parent_id, name);

-- Files. original_path is set only while the file is in the recycle bin.
CREATE TABLE files (
    id VARCHAR(64) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    -- 32-char id, a dot, and an extension of at most 32 chars
    generated_name VARCHAR(255) NOT NULL,
    path TEXT NOT NULL,
    original_path TEXT NOT NULL DEFAULT '',
    folder_id VARCHAR(64) NOT NULL DEFAULT '0',
    size BIGINT NOT NULL,
    file_type VARCHAR(32) NOT NULL DEFAULT '', -- same bound as MAX_FILE_TYPE_LEN
    storage_type VARCHAR(16) NOT NULL,
    url TEXT NOT NULL DEFAULT '',
    tenant_id TEXT NOT NULL DEFAULT '',
    created_by TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_by TEXT,
    deleted_at TIMESTAMPTZ,
    CONSTRAINT chk_file_size_positive CHECK (size > 0),
    CONSTRAINT chk_recycle_state CHECK (
        (is_deleted AND original_path <> '' AND deleted_at IS NOT NULL)
        OR (NOT is_deleted AND original_path = '')
    )
);

-- Folder listings of active files
CREATE INDEX idx_files_folder ON files(folder_id, created_at) WHERE NOT is_deleted;

-- Recycle bin listing and cleaner sweeps
CREATE INDEX idx_files_recycled ON files(deleted_at) WHERE is_deleted;

-- Shares. A purged file takes its shares with it.
CREATE TABLE file_shares (
    id VARCHAR(64) PRIMARY KEY,
    file_id VARCHAR(64) NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    share_code VARCHAR(32) NOT NULL UNIQUE,
    password_hash TEXT NOT NULL DEFAULT '',
    expire_time BIGINT NOT NULL,
    created_by TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_expire_positive CHECK (expire_time > 0)
);

CREATE INDEX idx_file_shares_file ON file_shares(file_id);
";
