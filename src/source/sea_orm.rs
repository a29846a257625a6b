//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于sea-orm的区域源存储实现。

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::source::entity::region;
use crate::store::SourceStore;
use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder,
};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

/// 区域源存储
///
/// 以关系型数据库为权威存储，提供按键查找、保存和按编码有序的分页扫描
pub struct RegionStore {
    db: DatabaseConnection,
}

impl RegionStore {
    /// 基于已有连接创建源存储
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 根据配置建立数据库连接
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = Database::connect(config.url.expose_secret()).await?;
        Ok(Self { db })
    }

    /// 底层数据库连接
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl SourceStore<region::Model> for RegionStore {
    #[instrument(skip(self), level = "debug")]
    async fn find_by_key(&self, key: &str) -> Result<Option<region::Model>> {
        let found = region::Entity::find_by_id(key).one(&self.db).await?;
        Ok(found)
    }

    #[instrument(skip(self, record), level = "debug", fields(code = %record.code))]
    async fn save(&self, record: region::Model) -> Result<region::Model> {
        let existing = region::Entity::find_by_id(record.code.clone())
            .one(&self.db)
            .await?;

        let active = region::ActiveModel {
            code: Set(record.code.clone()),
            name: Set(record.name.clone()),
            parent_code: Set(record.parent_code.clone()),
            updated_at: Set(chrono::Utc::now()),
        };

        let saved = if existing.is_some() {
            active.update(&self.db).await?
        } else {
            active.insert(&self.db).await?
        };
        Ok(saved)
    }

    /// 按编码有序分页扫描，页码从0开始，超出末页返回空列表
    #[instrument(skip(self), level = "debug")]
    async fn scan_page(&self, page: u64, page_size: u64) -> Result<Vec<region::Model>> {
        let records = region::Entity::find()
            .order_by_asc(region::Column::Code)
            .paginate(&self.db, page_size)
            .fetch_page(page)
            .await?;
        debug!("scan_page page={} returned {} records", page, records.len());
        Ok(records)
    }
}
