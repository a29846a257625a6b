//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了区域记录的数据库实体。

pub mod region {
    use crate::store::CacheRecord;
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    /// 区域记录
    ///
    /// 以区域编码为主键，name为展示名称，parent_code指向上级区域
    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "regions")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub code: String,
        pub name: String,
        pub parent_code: Option<String>,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl CacheRecord for Model {
        fn record_key(&self) -> &str {
            &self.code
        }
    }
}
