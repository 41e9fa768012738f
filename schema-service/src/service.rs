//! 表结构发现服务模块
//!
//! 每个请求通过 `SchemaFacade::scoped` 独占一个连接，流程结束（无论成功或失败）即释放。

use std::time::Instant;

use async_trait::async_trait;
use validator::Validate;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::{FindRequest, FindResult, ModelSummary, Qualifier, SchemaDescriptor};
use common::utils::model_name;
use schema_facade::SchemaFacade;

/// 表结构发现服务 Trait
#[async_trait]
pub trait DiscoveryServiceTrait: Send + Sync {
    /// 发现表结构
    async fn describe(&self, table: &str, qualifier: Qualifier) -> AppResult<SchemaDescriptor>;

    /// 发现表结构并构建模型，返回模型摘要
    async fn models(&self, table: &str, qualifier: Qualifier) -> AppResult<Vec<ModelSummary>>;

    /// 构建模型并查询记录
    async fn find(&self, table: &str, req: FindRequest) -> AppResult<FindResult>;
}

/// 表结构发现服务
pub struct DiscoveryService {
    config: AppConfig,
}

impl DiscoveryService {
    /// 创建新的发现服务实例
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DiscoveryServiceTrait for DiscoveryService {
    async fn describe(&self, table: &str, qualifier: Qualifier) -> AppResult<SchemaDescriptor> {
        let table = table.to_string();
        SchemaFacade::scoped(
            self.config.data_source.clone(),
            &self.config.pool,
            |facade| async move {
                let schema = facade.discover_schema(&table, &qualifier).await?;
                Ok::<_, AppError>(schema)
            },
        )
        .await
    }

    async fn models(&self, table: &str, qualifier: Qualifier) -> AppResult<Vec<ModelSummary>> {
        let table = table.to_string();
        SchemaFacade::scoped(
            self.config.data_source.clone(),
            &self.config.pool,
            |facade| async move {
                let models = facade.discover_and_build_models(&table, &qualifier).await?;
                let summaries: Vec<ModelSummary> = models.values().map(|m| m.summary()).collect();
                Ok::<_, AppError>(summaries)
            },
        )
        .await
    }

    async fn find(&self, table: &str, req: FindRequest) -> AppResult<FindResult> {
        req.validate()?;
        let start = Instant::now();
        let table = table.to_string();
        let FindRequest { qualifier, filter } = req;

        let (model, records) = SchemaFacade::scoped(
            self.config.data_source.clone(),
            &self.config.pool,
            |facade| async move {
                let models = facade.discover_and_build_models(&table, &qualifier).await?;
                let name = model_name(&table);
                let handle = models.get(&name).ok_or_else(|| {
                    AppError::ModelConstruction(format!("model `{}` was not built", name))
                })?;
                let records = handle.find(filter.as_ref()).await?;
                Ok::<_, AppError>((name, records))
            },
        )
        .await?;

        let execution_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(model = %model, rows = records.len(), execution_time_ms, "查询完成");
        Ok(FindResult {
            model,
            row_count: records.len(),
            records,
            execution_time_ms,
        })
    }
}
