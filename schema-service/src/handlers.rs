//! Handler模块

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::middleware::RequestId;
use common::models::{FindRequest, FindResult, ModelSummary, Qualifier, SchemaDescriptor};
use common::response::ApiResponse;
use crate::service::{DiscoveryService, DiscoveryServiceTrait};
use crate::state::AppState;

/// 发现表结构
#[utoipa::path(
    get,
    path = "/api/schemas/{table}",
    tag = "schemas",
    params(
        ("table" = String, Path, description = "表名"),
        ("owner" = Option<String>, Query, description = "所有者命名空间（当前方言忽略）"),
        ("schema" = Option<String>, Query, description = "模式命名空间")
    ),
    responses(
        (status = 200, description = "表结构", body = ApiResponse<SchemaDescriptor>),
        (status = 400, description = "表名或限定符无效"),
        (status = 404, description = "表不存在")
    )
)]
pub async fn get_schema(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(table): Path<String>,
    Query(qualifier): Query<Qualifier>,
) -> Result<Json<ApiResponse<SchemaDescriptor>>, AppError> {
    let service = DiscoveryService::new(state.config.clone());
    let data = service.describe(&table, qualifier).await?;
    Ok(Json(
        ApiResponse::ok_with_service(data, state.config.service_name.clone())
            .with_request_id(request_id.as_str()),
    ))
}

/// 发现表结构并构建模型
#[utoipa::path(
    get,
    path = "/api/models/{table}",
    tag = "models",
    params(
        ("table" = String, Path, description = "表名"),
        ("owner" = Option<String>, Query, description = "所有者命名空间（当前方言忽略）"),
        ("schema" = Option<String>, Query, description = "模式命名空间"),
        ("associations" = Option<bool>, Query, description = "同时构建外键引用的表")
    ),
    responses(
        (status = 200, description = "模型列表", body = ApiResponse<Vec<ModelSummary>>),
        (status = 404, description = "表不存在"),
        (status = 422, description = "无法构建模型")
    )
)]
pub async fn list_models(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(table): Path<String>,
    Query(qualifier): Query<Qualifier>,
) -> Result<Json<ApiResponse<Vec<ModelSummary>>>, AppError> {
    let service = DiscoveryService::new(state.config.clone());
    let data = service.models(&table, qualifier).await?;
    Ok(Json(
        ApiResponse::ok_with_service(data, state.config.service_name.clone())
            .with_request_id(request_id.as_str()),
    ))
}

/// 查询模型记录
#[utoipa::path(
    post,
    path = "/api/models/{table}/find",
    tag = "models",
    params(("table" = String, Path, description = "表名")),
    request_body = FindRequest,
    responses(
        (status = 200, description = "查询成功", body = ApiResponse<FindResult>),
        (status = 400, description = "过滤条件无效"),
        (status = 404, description = "表不存在"),
        (status = 422, description = "无法构建模型"),
        (status = 502, description = "查询执行失败")
    )
)]
pub async fn find_records(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(table): Path<String>,
    Json(req): Json<FindRequest>,
) -> Result<Json<ApiResponse<FindResult>>, AppError> {
    let service = DiscoveryService::new(state.config.clone());
    let result = service.find(&table, req).await?;
    let duration = result.execution_time_ms;
    Ok(Json(
        ApiResponse::ok_with_service(result, state.config.service_name.clone())
            .with_request_id(request_id.as_str())
            .with_duration(duration),
    ))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
