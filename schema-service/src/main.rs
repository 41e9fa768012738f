//! 表结构发现服务
//!
//! 提供运行时表结构发现与临时模型查询功能，包括：
//! - 发现表结构（列、类型、主键与外键）
//! - 按表构建模型，可选构建外键引用的表
//! - 通过模型按条件查询记录

mod handlers;
mod routes;
mod service;
mod state;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "schema-service";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "表结构发现服务 API",
        version = "0.1.0",
        description = "表结构发现与模型查询微服务"
    ),
    paths(
        handlers::get_schema,
        handlers::list_models,
        handlers::find_records,
        handlers::health_check,
    ),
    components(schemas(
        common::models::SchemaDescriptor,
        common::models::ColumnDescriptor,
        common::models::ColumnType,
        common::models::KeyRole,
        common::models::ForeignKeyRef,
        common::models::DbType,
        common::models::Qualifier,
        common::models::Filter,
        common::models::FindRequest,
        common::models::FindResult,
        common::models::ModelSummary,
        handlers::HealthResponse,
    )),
    tags(
        (name = "schemas", description = "表结构发现端点"),
        (name = "models", description = "模型构建与查询端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME).context("加载配置失败")?;

    // 创建应用状态
    let state = AppState::new(config.clone());

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = format!("{}:{}", config.host, config.port);
    info!(
        service = SERVICE_NAME,
        address = %addr,
        data_source = %config.data_source.name,
        db_type = %config.data_source.db_type,
        "启动服务"
    );

    let listener = TcpListener::bind(&addr).await.context("绑定地址失败")?;
    axum::serve(listener, app).await.context("服务启动失败")?;
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
