//! 命令行表结构发现工具
//!
//! 连接配置的数据源，发现一张表的结构并打印，然后为其构建模型并打印全部记录。
//! 结构与记录以 JSON 输出到标准输出，日志输出到标准错误。

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use common::config::AppConfig;
use common::models::{Filter, Qualifier, MAX_LIMIT};
use schema_facade::SchemaFacade;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "discover";

/// Discover a table's structure and list its records.
#[derive(Debug, Parser)]
#[command(name = "discover", version, about)]
struct Cli {
    /// Table to discover.
    #[arg(default_value = "account", env = "DISCOVER_TABLE")]
    table: String,

    /// Owner namespace (ignored by dialects without owners).
    #[arg(long)]
    owner: Option<String>,

    /// Schema namespace.
    #[arg(long)]
    schema: Option<String>,

    /// Also build models for tables referenced through foreign keys.
    #[arg(long)]
    associations: bool,

    /// Maximum number of records to print.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_LIMIT)))]
    limit: Option<u32>,
}

impl Cli {
    fn qualifier(&self) -> Qualifier {
        Qualifier {
            owner: self.owner.clone(),
            schema: self.schema.clone(),
            associations: self.associations,
        }
    }

    fn filter(&self) -> Option<Filter> {
        self.limit.map(|limit| Filter::default().limit(limit))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("写出 JSON 失败")?;
    writeln!(out)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 初始化日志追踪（输出到 stderr，避免与 JSON 输出混在一起）
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME).context("加载配置失败")?;
    info!(
        service = SERVICE_NAME,
        data_source = %config.data_source.name,
        table = %cli.table,
        "开始发现表结构"
    );

    let qualifier = cli.qualifier();
    let filter = cli.filter();
    let table = cli.table.as_str();

    SchemaFacade::scoped(config.data_source, &config.pool, |facade| async move {
        let schema = facade.discover_schema(table, &qualifier).await?;
        print_json(&schema)?;

        let models = facade.discover_and_build_models(table, &qualifier).await?;
        let model = models
            .get(&schema.name)
            .with_context(|| format!("模型 {} 未构建", schema.name))?;
        let records = model.find(filter.as_ref()).await?;
        print_json(&records)?;

        info!(model = %model.name(), rows = records.len(), "查询完成");
        Ok::<_, anyhow::Error>(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_qualifier_from_flags() {
        let cli = Cli::try_parse_from(["discover", "ledger", "--owner", "dbo", "--associations"])
            .unwrap();
        assert_eq!(cli.table, "ledger");
        let qualifier = cli.qualifier();
        assert_eq!(qualifier.owner.as_deref(), Some("dbo"));
        assert_eq!(qualifier.schema, None);
        assert!(qualifier.associations);
        assert!(cli.filter().is_none());
    }

    #[test]
    fn test_limit_range() {
        let cli = Cli::try_parse_from(["discover", "account", "--limit", "5"]).unwrap();
        assert_eq!(cli.filter().and_then(|f| f.limit), Some(5));
        assert!(Cli::try_parse_from(["discover", "--limit", "0"]).is_err());
    }
}
