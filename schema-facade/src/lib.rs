//! Schema discovery and ad-hoc models over relational data sources.
//!
//! ```ignore
//! let facade = SchemaFacade::connect(config, &PoolConfig::default()).await?;
//! let models = facade
//!     .discover_and_build_models("account", &Qualifier::owner("dbo"))
//!     .await?;
//! let records = models["Account"].find(None).await?;
//! facade.disconnect().await;
//! ```

mod dialect;
pub mod facade;
mod introspect;
pub mod model;
mod row;

pub use facade::{DatabasePool, Lifecycle, SchemaFacade};
pub use model::{ModelHandle, Models};
