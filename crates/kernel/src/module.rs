use async_trait::async_trait;
use axum::Router;

/// Settings handed to modules by the `init` and `start` hooks
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// One schema step owned by a module.
///
/// `libris_db::run_migrations` records applied steps by module name and
/// `id`, so an id must never be reused for different SQL.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A feature slice of the Libris service.
///
/// The application registers every module in a [`ModuleRegistry`] and drives
/// it through this sequence:
///
/// 1. [`init`](Module::init) on each module, in registration order;
/// 2. `libris_db::run_migrations` applies the pending [`migrations`](Module::migrations);
/// 3. [`start`](Module::start) on each module, in registration order;
/// 4. the [`routes`](Module::routes) are served under `/api/{name}`;
/// 5. [`stop`](Module::stop) on each module, in reverse order, once the
///    server has drained.
///
/// `libris migrate` runs step 2 alone.
///
/// [`ModuleRegistry`]: crate::ModuleRegistry
#[async_trait]
pub trait Module: Sync + Send {
    /// Name used for the route prefix and the migrations ledger
    fn name(&self) -> &'static str;

    /// Runs before any migration, so the schema may not exist yet
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes nested under `/api/{name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with module-relative paths, merged into `/docs/openapi.json`
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Schema steps for this module, applied in `id` order
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Runs once the schema is current, before the listener accepts requests
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after graceful shutdown has finished serving requests
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
