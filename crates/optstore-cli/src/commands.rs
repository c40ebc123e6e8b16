//! Command implementations

pub mod migrate;
pub mod options;

use clap::Args;
use optstore_core::{Identity, OptionStore, TenantId};
use optstore_core_types::RequestContext;
use optstore_store::SqliteEngine;

use crate::config::Settings;
use crate::error::CliError;

/// Identity and scope flags shared by every command
#[derive(Debug, Clone, Default, Args)]
pub struct ScopeArgs {
    /// Explicit tenant scope for the operation
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub tenant: Option<i64>,

    /// Act as this user (without --user-tenant the identity is not tenant-aware)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Tenant the acting user belongs to
    #[arg(long, global = true, requires = "user", allow_negative_numbers = true)]
    pub user_tenant: Option<i64>,
}

impl ScopeArgs {
    pub fn identity(&self) -> Identity {
        match (&self.user, self.user_tenant) {
            (None, _) => Identity::Anonymous,
            (Some(user), None) => Identity::simple(user.clone()),
            (Some(user), Some(tenant)) => Identity::tenanted(user.clone(), tenant),
        }
    }

    pub fn explicit_tenant(&self) -> Option<TenantId> {
        self.tenant.map(TenantId::new)
    }
}

/// Open the configured database and bind it to the caller's identity
pub fn open_store(
    settings: &Settings,
    scope: &ScopeArgs,
) -> Result<OptionStore<SqliteEngine>, CliError> {
    let engine = SqliteEngine::open(&settings.database_path, settings.busy_timeout_ms)?;
    Ok(OptionStore::new(engine, scope.identity())
        .with_request_context(RequestContext::new()))
}
