//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Organisation-scoped tables
//! filter with `org_id IS NOT DISTINCT FROM $n` so a user with no current
//! organisation sees only unscoped rows.

pub mod api_key_repo;
pub mod dashboard_repo;
pub mod openground_repo;
pub mod organisation_repo;
pub mod prompt_repo;
pub mod rule_entity_repo;
pub mod rule_repo;
pub mod trace_repo;
pub mod user_repo;
pub mod vault_repo;
pub mod widget_repo;

pub use api_key_repo::ApiKeyRepo;
pub use dashboard_repo::DashboardRepo;
pub use openground_repo::OpengroundRepo;
pub use organisation_repo::OrganisationRepo;
pub use prompt_repo::PromptRepo;
pub use rule_entity_repo::RuleEntityRepo;
pub use rule_repo::RuleRepo;
pub use trace_repo::TraceRepo;
pub use user_repo::UserRepo;
pub use vault_repo::VaultRepo;
pub use widget_repo::WidgetRepo;
