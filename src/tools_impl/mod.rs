pub mod bloat;
pub mod config_tools;
pub mod connections;
pub mod files;
pub mod query;
pub mod resource_tool;
pub mod schema;
pub mod semantic;
pub mod server_info;

use std::sync::Arc;

use crate::app::AppShared;
use crate::registry::{ResourceRegistry, ToolRegistry};

/// Register every tool this server exposes (§4.5, §9 supplemented list).
pub fn register_all(registry: &mut ToolRegistry, shared: Arc<AppShared>, resources: Arc<ResourceRegistry>) {
    registry.register(Arc::new(schema::GetSchemaInfo::new(shared.clone())));
    registry.register(Arc::new(query::QueryDatabase::new(shared.clone())));
    registry.register(Arc::new(query::ExecuteExplain::new(shared.clone())));
    registry.register(Arc::new(config_tools::SetPgConfiguration::new(shared.clone())));
    registry.register(Arc::new(config_tools::RecommendPgConfiguration::new(shared.clone())));
    registry.register(Arc::new(bloat::AnalyzeBloat::new(shared.clone())));
    registry.register(Arc::new(files::ReadServerLog::new(shared.clone())));
    registry.register(Arc::new(files::ReadPostgresqlConf::new(shared.clone())));
    registry.register(Arc::new(files::ReadPgHbaConf::new(shared.clone())));
    registry.register(Arc::new(files::ReadPgIdentConf::new(shared.clone())));
    registry.register(Arc::new(resource_tool::ReadResource::new(resources)));
    registry.register(Arc::new(connections::ManageConnections::new(shared.clone())));
    registry.register(Arc::new(semantic::SemanticSearch::new(shared.clone())));
    registry.register(Arc::new(semantic::SearchSimilar::new(shared.clone())));
    registry.register(Arc::new(server_info::ServerInfo::new(shared)));
}
