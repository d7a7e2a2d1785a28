pub mod settings;
pub mod stats;
pub mod table;

use std::sync::Arc;

use crate::app::AppShared;
use crate::registry::ResourceRegistry;

pub fn register_all(registry: &mut ResourceRegistry, shared: Arc<AppShared>) {
    registry.register(Arc::new(table::TableResource::new(shared.clone())));
    registry.register(Arc::new(stats::StatResource::new(shared.clone())));
    registry.register(Arc::new(stats::StatioResource::new(shared.clone())));
    registry.register(Arc::new(settings::SettingsResource::new(shared)));
    registry.register(Arc::new(settings::SystemInfoResource));
}
