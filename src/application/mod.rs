// Application layer - Use cases and collaborator traits
pub mod chart_service;
pub mod dashboard_service;
pub mod layout_store;
pub mod refresh_service;
pub mod sample_feed;
pub mod settings_service;
pub mod settings_store;

#[cfg(test)]
pub mod testing;
