pub mod query_handlers;
pub mod state_manager;
