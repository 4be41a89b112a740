pub mod api_client;
pub mod config;
pub mod export;
pub mod logging;
pub mod table_display;
