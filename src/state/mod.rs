pub mod app_settings;
pub mod identity;
pub mod lock;
pub mod session;
