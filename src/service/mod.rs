pub mod analytics_service;
pub mod lead_service;
pub mod session_service;
