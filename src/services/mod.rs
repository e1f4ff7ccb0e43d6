pub mod identity_service;
pub mod inquiry_service;
pub mod mail_service;
pub mod user_cleanup_service;
pub mod user_provisioning_service;
