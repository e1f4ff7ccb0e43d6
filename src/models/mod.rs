pub mod identity;
pub mod inquiry;
pub mod user;

pub use identity::*;
pub use inquiry::*;
pub use user::*;
