mod auth_service_fake;
mod auth_service_impl;
mod session_service_fake;
mod session_service_impl;
mod user_service_fake;
mod user_service_impl;

pub use auth_service_fake::*;
pub use auth_service_impl::*;
pub use session_service_fake::*;
pub use session_service_impl::*;
pub use user_service_fake::*;
pub use user_service_impl::*;
