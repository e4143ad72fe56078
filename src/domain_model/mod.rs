mod principal;
mod session;
mod user;

pub use principal::*;
pub use session::*;
pub use user::*;
