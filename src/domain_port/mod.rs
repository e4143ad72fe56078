mod auth_repo;
mod session_repo;
mod user_repo;

mod repo_tx;

pub use auth_repo::*;
pub use session_repo::*;
pub use user_repo::*;

pub use repo_tx::*;
