mod auth;
mod in_process;
mod transport;
pub use auth::*;
pub use in_process::*;
pub use transport::*;
