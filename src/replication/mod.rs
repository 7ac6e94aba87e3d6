mod conflict;
mod coordinator;
mod record;
pub use conflict::*;
pub use coordinator::*;
pub use record::*;
