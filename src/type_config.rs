use std::fmt::Debug;

use crate::network::Transport;
use crate::storage::StateMachine;

/// Binds the pluggable seams of one engine assembly.
///
/// **This coding style learned from OpenRaft project type config.**
pub trait TypeConfig: Sync + Send + Sized + Debug + Clone + Copy + 'static {
    type TR: Transport;

    type SM: StateMachine;
}

pub mod alias {
    use super::TypeConfig;

    pub type TROF<T> = <T as TypeConfig>::TR;

    pub type SMOF<T> = <T as TypeConfig>::SM;
}
