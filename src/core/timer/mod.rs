mod progress_timer;
pub(crate) use progress_timer::*;
