mod health_tracker;
mod view;
pub use health_tracker::*;
pub use view::*;

#[cfg(test)]
mod health_tracker_test;
#[cfg(test)]
mod view_test;
