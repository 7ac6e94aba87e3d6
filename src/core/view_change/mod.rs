mod view_change_handler;
pub(crate) use view_change_handler::*;

#[cfg(test)]
mod view_change_handler_test;
