mod vector_clock;
pub use vector_clock::*;

#[cfg(test)]
mod vector_clock_test;
