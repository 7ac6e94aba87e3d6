// -
// Channel capacities

/// Commit event stream buffer (subscribers lagging past this lose events)
pub(crate) const COMMIT_STREAM_CAPACITY: usize = 256;

// -
// Protocol

/// The view number all clusters boot in
pub(crate) const GENESIS_VIEW: u64 = 0;

/// The first sequence number a leader assigns within a view
pub(crate) const INITIAL_SEQUENCE: u64 = 1;
