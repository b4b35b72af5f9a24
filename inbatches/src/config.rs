/// Default amount of rows requested per batch.
pub const DEFAULT_LIMIT: u64 = 1000;
