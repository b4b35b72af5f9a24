pub type Result<T, E> = std::result::Result<T, Error<E>>;

/// Errors reported by [`Rows`](crate::Rows), generic over the error type `E`
/// of the underlying data source.
///
/// Every variant but [`Error::ZeroLimit`] is terminal for the cursor which
/// observed it.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// The batch limit must be positive, otherwise no batch would ever be
    /// short and the same batch would be requested forever.
    #[error("batch limit must be positive")]
    ZeroLimit,

    /// The query callback failed to produce the batch.
    #[error("query failed for batch at offset {offset}")]
    Query {
        offset: u64,
        #[source]
        source: E,
    },

    /// The batch failed while its rows were being consumed.
    #[error("batch at offset {offset} failed while reading rows")]
    Batch {
        offset: u64,
        #[source]
        source: E,
    },

    /// Releasing the batch failed.
    #[error("failed to close batch at offset {offset}")]
    Close {
        offset: u64,
        #[source]
        source: E,
    },

    /// The next offset does not fit in an `u64`.
    #[error("offset overflow (offset {offset}, limit {limit})")]
    OffsetOverflow { offset: u64, limit: u64 },
}

impl<E> Error<E> {
    /// Returns the offset of the batch which caused the error, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Error::ZeroLimit => None,
            Error::Query { offset, .. }
            | Error::Batch { offset, .. }
            | Error::Close { offset, .. }
            | Error::OffsetOverflow { offset, .. } => Some(*offset),
        }
    }

    /// Returns the data source error, if the error originated from it.
    pub fn source_error(&self) -> Option<&E> {
        match self {
            Error::Query { source, .. }
            | Error::Batch { source, .. }
            | Error::Close { source, .. } => Some(source),
            Error::ZeroLimit | Error::OffsetOverflow { .. } => None,
        }
    }
}
