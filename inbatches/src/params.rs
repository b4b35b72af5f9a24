/// Describes which batch to fetch, i.e., the `OFFSET` and `LIMIT` of the
/// query.
///
/// The limit is fixed for the lifetime of a [`Rows`](crate::Rows) cursor; the
/// offset starts at zero and is advanced by exactly `limit` after each full
/// batch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Params {
    pub limit: u64,
    pub offset: u64,
}

impl Params {
    /// Creates the parameters of the first batch.
    pub fn first(limit: u64) -> Self {
        Params { limit, offset: 0 }
    }

    /// Returns the parameters of the batch following this one, or `None` if
    /// the offset would overflow.
    pub fn next(self) -> Option<Self> {
        let offset = self.offset.checked_add(self.limit)?;
        Some(Params { offset, ..self })
    }
}
