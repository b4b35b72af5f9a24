use std::{fmt, iter::FusedIterator};

use tracing::{debug, instrument, trace};

use crate::{
    error::{Error, Result},
    Batch, Params,
};

/// The rows of a query fetched in batches of at most `limit` rows.
///
/// The query is called once per batch with increasing offsets, and must be
/// ordered so that batches are consistent and together return all rows.
/// Batches stop when there is an error or when the query returns less rows
/// than `limit`.
///
/// ```
/// use inbatches::{IterBatch, Params, Rows};
///
/// let table: Vec<u32> = (1..=12).collect();
/// let mut rows = Rows::of(5, |params: Params| {
///     let batch: Vec<Result<u32, std::io::Error>> = table
///         .iter()
///         .skip(params.offset as usize)
///         .take(params.limit as usize)
///         .map(|&n| Ok(n))
///         .collect();
///     Ok(IterBatch::new(batch))
/// })?;
///
/// let mut sum = 0;
/// while rows.advance() {
///     sum += rows.row().copied().unwrap_or_default();
/// }
/// assert!(rows.err().is_none());
/// rows.close()?;
///
/// assert_eq!(sum, 78);
/// assert_eq!(rows.batches(), 3);
/// # Ok::<(), inbatches::error::Error<std::io::Error>>(())
/// ```
pub struct Rows<Q, B: Batch> {
    query: Q,
    params: Params,
    /// The open batch. `None` once released.
    batch: Option<B>,
    /// Rows read from the current batch.
    count: u64,
    /// Query invocations.
    batches: u64,
    row: Option<B::Row>,
    done: bool,
    err: Option<Error<B::Error>>,
}

impl<Q, B> Rows<Q, B>
where
    Q: FnMut(Params) -> std::result::Result<B, B::Error>,
    B: Batch,
{
    /// Initiates a query in batches of `limit` rows.
    ///
    /// The first batch is requested before returning, so that a failing query
    /// is reported here rather than on the first [`advance`](Self::advance).
    pub fn of(limit: u64, query: Q) -> Result<Self, B::Error> {
        if limit == 0 {
            return Err(Error::ZeroLimit);
        }
        let mut rows = Rows {
            query,
            params: Params::first(limit),
            batch: None,
            count: 0,
            batches: 0,
            row: None,
            done: false,
            err: None,
        };
        rows.batch = Some(rows.fetch()?);
        Ok(rows)
    }

    /// Advances to the next row, requesting the next batch once the current
    /// one is exhausted. Returns `false` at the end of the rows or on error,
    /// which [`err`](Self::err) distinguishes.
    pub fn advance(&mut self) -> bool {
        if self.err.is_some() || self.done || self.batch.is_none() {
            return false;
        }
        self.row = None;
        match self.read_row() {
            Ok(true) => true,
            Ok(false) => self.next_batch(),
            Err(error) => self.fail(error),
        }
    }

    /// Returns the error which stopped the iteration, if any. Once set, the
    /// error never changes.
    pub fn err(&self) -> Option<&Error<B::Error>> {
        self.err.as_ref()
    }

    /// Returns the current row, i.e., the one yielded by the last successful
    /// call to [`advance`](Self::advance).
    pub fn row(&self) -> Option<&B::Row> {
        self.row.as_ref()
    }

    /// Moves the current row out of the cursor.
    pub fn take_row(&mut self) -> Option<B::Row> {
        self.row.take()
    }

    /// Returns the parameters of the last requested batch.
    pub fn params(&self) -> Params {
        self.params
    }

    /// Returns how many times the query was called.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Releases the open batch. No batch is requested afterwards.
    ///
    /// Calling this more than once is a no-op.
    pub fn close(&mut self) -> Result<(), B::Error> {
        self.row = None;
        self.close_batch()
    }

    /// Consumes the cursor, releasing the open batch. Returns the error which
    /// stopped the iteration or, failing that, the release error.
    pub fn finish(mut self) -> Result<(), B::Error> {
        let closed = self.close();
        match self.err.take() {
            Some(error) => Err(error),
            None => closed,
        }
    }

    /// Reads a row from the current batch. `Ok(false)` means the batch is
    /// exhausted.
    fn read_row(&mut self) -> Result<bool, B::Error> {
        let Some(batch) = &mut self.batch else {
            return Ok(false);
        };
        match batch.next_row() {
            Ok(Some(row)) => {
                self.count += 1;
                self.row = Some(row);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(source) => Err(Error::Batch {
                offset: self.params.offset,
                source,
            }),
        }
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(offset = self.params.offset, count = self.count)
    )]
    fn next_batch(&mut self) -> bool {
        if let Err(error) = self.close_batch() {
            return self.fail(error);
        }
        if self.count < self.params.limit {
            debug!("short batch, no more rows");
            self.done = true;
            return false;
        }

        let Some(params) = self.params.next() else {
            let Params { limit, offset } = self.params;
            return self.fail(Error::OffsetOverflow { offset, limit });
        };
        self.params = params;
        self.count = 0;
        match self.fetch() {
            Ok(batch) => self.batch = Some(batch),
            Err(error) => return self.fail(error),
        }

        match self.read_row() {
            Ok(true) => true,
            Ok(false) => {
                debug!("empty batch, no more rows");
                self.done = true;
                false
            }
            Err(error) => self.fail(error),
        }
    }

    fn fetch(&mut self) -> Result<B, B::Error> {
        let params = self.params;
        trace!(?params, "requesting batch");
        self.batches += 1;
        (self.query)(params).map_err(|source| Error::Query {
            offset: params.offset,
            source,
        })
    }

    fn close_batch(&mut self) -> Result<(), B::Error> {
        let Some(mut batch) = self.batch.take() else {
            return Ok(());
        };
        let offset = self.params.offset;
        trace!(offset, "closing batch");
        batch
            .close()
            .map_err(|source| Error::Close { offset, source })
    }

    /// Records the sticky error.
    fn fail(&mut self, error: Error<B::Error>) -> bool {
        debug!(%error, "stopping iteration");
        if self.err.is_none() {
            self.err = Some(error);
        }
        false
    }
}

impl<Q, B> Iterator for Rows<Q, B>
where
    Q: FnMut(Params) -> std::result::Result<B, B::Error>,
    B: Batch,
{
    type Item = B::Row;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            self.take_row()
        } else {
            None
        }
    }
}

impl<Q, B> FusedIterator for Rows<Q, B>
where
    Q: FnMut(Params) -> std::result::Result<B, B::Error>,
    B: Batch,
{
}

impl<Q, B> fmt::Debug for Rows<Q, B>
where
    B: Batch,
    B::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows")
            .field("params", &self.params)
            .field("count", &self.count)
            .field("batches", &self.batches)
            .field("done", &self.done)
            .field("err", &self.err)
            .finish_non_exhaustive()
    }
}
