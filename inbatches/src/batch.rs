/// A single batch of rows produced by the query callback.
///
/// This is the row sequence resource handed to [`Rows`](crate::Rows): it is
/// consumed front to back and released exactly once, before the next batch is
/// requested.
pub trait Batch {
    type Row;
    type Error;

    /// Produces the next row of the batch, or `None` once it is exhausted.
    fn next_row(&mut self) -> Result<Option<Self::Row>, Self::Error>;

    /// Releases the resources held by the batch.
    fn close(&mut self) -> Result<(), Self::Error>;
}

impl<B: Batch + ?Sized> Batch for Box<B> {
    type Row = B::Row;
    type Error = B::Error;

    fn next_row(&mut self) -> Result<Option<Self::Row>, Self::Error> {
        (**self).next_row()
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close()
    }
}

/// A [`Batch`] over an iterator of fallible rows. Closing it just drops the
/// remaining rows.
pub struct IterBatch<I> {
    inner: Option<I>,
}

impl<I> IterBatch<I> {
    /// Creates a new batch from the given rows.
    pub fn new<T>(rows: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        IterBatch {
            inner: Some(rows.into_iter()),
        }
    }
}

impl<I, R, E> Batch for IterBatch<I>
where
    I: Iterator<Item = Result<R, E>>,
{
    type Row = R;
    type Error = E;

    fn next_row(&mut self) -> Result<Option<R>, E> {
        match &mut self.inner {
            Some(rows) => rows.next().transpose(),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<(), E> {
        self.inner = None;
        Ok(())
    }
}
