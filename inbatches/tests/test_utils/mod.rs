use std::{cell::RefCell, collections::HashMap, rc::Rc};

use inbatches::{Batch, Params};

/// Sets up tracing subscriber.
#[allow(dead_code)]
pub fn setup_tracing(level: Option<&str>) {
    use tracing_subscriber::{
        fmt::{format::FmtSpan, layer},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter_layer = level
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::try_from_default_env().unwrap_or("warn".into()));
    let fmt_layer = layer()
        .with_test_writer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    // Several tests in the same binary may race to install it.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mock failure: {0}")]
pub struct MockError(pub &'static str);

/// A failure scripted to happen on the batch requested at some offset.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// The query itself fails.
    Query,
    /// The batch fails after yielding the given amount of rows.
    Read(usize),
    /// Closing the batch fails.
    Close,
}

/// What the mock observed.
#[derive(Debug, Default)]
pub struct Log {
    /// Parameters of every query call, in order.
    pub requests: Vec<Params>,
    /// Offsets of every closed batch, in order.
    pub closed: Vec<u64>,
    /// Batches currently open.
    pub open: usize,
    /// Largest amount of batches open at the same time.
    pub max_open: usize,
}

/// An in-memory, stably ordered table that answers `OFFSET .. LIMIT ..`
/// queries, recording every call.
pub struct MockDb {
    rows: Vec<u32>,
    failures: HashMap<u64, Failure>,
    log: Rc<RefCell<Log>>,
}

impl MockDb {
    /// Creates a table with the rows `1..=len`.
    pub fn with_len(len: u32) -> Self {
        MockDb {
            rows: (1..=len).collect(),
            failures: HashMap::new(),
            log: Rc::default(),
        }
    }

    /// Scripts a failure for the batch at the given offset.
    #[allow(dead_code)]
    pub fn fail_at(mut self, offset: u64, failure: Failure) -> Self {
        self.failures.insert(offset, failure);
        self
    }

    /// Returns all rows, as a single unpaginated query would.
    #[allow(dead_code)]
    pub fn all(&self) -> Vec<u32> {
        self.rows.clone()
    }

    pub fn log(&self) -> std::cell::Ref<'_, Log> {
        self.log.borrow()
    }

    /// Offsets of every query call, in order.
    pub fn offsets(&self) -> Vec<u64> {
        self.log().requests.iter().map(|p| p.offset).collect()
    }

    pub fn query(&self, params: Params) -> Result<MockBatch, MockError> {
        self.log.borrow_mut().requests.push(params);

        let failure = self.failures.get(&params.offset).copied();
        if let Some(Failure::Query) = failure {
            return Err(MockError("query"));
        }

        let rows = self
            .rows
            .iter()
            .copied()
            .skip(params.offset as usize)
            .take(params.limit as usize)
            .collect::<Vec<_>>()
            .into_iter();

        let mut log = self.log.borrow_mut();
        log.open += 1;
        log.max_open = log.max_open.max(log.open);

        Ok(MockBatch {
            rows,
            read: 0,
            offset: params.offset,
            failure,
            closed: false,
            log: Rc::clone(&self.log),
        })
    }
}

pub struct MockBatch {
    rows: std::vec::IntoIter<u32>,
    read: usize,
    offset: u64,
    failure: Option<Failure>,
    closed: bool,
    log: Rc<RefCell<Log>>,
}

impl Batch for MockBatch {
    type Row = u32;
    type Error = MockError;

    fn next_row(&mut self) -> Result<Option<u32>, MockError> {
        assert!(!self.closed, "read from closed batch");
        if let Some(Failure::Read(after)) = self.failure {
            if self.read == after {
                return Err(MockError("read"));
            }
        }
        let row = self.rows.next();
        if row.is_some() {
            self.read += 1;
        }
        Ok(row)
    }

    fn close(&mut self) -> Result<(), MockError> {
        assert!(!self.closed, "batch closed twice");
        self.closed = true;

        let mut log = self.log.borrow_mut();
        log.open -= 1;
        log.closed.push(self.offset);

        match self.failure {
            Some(Failure::Close) => Err(MockError("close")),
            _ => Ok(()),
        }
    }
}
