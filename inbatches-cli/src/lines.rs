use std::{
    fs::File,
    io::{self, BufRead, BufReader, Lines},
    path::Path,
};

use inbatches::{Batch, Params};
use tracing::{instrument, trace};

/// A batch of lines of a text file. Each line is a row, and the line order is
/// the stable order across batches.
pub struct LineBatch {
    lines: Lines<BufReader<File>>,
    remaining: u64,
}

impl LineBatch {
    /// Opens the file and skips the first `params.offset` lines, much like a
    /// database answers an `OFFSET .. LIMIT ..` query by scanning past the
    /// skipped rows.
    #[instrument(level = "debug", skip(path), fields(path = %path.display()))]
    pub fn query(path: &Path, params: Params) -> io::Result<Self> {
        let mut lines = BufReader::new(File::open(path)?).lines();
        for skipped in 0..params.offset {
            if lines.next().transpose()?.is_none() {
                trace!(skipped, "file ended before offset");
                break;
            }
        }
        Ok(LineBatch {
            lines,
            remaining: params.limit,
        })
    }
}

impl Batch for LineBatch {
    type Row = String;
    type Error = io::Error;

    fn next_row(&mut self) -> io::Result<Option<String>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let line = self.lines.next().transpose()?;
        if line.is_some() {
            self.remaining -= 1;
        } else {
            self.remaining = 0;
        }
        Ok(line)
    }

    /// The file is closed when the batch is dropped.
    fn close(&mut self) -> io::Result<()> {
        self.remaining = 0;
        Ok(())
    }
}
