use crate::transport::{HttpRequest, Transport};
use metrics::counter;
use pinotdb_core::{ColumnDescriptor, PinotError, Result, ResultSet, Row};
use pinotdb_protocol::frontend::CONTENT_TYPE;
use pinotdb_protocol::{decode_response, encode_query};
use pinotdb_sql::{apply_parameters, decode_result, Params};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// `rowcount` is never derived from a result; it always reports unknown.
pub const UNKNOWN_ROWCOUNT: i64 = -1;

/// A query handle bound to one connection.
///
/// Lifecycle is open, then executed after the first successful `execute`,
/// then closed. Closing is terminal and also happens when the owning
/// connection closes.
pub struct Cursor {
    url: String,
    headers: Arc<[(String, String)]>,
    transport: Arc<dyn Transport>,
    debug: bool,
    closed: Arc<AtomicBool>,
    array_size: usize,
    description: Option<Vec<ColumnDescriptor>>,
    results: Option<VecDeque<Row>>,
}

impl Cursor {
    pub(crate) fn new(
        url: String,
        extra_headers: &[(String, String)],
        transport: Arc<dyn Transport>,
        debug: bool,
        closed: Arc<AtomicBool>,
    ) -> Self {
        let mut headers = vec![("Content-Type".to_string(), CONTENT_TYPE.to_string())];
        headers.extend(extra_headers.iter().cloned());
        Self {
            url,
            headers: headers.into(),
            transport,
            debug,
            closed,
            array_size: 1,
            description: None,
            results: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Closing an already closed cursor is a no-op.
    pub fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Columns of the last result, `None` before execute or for zero rows.
    pub fn description(&self) -> Option<&[ColumnDescriptor]> {
        self.description.as_deref()
    }

    pub fn rowcount(&self) -> i64 {
        UNKNOWN_ROWCOUNT
    }

    /// Default batch size of [`Cursor::fetch_many`].
    pub fn array_size(&self) -> usize {
        self.array_size
    }

    pub fn set_array_size(&mut self, size: usize) {
        self.array_size = size.max(1);
    }

    /// Render `operation` with `params`, send it, and buffer the decoded
    /// rows. Replaces the results of any earlier execute.
    pub async fn execute(&mut self, operation: &str, params: &Params) -> Result<&mut Self> {
        self.check_closed()?;
        let query = apply_parameters(operation, params)?;
        counter!("pinot_query_total").increment(1);
        let result = match self.round_trip(&query).await {
            Ok(result) => result,
            Err(err) => {
                counter!("pinot_query_error_total").increment(1);
                return Err(err);
            }
        };
        counter!("pinot_rows_decoded_total").increment(result.rows.len() as u64);
        debug!(rows = result.rows.len(), "got the rows");
        self.description = result.description;
        self.results = Some(result.rows.into());
        Ok(self)
    }

    pub fn execute_many(&mut self, _operation: &str, _params: &[Params]) -> Result<()> {
        self.check_closed()?;
        Err(PinotError::NotSupported(
            "`execute_many` is not supported, use `execute` instead".into(),
        ))
    }

    /// Next row, or `None` once the buffer is drained.
    pub fn fetch_one(&mut self) -> Result<Option<Row>> {
        let results = self.buffer()?;
        Ok(results.pop_front())
    }

    /// Up to `size` rows (the array size when `None` or zero). Fewer rows
    /// only at the end of the buffer.
    pub fn fetch_many(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        let size = match size {
            Some(n) if n > 0 => n,
            _ => self.array_size,
        };
        let results = self.buffer()?;
        let take = size.min(results.len());
        Ok(results.drain(..take).collect())
    }

    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let results = self.buffer()?;
        Ok(results.drain(..).collect())
    }

    /// Iterate remaining rows through repeated [`Cursor::fetch_one`].
    pub fn rows(&mut self) -> Rows<'_> {
        Rows {
            cursor: self,
            done: false,
        }
    }

    /// Accepted for DB-API parity; sizes are ignored.
    pub fn set_input_sizes(&self, _sizes: &[usize]) -> Result<()> {
        self.check_closed()
    }

    /// Accepted for DB-API parity; sizes are ignored.
    pub fn set_output_sizes(&self, _sizes: &[usize]) -> Result<()> {
        self.check_closed()
    }

    async fn round_trip(&self, query: &str) -> Result<ResultSet> {
        let request = HttpRequest {
            url: self.url.clone(),
            headers: self.headers.to_vec(),
            body: encode_query(query)?,
        };
        if self.debug {
            info!(
                url = %self.url,
                payload = %request.body,
                headers = ?request.headers,
                "submitting the pinot query:\n{query}"
            );
        }
        let response = self.transport.post(request).await?;
        let broker = decode_response(&response.body, query, &self.url)?;
        if self.debug {
            info!(
                status = response.status,
                payload = %broker.to_pretty_string(),
                "got the broker payload"
            );
        }
        decode_result(&broker, response.status, query)
    }

    // "has results" is checked ahead of "closed", so a cursor closed before
    // it ever executed reports the missing execute.
    fn buffer(&mut self) -> Result<&mut VecDeque<Row>> {
        let closed = self.is_closed();
        let results = self
            .results
            .as_mut()
            .ok_or_else(|| PinotError::Usage("Called before `execute`".into()))?;
        if closed {
            return Err(PinotError::Usage("Cursor already closed".into()));
        }
        Ok(results)
    }

    fn check_closed(&self) -> Result<()> {
        if self.is_closed() {
            return Err(PinotError::Usage("Cursor already closed".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("url", &self.url)
            .field("closed", &self.is_closed())
            .field("array_size", &self.array_size)
            .field("description", &self.description)
            .field("buffered", &self.results.as_ref().map(VecDeque::len))
            .finish()
    }
}

/// Row iterator over a cursor. Stops after the last row or the first error.
pub struct Rows<'a> {
    cursor: &'a mut Cursor,
    done: bool,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.fetch_one() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
