use crate::config::ConnectOptions;
use crate::cursor::Cursor;
use crate::transport::{HttpTransport, Transport};
use pinotdb_core::{PinotError, Result};
use pinotdb_sql::Params;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Open a connection to the broker described by `options` over HTTP.
pub fn connect(options: ConnectOptions) -> Result<Connection> {
    let transport = HttpTransport::new()?;
    Connection::with_transport(options, Arc::new(transport))
}

/// A connection hands out cursors and closes them all when it closes.
pub struct Connection {
    options: ConnectOptions,
    extra_headers: Vec<(String, String)>,
    transport: Arc<dyn Transport>,
    closed: AtomicBool,
    cursors: Mutex<Vec<Arc<AtomicBool>>>,
}

impl Connection {
    pub fn with_transport(options: ConnectOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        options.validate()?;
        let extra_headers = options.extra_headers()?;
        debug!(url = %options.url(), "opened pinot connection");
        Ok(Self {
            options,
            extra_headers,
            transport,
            closed: AtomicBool::new(false),
            cursors: Mutex::new(Vec::new()),
        })
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn cursor(&self) -> Result<Cursor> {
        // Registered under the lock so a concurrent close cannot miss it.
        let mut cursors = self.cursors.lock().unwrap_or_else(PoisonError::into_inner);
        self.check_closed()?;
        let closed = Arc::new(AtomicBool::new(false));
        cursors.push(closed.clone());
        drop(cursors);
        Ok(Cursor::new(
            self.options.url(),
            &self.extra_headers,
            self.transport.clone(),
            self.options.debug,
            closed,
        ))
    }

    /// Run `operation` on a fresh cursor and return it ready to fetch.
    pub async fn execute(&self, operation: &str, params: &Params) -> Result<Cursor> {
        let mut cursor = self.cursor()?;
        cursor.execute(operation, params).await?;
        Ok(cursor)
    }

    /// The engine is read-only; there is never anything to commit.
    pub fn commit(&self) -> Result<()> {
        self.check_closed()
    }

    /// Close the connection and every cursor it handed out. Cursors the
    /// caller already closed are skipped.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(PinotError::Usage("Connection already closed".into()));
        }
        let cursors = self.cursors.lock().unwrap_or_else(PoisonError::into_inner);
        for closed in cursors.iter() {
            closed.store(true, Ordering::SeqCst);
        }
        debug!(cursors = cursors.len(), "closed pinot connection");
        Ok(())
    }

    fn check_closed(&self) -> Result<()> {
        if self.is_closed() {
            return Err(PinotError::Usage("Connection already closed".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.options.url())
            .field("closed", &self.is_closed())
            .finish()
    }
}
