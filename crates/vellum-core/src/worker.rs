//! Dedicated index thread.
//!
//! [`IndexWorker::spawn`] moves an index onto its own thread. All access goes
//! through cloneable [`WorkerHandle`]s that send requests over a channel, so
//! mutations are serialized by construction and long bulk loads never run on
//! the caller's thread.
//!
//! ```text
//! ┌──────────────┐  requests   ┌──────────────┐
//! │ WorkerHandle │────────────▶│ index thread │
//! │  (clones)    │◀────────────│  HnswIndex   │
//! └──────────────┘   replies   └──────────────┘
//! ```

use crate::error::{Error, Result};
use crate::index::hnsw::{HnswIndex, IndexSnapshot, QueryOptions, SearchResult};
use crate::storage::VectorStore;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Reply channel of one request.
type Reply<T> = Sender<T>;

enum Request {
    Insert {
        key: String,
        vector: Vec<f32>,
        reply: Reply<Result<()>>,
    },
    BulkInsert {
        keys: Vec<String>,
        vectors: Vec<Vec<f32>>,
        skip_index: bool,
        reply: Reply<Result<usize>>,
    },
    Ingest {
        keys: Vec<String>,
        vectors: Vec<Vec<f32>>,
        skip_index: bool,
    },
    Query {
        vector: Vec<f32>,
        options: QueryOptions,
        reply: Reply<Result<Vec<SearchResult>>>,
    },
    Export {
        reply: Reply<IndexSnapshot>,
    },
    Load {
        snapshot: Box<IndexSnapshot>,
        reply: Reply<Result<()>>,
    },
    Len {
        reply: Reply<usize>,
    },
    Shutdown,
}

/// Owner of the index thread.
pub struct IndexWorker<S: VectorStore + 'static> {
    handle: WorkerHandle,
    thread: JoinHandle<HnswIndex<S>>,
}

impl<S: VectorStore + 'static> IndexWorker<S> {
    /// Moves `index` onto a new thread named `vellum-index`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the thread cannot be spawned.
    pub fn spawn(index: HnswIndex<S>) -> Result<Self> {
        let (tx, rx) = unbounded();
        let thread = thread::Builder::new()
            .name("vellum-index".to_string())
            .spawn(move || run(index, &rx))?;
        tracing::info!("Index worker started");

        Ok(Self {
            handle: WorkerHandle { tx },
            thread,
        })
    }

    /// A new handle to the worker.
    #[must_use]
    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Stops the thread after the requests queued before this call, and
    /// returns the index.
    ///
    /// # Errors
    ///
    /// Returns `Error::WorkerStopped` if the thread panicked.
    pub fn shutdown(self) -> Result<HnswIndex<S>> {
        // A send error means the thread is already gone; join reports why.
        let _ = self.handle.tx.send(Request::Shutdown);
        let index = self.thread.join().map_err(|_| Error::WorkerStopped)?;
        tracing::info!(nodes = index.len(), "Index worker stopped");
        Ok(index)
    }
}

fn run<S: VectorStore>(mut index: HnswIndex<S>, rx: &Receiver<Request>) -> HnswIndex<S> {
    // Reply send errors mean the caller stopped waiting; nothing to do.
    while let Ok(request) = rx.recv() {
        match request {
            Request::Insert { key, vector, reply } => {
                let _ = reply.send(index.insert(&key, &vector));
            }
            Request::BulkInsert {
                keys,
                vectors,
                skip_index,
                reply,
            } => {
                let _ = reply.send(bulk(&mut index, &keys, &vectors, skip_index));
            }
            Request::Ingest {
                keys,
                vectors,
                skip_index,
            } => match bulk(&mut index, &keys, &vectors, skip_index) {
                Ok(admitted) => tracing::debug!(admitted, nodes = index.len(), "Batch ingested"),
                Err(e) => tracing::warn!(
                    error = %e,
                    batch = keys.len(),
                    first_key = keys.first().map(String::as_str),
                    "Batch failed, continuing with next"
                ),
            },
            Request::Query {
                vector,
                options,
                reply,
            } => {
                let _ = reply.send(index.query_with(&vector, &options));
            }
            Request::Export { reply } => {
                let _ = reply.send(index.export_index());
            }
            Request::Load { snapshot, reply } => {
                let _ = reply.send(index.load_index(&snapshot));
            }
            Request::Len { reply } => {
                let _ = reply.send(index.len());
            }
            Request::Shutdown => break,
        }
    }
    index
}

fn bulk<S: VectorStore>(
    index: &mut HnswIndex<S>,
    keys: &[String],
    vectors: &[Vec<f32>],
    skip_index: bool,
) -> Result<usize> {
    if skip_index {
        index.bulk_insert_skip_index(keys, vectors)
    } else {
        index.bulk_insert(keys, vectors)
    }
}

/// Cloneable sender side of an [`IndexWorker`].
#[derive(Clone)]
pub struct WorkerHandle {
    tx: Sender<Request>,
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("queued", &self.tx.len())
            .finish()
    }
}

impl WorkerHandle {
    /// Sends a request and waits for its reply.
    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> Result<T> {
        let (reply, rx) = bounded(1);
        self.tx.send(make(reply)).map_err(|_| Error::WorkerStopped)?;
        rx.recv().map_err(|_| Error::WorkerStopped)
    }

    /// See [`HnswIndex::insert`].
    ///
    /// # Errors
    ///
    /// The index error, or `Error::WorkerStopped`.
    pub fn insert(&self, key: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let key = key.into();
        self.call(|reply| Request::Insert { key, vector, reply })?
    }

    /// See [`HnswIndex::bulk_insert`].
    ///
    /// # Errors
    ///
    /// The index error, or `Error::WorkerStopped`.
    pub fn bulk_insert(&self, keys: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<usize> {
        self.call(|reply| Request::BulkInsert {
            keys,
            vectors,
            skip_index: false,
            reply,
        })?
    }

    /// See [`HnswIndex::bulk_insert_skip_index`].
    ///
    /// # Errors
    ///
    /// The index error, or `Error::WorkerStopped`.
    pub fn bulk_insert_skip_index(&self, keys: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<usize> {
        self.call(|reply| Request::BulkInsert {
            keys,
            vectors,
            skip_index: true,
            reply,
        })?
    }

    /// Queues a batch without waiting. A failing batch is logged and the
    /// worker moves on to the next request.
    ///
    /// # Errors
    ///
    /// Returns `Error::WorkerStopped` if the worker is gone.
    pub fn ingest(&self, keys: Vec<String>, vectors: Vec<Vec<f32>>, skip_index: bool) -> Result<()> {
        self.tx
            .send(Request::Ingest {
                keys,
                vectors,
                skip_index,
            })
            .map_err(|_| Error::WorkerStopped)
    }

    /// See [`HnswIndex::query_with`]. Runs after every request queued before it.
    ///
    /// # Errors
    ///
    /// The index error, or `Error::WorkerStopped`.
    pub fn query(&self, vector: Vec<f32>, options: QueryOptions) -> Result<Vec<SearchResult>> {
        self.call(|reply| Request::Query {
            vector,
            options,
            reply,
        })?
    }

    /// See [`HnswIndex::export_index`].
    ///
    /// # Errors
    ///
    /// Returns `Error::WorkerStopped` if the worker is gone.
    pub fn export_index(&self) -> Result<IndexSnapshot> {
        self.call(|reply| Request::Export { reply })
    }

    /// See [`HnswIndex::load_index`].
    ///
    /// # Errors
    ///
    /// The index error, or `Error::WorkerStopped`.
    pub fn load_index(&self, snapshot: IndexSnapshot) -> Result<()> {
        self.call(|reply| Request::Load {
            snapshot: Box::new(snapshot),
            reply,
        })?
    }

    /// Number of indexed nodes.
    ///
    /// # Errors
    ///
    /// Returns `Error::WorkerStopped` if the worker is gone.
    pub fn len(&self) -> Result<usize> {
        self.call(|reply| Request::Len { reply })
    }
}
