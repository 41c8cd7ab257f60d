use std::collections::{BTreeMap, VecDeque};

use brook_api::{Value, ValueType};
use serde_json::Value as Json;

use crate::error::StreamError;
use crate::merge::merge_chunk;
use crate::message::{PartialResultSet, ResultMetadata, ResultStats, ResultStream, RowCount};

/// One assembled result row: values in column order, matching the stream
/// metadata position for position.
#[derive(Debug, Clone, PartialEq)]
pub struct Row(pub Vec<Value>);

impl Row {
    /// Typed extraction of the column at `index`.
    pub fn get<T: ValueType>(&self, index: usize) -> Result<T, StreamError> {
        let value = self.0.get(index).ok_or_else(|| {
            StreamError::ArityMismatch(format!(
                "column index {index} out of range for {} columns",
                self.0.len()
            ))
        })?;
        Ok(value.get::<T>()?)
    }
}

/// Pull-based decoder bridging a raw partial-result stream and row
/// iteration.
///
/// Strictly single-threaded: `next_row` touches the transport only when no
/// full row can be assembled from already-buffered values, and the
/// transport's `next_chunk` is the only suspension point. The row sequence
/// is finite, forward-only and not restartable: recreate the source and
/// re-issue the query to restart.
///
/// Any malformed message poisons the source permanently: every later pull
/// returns the same error.
pub struct PartialResultSource {
    stream: Box<dyn ResultStream>,
    /// Taken from the first message only; later repeats are ignored.
    metadata: Option<ResultMetadata>,
    /// Present only once the terminal message has been seen.
    stats: Option<ResultStats>,
    /// Completed flat values awaiting regrouping into rows.
    queue: VecDeque<Json>,
    /// Incomplete value carried across a message boundary.
    pending: Option<Json>,
    /// Completed values ever queued; locates the pending value's column.
    values_seen: u64,
    finished: bool,
    error: Option<StreamError>,
}

impl std::fmt::Debug for PartialResultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialResultSource")
            .field("metadata", &self.metadata)
            .field("stats", &self.stats)
            .field("queue", &self.queue)
            .field("pending", &self.pending)
            .field("values_seen", &self.values_seen)
            .field("finished", &self.finished)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl PartialResultSource {
    /// Create the source, eagerly reading the first message.
    ///
    /// Fails with `MissingMetadata` when the stream is empty or its first
    /// message carries no metadata.
    pub fn new(stream: Box<dyn ResultStream>) -> Result<Self, StreamError> {
        let mut source = PartialResultSource {
            stream,
            metadata: None,
            stats: None,
            queue: VecDeque::new(),
            pending: None,
            values_seen: 0,
            finished: false,
            error: None,
        };
        match source.stream.next_chunk()? {
            Some(message) => source.process(message)?,
            None => return Err(StreamError::MissingMetadata),
        }
        Ok(source)
    }

    /// Produce the next fully assembled row. `Ok(None)` signals clean
    /// exhaustion.
    pub fn next_row(&mut self) -> Result<Option<Row>, StreamError> {
        loop {
            if let Some(e) = &self.error {
                return Err(e.clone());
            }
            let arity = self.metadata.as_ref().map_or(0, |m| m.columns.len());
            if arity > 0 && self.queue.len() >= arity {
                return Ok(Some(self.assemble_row(arity)));
            }
            if self.finished {
                if self.pending.is_some() {
                    return Err(self.poison(StreamError::InvalidChunk(
                        "stream ended with an unresolved chunked value".into(),
                    )));
                }
                if !self.queue.is_empty() {
                    return Err(self.poison(StreamError::ArityMismatch(format!(
                        "stream ended mid-row: {} leftover values for {arity} columns",
                        self.queue.len()
                    ))));
                }
                return Ok(None);
            }
            match self.stream.next_chunk() {
                Ok(Some(message)) => {
                    if let Err(e) = self.process(message) {
                        return Err(self.poison(e));
                    }
                }
                Ok(None) => self.finished = true,
                Err(e) => return Err(self.poison(e)),
            }
        }
    }

    /// Column metadata from the first message; sticky for the stream's life.
    pub fn metadata(&self) -> Option<&ResultMetadata> {
        self.metadata.as_ref()
    }

    /// Cumulative row-modification count from the terminal statistics:
    /// exact when reported, else the lower bound, else 0.
    pub fn rows_modified(&self) -> i64 {
        match self.stats.as_ref().and_then(|s| s.row_count) {
            Some(RowCount::Exact(n) | RowCount::LowerBound(n)) => n,
            None => 0,
        }
    }

    /// Query execution plan, present only after the terminal message.
    /// Opaque pass-through of the server payload.
    pub fn query_plan(&self) -> Option<&Json> {
        self.stats.as_ref().and_then(|s| s.query_plan.as_ref())
    }

    /// Query statistics, present only after the terminal message.
    ///
    /// The server-side shape is deliberately not modeled; top-level entries
    /// of the opaque payload are passed through stringified.
    pub fn query_stats(&self) -> Option<BTreeMap<String, String>> {
        let stats = self.stats.as_ref()?.query_stats.as_ref()?;
        let object = stats.as_object()?;
        Some(
            object
                .iter()
                .map(|(k, v)| {
                    let text = match v {
                        Json::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), text)
                })
                .collect(),
        )
    }

    fn poison(&mut self, e: StreamError) -> StreamError {
        self.error = Some(e.clone());
        e
    }

    fn assemble_row(&mut self, arity: usize) -> Row {
        let mut values = Vec::with_capacity(arity);
        for i in 0..arity {
            let tree = self.queue.pop_front().unwrap_or(Json::Null);
            let ty = match self.metadata.as_ref() {
                Some(m) => m.columns[i].ty.clone(),
                None => unreachable!("rows are only assembled after metadata arrived"),
            };
            values.push(Value::from_wire(ty, tree));
        }
        Row(values)
    }

    fn process(&mut self, message: PartialResultSet) -> Result<(), StreamError> {
        if let Some(metadata) = message.metadata {
            if self.metadata.is_none() {
                tracing::debug!(columns = metadata.columns.len(), "stream metadata received");
                self.metadata = Some(metadata);
            } else {
                // Metadata comes from the first message only; a repeat must
                // not change the row arity mid-stream.
                tracing::warn!("ignoring repeated metadata message");
            }
        }
        let Some(metadata) = self.metadata.as_ref() else {
            return Err(StreamError::MissingMetadata);
        };
        let arity = metadata.columns.len();

        let mut values = message.values;
        tracing::trace!(
            values = values.len(),
            chunked = message.chunked_value,
            terminal = message.stats.is_some(),
            "processing partial result"
        );

        if arity == 0 && !values.is_empty() {
            return Err(StreamError::ArityMismatch(format!(
                "{} values in a zero-column stream",
                values.len()
            )));
        }

        if let Some(pending) = self.pending.take() {
            if values.is_empty() {
                // Nothing to merge with; the pending value rides along.
                self.pending = Some(pending);
            } else {
                let column = (self.values_seen % arity as u64) as usize;
                let ty = &metadata.columns[column].ty;
                let first = values.remove(0);
                let merged = merge_chunk(ty, pending, first)?;
                values.insert(0, merged);
            }
        }

        if message.chunked_value {
            match values.pop() {
                Some(last) => self.pending = Some(last),
                None => {
                    return Err(StreamError::InvalidChunk(
                        "chunked_value set on a message with no values".into(),
                    ));
                }
            }
        }

        self.values_seen += values.len() as u64;
        self.queue.extend(values);

        if let Some(stats) = message.stats {
            tracing::debug!(buffered = self.queue.len(), "terminal message received");
            self.stats = Some(stats);
            self.finished = true;
        }
        Ok(())
    }
}
