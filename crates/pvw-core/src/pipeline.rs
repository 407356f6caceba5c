//! Collect → parse → format, as one blocking call.
//!
//! The controller runs [`Pipeline::load`] on a task thread for every refresh.

use crate::collect::PortSource;
use crate::format::Snapshot;
use crate::parse::parse;
use pvw_common::{ColumnSchema, Error, FilterConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Everything a refresh needs, shared read-only with task threads.
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn PortSource>,
    filter: FilterConfig,
    schema: ColumnSchema,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("source", &"...")
            .field("filter", &self.filter)
            .field("schema", &self.schema)
            .finish()
    }
}

impl Pipeline {
    pub fn new(source: Arc<dyn PortSource>, filter: FilterConfig, schema: ColumnSchema) -> Self {
        Self {
            source,
            filter,
            schema,
        }
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Produce a fresh snapshot.
    ///
    /// # Errors
    /// * [`Error::Collection`] if enumeration fails
    /// * [`Error::Parse`] if the output is malformed or a working-directory
    ///   lookup fails
    #[instrument(skip(self), name = "pipeline_load")]
    pub fn load(&self) -> Result<Snapshot, Error> {
        let start = Instant::now();
        let raw = self.source.collect()?;
        let processes = parse(&raw, &self.filter, self.source.as_ref())?;
        let snapshot = Snapshot::build(processes, &self.schema);
        debug!(
            raw_bytes = raw.len(),
            processes = snapshot.processes.len(),
            rows = snapshot.rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "snapshot built"
        );
        Ok(snapshot)
    }
}
