//! Test doubles for the collection and action seams.

use crate::action::Terminator;
use crate::collect::PortSource;
use pvw_common::{ActionError, CollectionError};
use std::sync::Mutex;

/// [`PortSource`] returning canned text.
#[derive(Debug, Default)]
pub struct StaticSource {
    raw: String,
    error: Option<CollectionError>,
}

impl StaticSource {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Default::default()
        }
    }

    pub fn failing(error: CollectionError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }
}

impl PortSource for StaticSource {
    fn collect(&self) -> Result<String, CollectionError> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.raw.clone()),
        }
    }

    fn resolve_working_directory(&self, _pid: u32) -> Result<String, CollectionError> {
        Ok(String::new())
    }
}

/// [`Terminator`] that records requests instead of signalling.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    pub requested: Mutex<Vec<u32>>,
    pub fail_with: Option<ActionError>,
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, pid: u32) -> Result<(), ActionError> {
        self.requested.lock().unwrap().push(pid);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
