use std::io::Write;

use serde::Serialize;

use super::Publisher;
use crate::analyzer::{DashboardSnapshot, SelectionView};
use crate::error::AppError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase", tag = "event", content = "data")]
enum DashboardEvent<'a> {
    Snapshot(&'a DashboardSnapshot),
    Selection(&'a SelectionView),
}

/// One JSON document per line, for a front-end or another process to consume.
pub struct JsonPublisher<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonPublisher<W> {
    pub fn new(out: W) -> Self {
        JsonPublisher { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: &DashboardEvent<'_>) -> Result<(), AppError> {
        serde_json::to_writer(&mut self.out, event)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Publisher for JsonPublisher<W> {
    fn publish(&mut self, snapshot: &DashboardSnapshot) -> Result<(), AppError> {
        self.emit(&DashboardEvent::Snapshot(snapshot))
    }

    fn publish_selection(&mut self, view: &SelectionView) -> Result<(), AppError> {
        self.emit(&DashboardEvent::Selection(view))
    }
}
