//! Refresh orchestrator: the single driver of fetch → aggregate → publish.
//!
//! One task owns the orchestrator and consumes triggers one at a time, so a
//! cycle always runs to completion before the next trigger is looked at.
//! Triggers that arrive meanwhile wait in the channel.

use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::analyzer::dashboard::sorted_units;
use crate::analyzer::{
    build_selection_view, build_snapshot, DashboardOptions, DashboardSnapshot, Selection,
    SelectionView,
};
use crate::config::MetricSchema;
use crate::error::{AppError, IngestionError};
use crate::ingest::RowSource;
use crate::render::Publisher;
use crate::state::DashboardState;

#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Manual refresh: re-fetch and republish everything.
    Refresh,
    /// Filter change: recompute from cached rows, publish the selection only.
    Select(Selection),
    Shutdown,
}

/// Cloneable sender side used by the filter surface and the refresh button.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    tx: mpsc::Sender<Trigger>,
}

pub fn trigger_channel(capacity: usize) -> (TriggerHandle, mpsc::Receiver<Trigger>) {
    let (tx, rx) = mpsc::channel(capacity);
    (TriggerHandle { tx }, rx)
}

impl TriggerHandle {
    pub async fn send(&self, trigger: Trigger) -> Result<(), AppError> {
        self.tx
            .send(trigger)
            .await
            .map_err(|_| AppError::Custom("dashboard loop has stopped".into()))
    }

    pub async fn refresh(&self) -> Result<(), AppError> {
        self.send(Trigger::Refresh).await
    }

    pub async fn select(&self, selection: Selection) -> Result<(), AppError> {
        self.send(Trigger::Select(selection)).await
    }

    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.send(Trigger::Shutdown).await
    }
}

pub struct RefreshOrchestrator<S, P> {
    source: S,
    publisher: P,
    schema: MetricSchema,
    options: DashboardOptions,
    state: DashboardState,
}

impl<S: RowSource, P: Publisher> RefreshOrchestrator<S, P> {
    pub fn new(source: S, publisher: P, schema: MetricSchema, options: DashboardOptions) -> Self {
        RefreshOrchestrator {
            source,
            publisher,
            schema,
            options,
            state: DashboardState::default(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Manual or periodic trigger.
    ///
    /// On an ingestion failure the error is logged and returned, and the
    /// cached rows and last published snapshot stay as they were.
    pub async fn refresh(&mut self) -> Result<&DashboardSnapshot, IngestionError> {
        let start = Instant::now();

        let rows = match self.source.fetch_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                self.state.consecutive_failures += 1;
                tracing::error!(
                    error = %e,
                    failures = self.state.consecutive_failures,
                    "Dashboard refresh failed, keeping previous data"
                );
                return Err(e);
            }
        };

        let snapshot = build_snapshot(&rows, &self.schema, &self.options, &self.state.selection);
        if snapshot.selection.selection != self.state.selection {
            tracing::info!(
                previous = ?self.state.selection,
                "Selected unit no longer present, showing all units"
            );
        }
        self.state.selection = snapshot.selection.selection.clone();
        self.state.rows = rows;
        self.state.last_refresh = Some(Utc::now());
        self.state.consecutive_failures = 0;

        if let Err(e) = self.publisher.publish(&snapshot) {
            tracing::error!(error = %e, "Publishing the dashboard failed");
        }

        tracing::info!(
            rows = snapshot.meta.total_rows,
            units = snapshot.meta.unit_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Dashboard refreshed"
        );
        Ok(self.state.last_snapshot.insert(snapshot))
    }

    /// Filter change: no fetch, only the cached rows are regrouped.
    pub fn select(&mut self, selection: Selection) -> SelectionView {
        let units = sorted_units(&self.state.rows, &self.schema, &self.options);
        let view = build_selection_view(&units, &self.schema, &selection);
        if view.selection != selection {
            tracing::debug!(requested = ?selection, "Unknown unit selected, showing all units");
        }
        self.state.selection = view.selection.clone();
        if let Some(snapshot) = self.state.last_snapshot.as_mut() {
            snapshot.selection = view.clone();
        }

        if let Err(e) = self.publisher.publish_selection(&view) {
            tracing::error!(error = %e, "Publishing the selection failed");
        }
        tracing::debug!(selection = %view.label, "Selection published");
        view
    }

    /// Drive the dashboard until `Shutdown` arrives or every handle is dropped.
    ///
    /// Loads once before looking at any trigger. Queued triggers are served
    /// before a due tick, and the period restarts after every refresh, so a
    /// fetch slower than the period cannot lock triggers out.
    pub async fn run(mut self, mut triggers: mpsc::Receiver<Trigger>, period: Duration) -> Self {
        let _ = self.refresh().await;

        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                trigger = triggers.recv() => match trigger {
                    Some(Trigger::Refresh) => {
                        let _ = self.refresh().await;
                        ticker.reset();
                    }
                    Some(Trigger::Select(selection)) => {
                        self.select(selection);
                    }
                    Some(Trigger::Shutdown) | None => {
                        tracing::info!("Dashboard loop stopping");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    let _ = self.refresh().await;
                    ticker.reset();
                }
            }
        }
        self
    }
}
