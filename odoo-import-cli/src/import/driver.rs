//! Run driver
//!
//! `NotStarted -> Connecting -> Running -> Completed | Aborted`. Only
//! failures before the first row (file, authentication, schema) and a file
//! that breaks mid-stream abort a run; every per-row failure is logged with
//! the row's ordinal and the run moves on.

use chrono::{DateTime, Local};
use log::{debug, error, info, warn};

use crate::api::{RecordClient, RecordId};
use crate::import::mapper::{FieldMapper, MapOutcome};
use crate::import::reader::{ReadError, Row};
use crate::import::types::RelationField;
use crate::import::upsert::{RowError, UpsertAction, UpsertEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Connecting,
    Running,
    Completed,
    Aborted,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RunState::NotStarted => "not started",
            RunState::Connecting => "connecting",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Row counts of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Data rows read from the file
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Related records that could not be found and were left out
    pub warnings: usize,
    /// Records whose deferred relations were written in the second pass
    pub linked: usize,
    pub link_failures: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed {}, created {}, updated {}, skipped {}, failed {}, warnings {}",
            self.processed, self.created, self.updated, self.skipped, self.failed, self.warnings
        )?;
        if self.linked > 0 || self.link_failures > 0 {
            write!(f, ", linked {}, link failures {}", self.linked, self.link_failures)?;
        }
        Ok(())
    }
}

/// A record waiting for its deferred relations
struct PendingLinks {
    ordinal: usize,
    display_name: String,
    model: String,
    id: RecordId,
    relations: Vec<RelationField>,
}

/// One import run and its state
pub struct ImportRun {
    state: RunState,
    summary: RunSummary,
    started_at: DateTime<Local>,
    finished_at: Option<DateTime<Local>>,
}

impl Default for ImportRun {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportRun {
    pub fn new() -> Self {
        Self {
            state: RunState::NotStarted,
            summary: RunSummary::default(),
            started_at: Local::now(),
            finished_at: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Wall time from creation until completion (or now)
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Local::now) - self.started_at
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run {} -> {}", self.state, next);
        self.state = next;
        if matches!(next, RunState::Completed | RunState::Aborted) {
            self.finished_at = Some(Local::now());
        }
    }

    pub fn begin_connecting(&mut self) {
        self.transition(RunState::Connecting);
    }

    /// Stop the run before or during row processing
    pub fn abort(&mut self, reason: &dyn std::fmt::Display) {
        error!("Import aborted: {}", reason);
        self.transition(RunState::Aborted);
    }

    /// Process every row, then write deferred relations
    ///
    /// Returns an error only when the file cannot be read further; rows
    /// already upserted stay committed.
    pub async fn run<C, I>(
        &mut self,
        engine: &mut UpsertEngine<'_, C>,
        mapper: &FieldMapper,
        rows: I,
    ) -> Result<&RunSummary, ReadError>
    where
        C: RecordClient + ?Sized,
        I: IntoIterator<Item = Result<Row, ReadError>>,
    {
        self.transition(RunState::Running);
        info!(
            "Importing into {} with profile '{}'",
            mapper.profile().model,
            mapper.profile().name
        );

        let mut pending = Vec::new();
        for item in rows {
            let row = match item {
                Ok(row) => row,
                Err(e) => {
                    self.abort(&e);
                    return Err(e);
                }
            };
            self.summary.processed += 1;
            if let Some(links) = self.process_row(engine, mapper, &row).await {
                pending.push(links);
            }
        }

        if !pending.is_empty() {
            info!("Linking deferred relations for {} record(s)", pending.len());
            for links in pending {
                self.link(engine, links).await;
            }
        }

        self.transition(RunState::Completed);
        info!("Import complete: {}", self.summary);
        Ok(&self.summary)
    }

    async fn process_row<C: RecordClient + ?Sized>(
        &mut self,
        engine: &mut UpsertEngine<'_, C>,
        mapper: &FieldMapper,
        row: &Row,
    ) -> Option<PendingLinks> {
        let record = match mapper.map(row) {
            MapOutcome::Mapped(record) => record,
            MapOutcome::Skip(reason) => {
                warn!("Row {}: skipped, {}", row.ordinal, reason);
                self.summary.skipped += 1;
                return None;
            }
        };

        let display_name = record.display_name.clone();
        let model = record.model.clone();

        match engine.upsert(record).await {
            Ok(outcome) => {
                for warning in &outcome.warnings {
                    warn!("Row {} ({}): {}", row.ordinal, display_name, warning);
                }
                self.summary.warnings += outcome.warnings.len();
                match outcome.action {
                    UpsertAction::Created => self.summary.created += 1,
                    UpsertAction::Updated => self.summary.updated += 1,
                }
                info!(
                    "Row {}: {} {} '{}' (ID: {})",
                    row.ordinal, outcome.action, model, display_name, outcome.id
                );

                (!outcome.deferred.is_empty()).then(|| PendingLinks {
                    ordinal: row.ordinal,
                    display_name,
                    model,
                    id: outcome.id,
                    relations: outcome.deferred,
                })
            }
            Err(e @ RowError::UnresolvedRelation { .. }) => {
                warn!("Row {} ({}): skipped, {}", row.ordinal, display_name, e);
                self.summary.skipped += 1;
                None
            }
            Err(e) => {
                error!("Row {} ({}) failed: {}", row.ordinal, display_name, e);
                self.summary.failed += 1;
                None
            }
        }
    }

    async fn link<C: RecordClient + ?Sized>(&mut self, engine: &mut UpsertEngine<'_, C>, links: PendingLinks) {
        match engine.link_deferred(&links.model, links.id, &links.relations).await {
            Ok(warnings) => {
                for warning in &warnings {
                    warn!("Row {} ({}): {}", links.ordinal, links.display_name, warning);
                }
                self.summary.warnings += warnings.len();
                self.summary.linked += 1;
            }
            Err(e) => {
                error!(
                    "Row {} ({}): linking failed: {}",
                    links.ordinal, links.display_name, e
                );
                self.summary.link_failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryClient;
    use crate::api::DryRunClient;
    use crate::import::cache::LookupCache;
    use crate::import::profiles;
    use crate::import::types::LookupTable;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::PathBuf;

    fn product_rows() -> Vec<Result<Row, ReadError>> {
        vec![
            Ok(Row::from_pairs(
                1,
                &[
                    ("Name", "Widget"),
                    ("Product Type", "Storable Product"),
                    ("Cost", "12.5"),
                    ("Routes", "Arc34: Receive in 2 steps, Arc34: Receive in 2 steps"),
                    ("Vendor / Name", "Acme Industrial"),
                ],
            )),
            Ok(Row::from_pairs(
                2,
                &[("Name", ""), ("Product Type", "Consumable"), ("Cost", "3")],
            )),
            Ok(Row::from_pairs(
                3,
                &[
                    ("Name", "Gadget"),
                    ("Product Type", "Consumable"),
                    ("Internal Reference", "G-1"),
                    ("Cost", "not a number"),
                ],
            )),
        ]
    }

    fn seeded_client() -> MemoryClient {
        let client = MemoryClient::new().with_comodel("product.template", "seller_ids", "product.supplierinfo");
        client.insert("stock.route", json!({"name": "Receive in 2 steps"}));
        client
    }

    async fn run_products<C: RecordClient>(client: &C, rows: Vec<Result<Row, ReadError>>) -> (RunState, RunSummary) {
        let lookups = LookupTable::builtin();
        let mapper = FieldMapper::new(profiles::products()).unwrap();
        let mut engine = UpsertEngine::new(client, &lookups, LookupCache::new());
        let mut run = ImportRun::new();
        run.begin_connecting();
        let _ = run.run(&mut engine, &mapper, rows).await;
        (run.state(), run.summary().clone())
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let client = seeded_client();

        let (state, first) = run_products(&client, product_rows()).await;
        assert_eq!(state, RunState::Completed);
        assert_eq!(
            first,
            RunSummary {
                processed: 3,
                created: 2,
                skipped: 1,
                ..Default::default()
            }
        );
        let count_after_first = client.count("product.template");

        let (_, second) = run_products(&client, product_rows()).await;
        assert_eq!(second.updated, 2);
        assert_eq!(second.created, 0);
        assert_eq!(client.count("product.template"), count_after_first);
        assert_eq!(client.count("res.partner"), 1);

        // vendor lines are appended again on every run
        assert_eq!(client.count("product.supplierinfo"), 2);

        let gadget = client
            .records("product.template")
            .into_iter()
            .find(|r| r["name"] == json!("Gadget"))
            .unwrap();
        assert_eq!(gadget["standard_price"], json!(0.0));
    }

    #[tokio::test]
    async fn test_rows_missing_required_fields_cause_no_mutation() {
        let client = seeded_client();
        let rows = vec![
            Ok(Row::from_pairs(1, &[("Name", ""), ("Product Type", "Service")])),
            Ok(Row::from_pairs(2, &[("Name", "Widget"), ("Product Type", "")])),
        ];

        let (state, summary) = run_products(&client, rows).await;
        assert_eq!(state, RunState::Completed);
        assert_eq!(summary.skipped, 2);
        assert_eq!(client.create_calls(), 0);
        assert_eq!(client.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_never_mutates() {
        let client = DryRunClient::new(seeded_client());
        let rows: Vec<_> = (1..=25)
            .map(|i| {
                let name = format!("Part {}", i);
                Ok(Row::from_pairs(
                    i,
                    &[
                        ("Name", name.as_str()),
                        ("Product Type", "Storable Product"),
                        ("Vendor / Name", "Acme Industrial"),
                        ("Routes", "Receive in 2 steps"),
                    ],
                ))
            })
            .collect();

        let (_, summary) = run_products(&client, rows).await;
        assert_eq!(summary.created, 25);
        assert!(!client.suppressed().is_empty());

        let inner = client.into_inner();
        assert_eq!(inner.create_calls(), 0);
        assert_eq!(inner.write_calls(), 0);
        assert_eq!(inner.count("product.template"), 0);
    }

    #[tokio::test]
    async fn test_row_failure_does_not_stop_the_run() {
        let client = seeded_client().failing("product.template", "write");
        client.insert("product.template", json!({"name": "Widget"}));

        let (state, summary) = run_products(&client, product_rows()).await;
        assert_eq!(state, RunState::Completed);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn test_read_error_aborts() {
        let client = seeded_client();
        let mut rows = product_rows();
        rows.insert(
            1,
            Err(ReadError::Record {
                path: PathBuf::from("products.csv"),
                line: 3,
                message: "invalid UTF-8".into(),
            }),
        );

        let (state, summary) = run_products(&client, rows).await;
        assert_eq!(state, RunState::Aborted);
        assert_eq!(summary.processed, 1);
        assert_eq!(client.count("product.template"), 1);
    }

    #[tokio::test]
    async fn test_lots_link_in_second_pass() {
        let client = MemoryClient::new();
        let widget = client.insert("product.product", json!({"name": "Widget"}));
        let lookups = LookupTable::builtin();
        let mapper = FieldMapper::new(profiles::lots()).unwrap();
        let mut engine = UpsertEngine::new(&client, &lookups, LookupCache::new());

        let rows = vec![
            Ok(Row::from_pairs(
                1,
                &[
                    ("id", "__import__.lot_sn1"),
                    ("name", "SN-1"),
                    ("product_id", "Widget"),
                    ("x_assigned_part_ids/name", "SN-2"),
                ],
            )),
            Ok(Row::from_pairs(
                2,
                &[("id", "__import__.lot_sn2"), ("name", "SN-2"), ("product_id", "Widget")],
            )),
            Ok(Row::from_pairs(3, &[("name", "SN-3"), ("product_id", "Unknown")])),
        ];

        let mut run = ImportRun::new();
        let summary = run.run(&mut engine, &mapper, rows).await.unwrap().clone();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.linked, 1);

        let lots = client.records("stock.lot");
        let sn1 = lots.iter().find(|l| l["name"] == json!("SN-1")).unwrap();
        let sn2 = lots.iter().find(|l| l["name"] == json!("SN-2")).unwrap();
        assert_eq!(sn1["product_id"], json!(widget));
        assert_eq!(sn1["x_assigned_part_ids"], json!([sn2["id"].clone()]));
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            processed: 4,
            created: 1,
            updated: 2,
            skipped: 1,
            ..Default::default()
        };
        assert_eq!(
            summary.to_string(),
            "processed 4, created 1, updated 2, skipped 1, failed 0, warnings 0"
        );
    }
}
