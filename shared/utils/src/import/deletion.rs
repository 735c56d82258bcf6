//! Which tables are cleared before a load, and in what order.

use std::collections::BTreeMap;

use academic_database::StoreSession;
use academic_models::{EntityKind, ReplaceMode, Role};

use crate::error::ImportResult;
use crate::import::source::SourceFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    mode: ReplaceMode,
    kinds: Vec<EntityKind>,
}

impl DeletionPlan {
    /// Every entity table, children before parents.
    pub fn full() -> Self {
        Self {
            mode: ReplaceMode::Full,
            kinds: EntityKind::DELETION_ORDER.to_vec(),
        }
    }

    /// Only the tables fed by `roles`, children before parents.
    pub fn selective(roles: &[Role]) -> Self {
        let mut kinds: Vec<EntityKind> = roles
            .iter()
            .flat_map(|role| role.entity_kinds().iter().copied())
            .collect();
        kinds.sort_by_key(EntityKind::deletion_rank);
        kinds.dedup();

        Self {
            mode: ReplaceMode::Selective,
            kinds,
        }
    }

    /// Workbooks are full snapshots and CSV files are incremental updates,
    /// unless the caller asks for a specific mode.
    pub fn select(format: SourceFormat, roles: &[Role], requested: Option<ReplaceMode>) -> Self {
        let mode = requested.unwrap_or(match format {
            SourceFormat::Workbook => ReplaceMode::Full,
            SourceFormat::Csv => ReplaceMode::Selective,
        });

        match mode {
            ReplaceMode::Full => Self::full(),
            ReplaceMode::Selective => Self::selective(roles),
        }
    }

    pub fn mode(&self) -> ReplaceMode {
        self.mode
    }

    pub fn kinds(&self) -> &[EntityKind] {
        &self.kinds
    }

    /// Delete every planned table inside `session`; returns rows removed per kind.
    pub async fn apply<S: StoreSession>(&self, session: &mut S) -> ImportResult<BTreeMap<EntityKind, u64>> {
        tracing::info!(mode = ?self.mode, tables = ?self.kinds, "Clearing existing data");

        let mut deleted = BTreeMap::new();
        for kind in &self.kinds {
            let rows = session.delete_all(*kind).await?;
            tracing::info!(table = %kind, rows, "Deleted rows");
            deleted.insert(*kind, rows);
        }
        Ok(deleted)
    }
}
