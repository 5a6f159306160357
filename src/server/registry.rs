//! Table registry.
//!
//! Maps table ids to running actors and routes client messages to them.
//! Tables share nothing; the registry only hands out their handles.

use log::info;
use rustc_hash::FxHashMap;

use super::actor::{TableActor, TableHandle};
use super::config::ServiceConfig;
use crate::core::{MahjongRule, TableId};
use crate::error::{MahjongError, MahjongResult};
use crate::protocol::ClientMessage;
use crate::scheduler::{SeatPolicy, SimpleBot};
use crate::table::Table;

/// Running tables by id.
///
/// Creating a table spawns its actor, so it must be called from inside a
/// tokio runtime.
///
/// ```
/// use mahjong_table::core::MahjongRule;
/// use mahjong_table::server::{ServiceConfig, TableRegistry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut registry = TableRegistry::new(ServiceConfig::default());
/// let handle = registry.create(MahjongRule::default(), 42);
/// assert!(registry.get(handle.table_id()).is_ok());
/// # }
/// ```
pub struct TableRegistry {
    config: ServiceConfig,
    tables: FxHashMap<TableId, TableHandle>,
    next_id: u64,
}

impl TableRegistry {
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            tables: FxHashMap::default(),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Open a table with the default bot policy.
    pub fn create(&mut self, rule: MahjongRule, seed: u64) -> TableHandle {
        let id = TableId(self.next_id);
        self.next_id += 1;
        self.spawn(Table::new(id, rule, seed), seed, Box::new(SimpleBot))
    }

    /// Run an already built table. Replaces any table with the same id.
    pub fn spawn(&mut self, table: Table, seed: u64, policy: Box<dyn SeatPolicy>) -> TableHandle {
        let id = table.id();
        self.next_id = self.next_id.max(id.0 + 1);
        let (actor, handle) = TableActor::new(table, seed, &self.config, policy);
        tokio::spawn(actor.run());
        info!("{} registered", id);
        self.tables.insert(id, handle.clone());
        handle
    }

    pub fn get(&self, id: TableId) -> MahjongResult<TableHandle> {
        self.tables
            .get(&id)
            .filter(|handle| !handle.is_closed())
            .cloned()
            .ok_or(MahjongError::TableNotFound(id))
    }

    pub async fn route(&self, message: ClientMessage) -> MahjongResult<()> {
        self.get(message.table_id())?.dispatch(message).await
    }

    /// Close a table and forget it.
    pub async fn close(&mut self, id: TableId, reason: impl Into<String>) -> MahjongResult<()> {
        let handle = self
            .tables
            .remove(&id)
            .ok_or(MahjongError::TableNotFound(id))?;
        handle.close(reason).await
    }

    /// Forget tables whose actors have stopped on their own.
    pub fn prune(&mut self) -> usize {
        let before = self.tables.len();
        self.tables.retain(|_, handle| !handle.is_closed());
        before - self.tables.len()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
