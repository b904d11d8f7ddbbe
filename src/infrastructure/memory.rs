use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::core::{Reservation, ReservationId, ReservationRecord, ReservationRepository};
use crate::domain::{DataAccessError, Entity};

/// メモリ上の予約リポジトリ
///
/// クローンは同じ保存領域を共有する。
#[derive(Clone, Default)]
pub struct InMemoryReservationRepository {
    records: Arc<RwLock<HashMap<ReservationId, ReservationRecord>>>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn find_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<ReservationRecord>, DataAccessError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn save(&mut self, entity: &Reservation) -> Result<(), DataAccessError> {
        let mut records = self.records.write().await;
        if records.contains_key(&entity.id()) {
            return Err(DataAccessError::AlreadyExists(entity.id().to_string()));
        }
        records.insert(entity.id(), entity.to_record());
        debug!("予約を保存しました: {}", entity.id());
        Ok(())
    }
}
