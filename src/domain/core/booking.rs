use std::sync::Arc;

use derive_more::{Display, Error, From};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{error, info, warn};

use crate::domain::{DataAccessError, Entity};

use super::{
    Property, PropertyError, PropertyId, Reservation, ReservationError, ReservationId,
    ReservationRepository, SalesChannelError,
};

/// 予約受付エラー
#[derive(Error, Display, Debug, From)]
pub enum BookingError {
    #[display(fmt = "{}", _0)]
    Reservation(ReservationError),
    #[display(fmt = "{}", _0)]
    Property(PropertyError),
    #[display(fmt = "{}", _0)]
    SalesChannel(SalesChannelError),
    /// 永続化に失敗した。予約は受け付けられていない
    #[display(fmt = "Persistence failure: {}", _0)]
    PersistenceFailure(DataAccessError),
    /// 受付タスクが停止している
    #[display(fmt = "Booking desk is closed")]
    DeskClosed,
}

impl BookingError {
    /// 再試行しても良いエラーか
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::PersistenceFailure(_))
    }

    pub fn is_overlapping(&self) -> bool {
        matches!(
            self,
            BookingError::Property(PropertyError::OverlappingReservation { .. })
        )
    }
}

/// 2つの予約の宿泊期間が重なるか
pub fn overlaps(a: &Reservation, b: &Reservation) -> bool {
    a.overlaps(b)
}

/// 物件が候補の予約を受け付けられるか
pub fn can_accept(property: &Property, candidate: &Reservation) -> bool {
    property.can_accept(candidate)
}

/// 予約を物件に登録する
///
/// 期間の重複を確認してから保存し、保存が成功した場合のみ物件に追加する。
pub async fn book<R>(
    property: &mut Property,
    candidate: Reservation,
    repository: &mut R,
) -> Result<ReservationId, BookingError>
where
    R: ReservationRepository + ?Sized,
{
    let id = candidate.id();
    if let Some(existing) = property.conflicts(&candidate).next() {
        warn!(
            "予約を拒否しました: {} は予約 {} と重複しています",
            candidate,
            existing.id()
        );
        return Err(PropertyError::OverlappingReservation {
            existing: existing.id(),
        }
        .into());
    }
    if let Err(e) = repository.save(&candidate).await {
        error!("予約の保存に失敗しました: {}: {}", id, e);
        return Err(BookingError::PersistenceFailure(e));
    }
    property.accept(candidate)?;
    info!("予約を受け付けました: {} (物件 {})", id, property.id());
    Ok(id)
}

enum DeskCommand {
    Book {
        reservation: Reservation,
        reply: oneshot::Sender<Result<ReservationId, BookingError>>,
    },
    Snapshot {
        reply: oneshot::Sender<Property>,
    },
}

/// 物件ごとの予約受付タスク
///
/// 物件の予約一覧を1つのタスクが所有し、受付を順番に処理する。
/// 重複確認と追加の間に別の予約が割り込むことはない。
#[derive(Clone)]
pub struct BookingDesk {
    property_id: PropertyId,
    _handle: Arc<JoinHandle<()>>,
    sender: mpsc::Sender<DeskCommand>,
}

impl BookingDesk {
    const QUEUE_SIZE: usize = 100;

    pub fn spawn<R>(mut property: Property, mut repository: R) -> Self
    where
        R: ReservationRepository + Send + 'static,
    {
        let property_id = property.id();
        let (tx, mut rx) = mpsc::channel::<DeskCommand>(Self::QUEUE_SIZE);
        let handle = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    DeskCommand::Book { reservation, reply } => {
                        let result = book(&mut property, reservation, &mut repository).await;
                        if reply.send(result).is_err() {
                            warn!("予約結果の送信先がありません (物件 {})", property.id());
                        }
                    }
                    DeskCommand::Snapshot { reply } => {
                        let _ = reply.send(property.clone());
                    }
                }
            }
        });
        Self {
            property_id,
            _handle: Arc::new(handle),
            sender: tx,
        }
    }

    pub fn property_id(&self) -> PropertyId {
        self.property_id
    }

    pub async fn book(&self, reservation: Reservation) -> Result<ReservationId, BookingError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DeskCommand::Book {
                reservation,
                reply: tx,
            })
            .await
            .map_err(|_| BookingError::DeskClosed)?;
        rx.await.map_err(|_| BookingError::DeskClosed)?
    }

    /// 現在の物件の状態を取得する
    pub async fn property(&self) -> Result<Property, BookingError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DeskCommand::Snapshot { reply: tx })
            .await
            .map_err(|_| BookingError::DeskClosed)?;
        rx.await.map_err(|_| BookingError::DeskClosed)
    }
}
