use async_trait::async_trait;
use eventstore::{AppendToStreamOptions, Client, ExpectedRevision, RecordedEvent};
use tracing::debug;

use crate::domain::core::{
    Reservation, ReservationEvent, ReservationId, ReservationRecord, ReservationRepository,
};
use crate::domain::{DataAccessError, Entity};
use crate::infrastructure::{from_event, stream_name, try_from_recorded_event, EventConvertError};

/// EventStoreDBを使った予約リポジトリ
///
/// 予約ごとに `reservation-<id>` ストリームを作る。ストリームが無いことを前提に書き込むので、
/// 同じIDの予約は保存できない。
#[derive(Clone)]
pub struct EventStoreReservationRepository {
    client: Client,
}

impl EventStoreReservationRepository {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReservationRepository for EventStoreReservationRepository {
    async fn find_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<ReservationRecord>, DataAccessError> {
        let mut stream = match self
            .client
            .read_stream(stream_name::<Reservation>(id), &Default::default())
            .await
        {
            Ok(stream) => stream,
            Err(eventstore::Error::ResourceDeleted) => return Ok(None),
            Err(eventstore::Error::ResourceNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut record = None;
        loop {
            match stream.next().await {
                Ok(Some(e)) => {
                    let event = ReservationEvent::try_from(e.get_original_event())?;
                    record = Some(ReservationRecord::from(event));
                }
                Ok(_) => break,
                Err(eventstore::Error::ResourceDeleted) => return Ok(None),
                Err(eventstore::Error::ResourceNotFound) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
        debug!("予約を読み込みました: {} ({:?})", id, record);
        Ok(record)
    }

    async fn save(&mut self, entity: &Reservation) -> Result<(), DataAccessError> {
        let stream_name = stream_name::<Reservation>(entity.id());
        let event = from_event(&ReservationEvent::from(entity))?;
        match self
            .client
            .append_to_stream(
                &stream_name,
                &AppendToStreamOptions::default().expected_revision(ExpectedRevision::NoStream),
                event,
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(eventstore::Error::WrongExpectedVersion { .. }) => {
                Err(DataAccessError::AlreadyExists(stream_name))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl TryFrom<&RecordedEvent> for ReservationEvent {
    type Error = EventConvertError;

    fn try_from(value: &RecordedEvent) -> Result<Self, Self::Error> {
        try_from_recorded_event(value)
    }
}
