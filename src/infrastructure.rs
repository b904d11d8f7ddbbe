pub mod core;
mod memory;

use eventstore::{EventData, RecordedEvent};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::domain::{DataAccessError, Entity, Event, Id};

use std::fmt::Display;

pub use self::memory::*;

impl From<eventstore::Error> for DataAccessError {
    #[allow(unreachable_patterns)]
    fn from(value: eventstore::Error) -> Self {
        match value {
            eventstore::Error::ConnectionClosed
            | eventstore::Error::Grpc { .. }
            | eventstore::Error::GrpcConnectionError(_)
            | eventstore::Error::DeadlineExceeded
            | eventstore::Error::InitializationError(_) => Self::ConnectionError(Box::new(value)),
            eventstore::Error::ServerError(_)
            | eventstore::Error::NotLeaderException(_)
            | eventstore::Error::AccessDenied
            | eventstore::Error::UnsupportedFeature
            | eventstore::Error::InternalParsingError(_)
            | eventstore::Error::InternalClientError => Self::QueryError(Box::new(value)),
            eventstore::Error::ResourceNotFound | eventstore::Error::ResourceDeleted => {
                Self::ReadError(Box::new(value))
            }
            eventstore::Error::ResourceAlreadyExists
            | eventstore::Error::WrongExpectedVersion { .. } => Self::WriteError(Box::new(value)),
            eventstore::Error::IllegalStateError(_) => Self::ClientSideError(Box::new(value)),
            _ => Self::ClientSideError(Box::new(value)),
        }
    }
}

impl From<EventConvertError> for DataAccessError {
    fn from(value: EventConvertError) -> Self {
        DataAccessError::ClientSideError(Box::new(value))
    }
}

#[derive(Debug)]
pub struct EventConvertError;

impl std::error::Error for EventConvertError {}

impl Display for EventConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to convert event")
    }
}

impl From<serde_json::Error> for EventConvertError {
    fn from(_value: serde_json::Error) -> Self {
        EventConvertError
    }
}

/// `reservation-<uuid>` からIDを取り出す。UUIDにも `-` が含まれるので最初の区切りで分ける
fn entity_id<I: Id>(stream_id: &str) -> Option<I> {
    stream_id
        .split_once('-')
        .and_then(|(_, id)| id.parse::<uuid::Uuid>().ok())
        .map(I::from)
}

fn stream_name<E: Entity>(id: E::Id) -> String {
    E::ENTITY_NAME.to_owned() + "-" + &id.to_string()
}

/// 外部タグ付きのイベントを、タグをイベント種別、`id` を除いた中身をデータとして変換する
fn from_event<E: Event>(event: &E) -> Result<EventData, EventConvertError> {
    let root = serde_json::to_value(event)?;
    let (event_type, data) = root
        .as_object()
        .and_then(|o| o.iter().next())
        .ok_or(EventConvertError)?;
    let mut data = data.clone();
    data.as_object_mut().ok_or(EventConvertError)?.remove("id");
    Ok(EventData::json(event_type, data)?)
}

fn try_from_recorded_event<E>(event: &RecordedEvent) -> Result<E, EventConvertError>
where
    E: DeserializeOwned + Event,
{
    let id = entity_id::<E::Id>(&event.stream_id).ok_or(EventConvertError)?;
    let mut data: Value = serde_json::from_slice(event.data.as_ref())?;
    data.as_object_mut()
        .ok_or(EventConvertError)?
        .insert("id".to_owned(), json!(id));
    let mut root = Map::new();
    root.insert(event.event_type.clone(), data);
    Ok(serde_json::from_value(Value::Object(root))?)
}
