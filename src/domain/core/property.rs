use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Entity, Id};

use super::{Reservation, ReservationId};

/// 物件ID
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Deref,
)]
pub struct PropertyId(Uuid);

impl Id for PropertyId {}

/// 物件エンティティ
///
/// 予約は受け付けた順に保持する。予約の追加は [`Property::accept`] からのみ行い、
/// 期間が重なる予約は入らない。
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    id: PropertyId,
    name: String,
    address: String,
    capacity: u32,
    reservations: Vec<Reservation>,
}

impl Property {
    pub fn create(name: &str, address: &str, capacity: u32) -> Result<Self, PropertyError> {
        Self::validate_created(name, address, capacity)?;
        Ok(Property {
            id: PropertyId::generate(),
            name: name.trim().to_owned(),
            address: address.trim().to_owned(),
            capacity,
            reservations: Vec::new(),
        })
    }

    /// 予約を受け付ける
    pub fn accept(&mut self, reservation: Reservation) -> Result<(), PropertyError> {
        self.validate_reservation_accepted(&reservation)?;
        self.reservations.push(reservation);
        Ok(())
    }

    /// 候補の予約と期間が重なる既存の予約
    pub fn conflicts<'a>(
        &'a self,
        candidate: &'a Reservation,
    ) -> impl Iterator<Item = &'a Reservation> + 'a {
        self.reservations
            .iter()
            .filter(move |r| r.overlaps(candidate))
    }

    pub fn can_accept(&self, candidate: &Reservation) -> bool {
        self.conflicts(candidate).next().is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn reservation(&self, id: &ReservationId) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id() == *id)
    }

    fn validate_created(name: &str, address: &str, capacity: u32) -> Result<(), PropertyError> {
        if name.trim().is_empty() {
            return Err(PropertyError::MissingPropertyField {
                field: PropertyField::Name,
            });
        }
        if address.trim().is_empty() {
            return Err(PropertyError::MissingPropertyField {
                field: PropertyField::Address,
            });
        }
        if capacity == 0 {
            return Err(PropertyError::InvalidCapacity);
        }
        Ok(())
    }

    fn validate_reservation_accepted(&self, reservation: &Reservation) -> Result<(), PropertyError> {
        if self.reservation(&reservation.id()).is_some() {
            return Err(PropertyError::DuplicateReservation);
        }
        match self.conflicts(reservation).next() {
            Some(existing) => Err(PropertyError::OverlappingReservation {
                existing: existing.id(),
            }),
            None => Ok(()),
        }
    }
}

impl Entity for Property {
    type Id = PropertyId;

    const ENTITY_NAME: &'static str = "property";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// 物件の必須項目
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum PropertyField {
    #[display(fmt = "name")]
    Name,
    #[display(fmt = "address")]
    Address,
}

/// 物件エラー
#[derive(Error, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyError {
    /// 必須項目が空欄です
    #[display(fmt = "Property {} is required", field)]
    MissingPropertyField { field: PropertyField },
    /// 定員は1以上です
    #[display(fmt = "Capacity must be at least 1")]
    InvalidCapacity,
    /// 既存の予約と期間が重なっています
    #[display(fmt = "Reservation overlaps with existing reservation {}", existing)]
    OverlappingReservation { existing: ReservationId },
    /// 同じIDの予約が既に存在します
    #[display(fmt = "Reservation is already booked on this property")]
    DuplicateReservation,
}
