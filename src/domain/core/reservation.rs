use std::{fmt, ops::Range, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{DataAccessError, Entity, Event, Id};

use super::SalesChannel;

/// 予約リポジトリ
#[async_trait]
pub trait ReservationRepository {
    /// IDで予約を検索する
    async fn find_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<ReservationRecord>, DataAccessError>;
    /// 予約を保存する。同じIDの予約が既にあれば失敗する
    async fn save(&mut self, entity: &Reservation) -> Result<(), DataAccessError>;
}

/// 予約ID
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Deref,
)]
pub struct ReservationId(Uuid);

impl Id for ReservationId {}

/// 予約イベント
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReservationEvent {
    /// 予約が記録された
    ReservationRecorded {
        id: ReservationId,
        guest_name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        channel_name: String,
        commission_rate: f64,
    },
}

impl Event for ReservationEvent {
    type Id = ReservationId;

    fn id(&self) -> ReservationId {
        match self {
            ReservationEvent::ReservationRecorded { id, .. } => *id,
        }
    }
}

impl From<&Reservation> for ReservationEvent {
    fn from(value: &Reservation) -> Self {
        ReservationEvent::ReservationRecorded {
            id: value.id,
            guest_name: value.guest_name.clone(),
            start_date: value.start_date(),
            end_date: value.end_date(),
            channel_name: value.channel.channel_name().to_owned(),
            commission_rate: value.channel.commission_rate(),
        }
    }
}

/// 予約エンティティ
///
/// 生成時に検証済みで、生成後は変更されない。
#[derive(Clone, Debug)]
pub struct Reservation {
    id: ReservationId,
    guest_name: String,
    stay: Range<NaiveDate>,
    channel: Arc<dyn SalesChannel>,
}

impl Reservation {
    /// 予約を作成する
    ///
    /// 検証は日付範囲、宿泊者名、販売チャネルの順に行い、最初に違反した規則のエラーを返す。
    pub fn create(
        guest_name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        channel: Option<Arc<dyn SalesChannel>>,
    ) -> Result<Self, ReservationError> {
        Self::validate_stay(&(start_date..end_date))?;
        Self::validate_guest_name(guest_name)?;
        let channel = channel.ok_or(ReservationError::MissingSalesChannel)?;
        Ok(Reservation {
            id: ReservationId::generate(),
            guest_name: guest_name.trim().to_owned(),
            stay: start_date..end_date,
            channel,
        })
    }

    pub fn guest_name(&self) -> &str {
        &self.guest_name
    }

    pub fn stay(&self) -> &Range<NaiveDate> {
        &self.stay
    }

    pub fn start_date(&self) -> NaiveDate {
        self.stay.start
    }

    pub fn end_date(&self) -> NaiveDate {
        self.stay.end
    }

    pub fn channel(&self) -> &Arc<dyn SalesChannel> {
        &self.channel
    }

    /// 宿泊期間が重なるか
    ///
    /// 期間は半開区間 `[start, end)` なので、チェックアウト日に次の予約が始まっても重ならない。
    pub fn overlaps(&self, other: &Reservation) -> bool {
        self.stay.start < other.stay.end && self.stay.end > other.stay.start
    }

    pub fn nights(&self) -> i64 {
        (self.stay.end - self.stay.start).num_days()
    }

    pub fn to_record(&self) -> ReservationRecord {
        ReservationRecord {
            id: self.id,
            guest_name: self.guest_name.clone(),
            start_date: self.start_date(),
            end_date: self.end_date(),
            channel_name: self.channel.channel_name().to_owned(),
            commission_rate: self.channel.commission_rate(),
        }
    }

    fn validate_stay(stay: &Range<NaiveDate>) -> Result<(), ReservationError> {
        if stay.start >= stay.end {
            return Err(ReservationError::InvalidDateRange);
        }
        Ok(())
    }

    fn validate_guest_name(guest_name: &str) -> Result<(), ReservationError> {
        if guest_name.trim().is_empty() {
            return Err(ReservationError::MissingGuestName);
        }
        Ok(())
    }
}

impl Entity for Reservation {
    type Id = ReservationId;

    const ENTITY_NAME: &'static str = "reservation";

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl PartialEq for Reservation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.guest_name == other.guest_name
            && self.stay == other.stay
            && self.channel.channel_name() == other.channel.channel_name()
            && self.channel.commission_rate() == other.channel.commission_rate()
    }
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reservation: {} | From: {} To: {} | Channel: {}",
            self.guest_name,
            self.stay.start.format("%Y-%m-%d"),
            self.stay.end.format("%Y-%m-%d"),
            self.channel.channel_name()
        )
    }
}

/// 保存用の予約レコード
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub id: ReservationId,
    pub guest_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub channel_name: String,
    pub commission_rate: f64,
}

impl From<ReservationEvent> for ReservationRecord {
    fn from(value: ReservationEvent) -> Self {
        match value {
            ReservationEvent::ReservationRecorded {
                id,
                guest_name,
                start_date,
                end_date,
                channel_name,
                commission_rate,
            } => ReservationRecord {
                id,
                guest_name,
                start_date,
                end_date,
                channel_name,
                commission_rate,
            },
        }
    }
}

impl fmt::Display for ReservationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}, {}) via {} ({:.0}%)",
            self.id,
            self.guest_name,
            self.start_date,
            self.end_date,
            self.channel_name,
            self.commission_rate * 100.0
        )
    }
}

/// 予約エラー
#[derive(Error, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationError {
    /// 開始日が終了日より前ではありません
    #[display(fmt = "Start date must be before end date")]
    InvalidDateRange,
    /// 宿泊者名が指定されていません
    #[display(fmt = "Guest name is required")]
    MissingGuestName,
    /// 販売チャネルが指定されていません
    #[display(fmt = "Sales channel is required")]
    MissingSalesChannel,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::domain::core::AirbnbChannel;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stay(guest: &str, start: NaiveDate, end: NaiveDate) -> Reservation {
        Reservation::create(guest, start, end, Some(AirbnbChannel::shared())).unwrap()
    }

    #[test]
    fn test_reservation_create() {
        let reservation = stay("Ana", date(2026, 3, 15), date(2026, 3, 18));
        assert_eq!(reservation.guest_name(), "Ana");
        assert_eq!(reservation.start_date(), date(2026, 3, 15));
        assert_eq!(reservation.end_date(), date(2026, 3, 18));
        assert_eq!(reservation.nights(), 3);
        assert_eq!(reservation.channel().channel_name(), "Airbnb");
        assert_eq!(
            reservation.to_string(),
            "Reservation: Ana | From: 2026-03-15 To: 2026-03-18 | Channel: Airbnb"
        );
    }

    #[test]
    fn test_reservation_trims_guest_name() {
        let reservation = stay("  Luis Pérez \n", date(2026, 3, 1), date(2026, 3, 2));
        assert_eq!(reservation.guest_name(), "Luis Pérez");
    }

    #[test]
    fn test_reservation_rejects_equal_and_inverted_dates() {
        let channel = Some(AirbnbChannel::shared());
        assert_eq!(
            Reservation::create("Ana", date(2026, 3, 5), date(2026, 3, 5), channel.clone()),
            Err(ReservationError::InvalidDateRange)
        );
        assert_eq!(
            Reservation::create("Ana", date(2026, 3, 6), date(2026, 3, 5), channel),
            Err(ReservationError::InvalidDateRange)
        );
    }

    #[test]
    fn test_reservation_rejects_blank_guest_name() {
        for name in ["", "   ", "\t\n"] {
            assert_eq!(
                Reservation::create(
                    name,
                    date(2026, 3, 1),
                    date(2026, 3, 2),
                    Some(AirbnbChannel::shared())
                ),
                Err(ReservationError::MissingGuestName)
            );
        }
    }

    #[test]
    fn test_reservation_requires_channel() {
        assert_eq!(
            Reservation::create("Ana", date(2026, 3, 1), date(2026, 3, 2), None),
            Err(ReservationError::MissingSalesChannel)
        );
    }

    #[test]
    fn test_first_violated_rule_wins() {
        assert_eq!(
            Reservation::create("", date(2026, 3, 2), date(2026, 3, 1), None),
            Err(ReservationError::InvalidDateRange)
        );
        assert_eq!(
            Reservation::create("", date(2026, 3, 1), date(2026, 3, 2), None),
            Err(ReservationError::MissingGuestName)
        );
    }

    #[test]
    fn test_identical_inputs_get_distinct_ids() {
        let a = stay("Ana", date(2026, 3, 15), date(2026, 3, 18));
        let b = stay("Ana", date(2026, 3, 15), date(2026, 3, 18));
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_back_to_back_do_not_overlap() {
        let a = stay("Ana", date(2026, 3, 1), date(2026, 3, 5));
        let b = stay("Luis", date(2026, 3, 5), date(2026, 3, 10));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_record_and_event() {
        let reservation = stay("Ana", date(2026, 3, 15), date(2026, 3, 18));
        let record = reservation.to_record();
        assert_eq!(record.id, reservation.id());
        assert_eq!(record.channel_name, "Airbnb");
        assert_eq!(record.commission_rate, 0.15);
        let event = ReservationEvent::from(&reservation);
        assert_eq!(Event::id(&event), reservation.id());
        assert_eq!(ReservationRecord::from(event), record);
    }

    fn any_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..3650).prop_map(|offset| date(2024, 1, 1) + chrono::Duration::days(offset))
    }

    proptest! {
        #[test]
        fn prop_valid_range_is_accepted(start in any_date(), nights in 1i64..60) {
            let end = start + chrono::Duration::days(nights);
            let reservation = Reservation::create("Ana", start, end, Some(AirbnbChannel::shared()));
            prop_assert!(reservation.is_ok());
        }

        #[test]
        fn prop_empty_range_is_rejected(end in any_date(), back in 0i64..60) {
            let start = end + chrono::Duration::days(back);
            prop_assert_eq!(
                Reservation::create("Ana", start, end, Some(AirbnbChannel::shared())),
                Err(ReservationError::InvalidDateRange)
            );
        }

        #[test]
        fn prop_non_blank_names_are_accepted(name in "[A-Za-z][A-Za-z ]{0,30}") {
            let reservation = Reservation::create(
                &name,
                date(2026, 3, 1),
                date(2026, 3, 2),
                Some(AirbnbChannel::shared()),
            );
            prop_assert!(reservation.is_ok());
        }

        #[test]
        fn prop_overlaps_is_symmetric(
            a_start in any_date(), a_nights in 1i64..30,
            b_start in any_date(), b_nights in 1i64..30,
        ) {
            let a = stay("Ana", a_start, a_start + chrono::Duration::days(a_nights));
            let b = stay("Luis", b_start, b_start + chrono::Duration::days(b_nights));
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }
    }
}
