use std::{error::Error, io::Write, process::ExitCode, sync::Arc};

use chrono::NaiveDate;
use eventstore::ClientSettings;
use manta::{
    domain::core::{
        AirbnbChannel, BookingDesk, BookingError, CustomChannel, Property, Reservation,
        SalesChannel, SalesChannelError,
    },
    infrastructure::{core::EventStoreReservationRepository, InMemoryReservationRepository},
    ChannelSettings, MantaConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn, Level};

static DATE_FORMAT: &str = "%Y-%m-%d";

#[tokio::main]
async fn main() -> ExitCode {
    match MantaConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(Level::from(&config.logger.level))
                .init();
            if let Err(error) = run(&config).await {
                error!("アプリケーションエラー: {}", error);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing_subscriber::fmt::init();
            error!("設定の読み込みに失敗しました: {}", error);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &MantaConfig) -> Result<(), Box<dyn Error>> {
    let property = Property::create(
        &config.property.name,
        &config.property.address,
        config.property.capacity,
    )?;
    let channels = sales_channels(&config.channels)?;
    info!(
        "物件 {} ({}) の予約受付を開始します",
        property.name(),
        property.address()
    );

    let desk = match &config.eventstore {
        Some(eventstore) => {
            let settings = eventstore.url.parse::<ClientSettings>()?;
            let client = eventstore::Client::new(settings)?;
            BookingDesk::spawn(property, EventStoreReservationRepository::new(client))
        }
        None => {
            warn!("EventStoreが設定されていないため、予約はメモリ上にのみ保存されます");
            BookingDesk::spawn(property, InMemoryReservationRepository::new())
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let guest = match prompt(&mut lines, "Guest name (empty to quit): ").await? {
            Some(guest) if !guest.is_empty() => guest,
            _ => break,
        };
        let Some(start) = prompt_date(&mut lines, "Arrival date (YYYY-MM-DD): ").await? else {
            break;
        };
        let Some(end) = prompt_date(&mut lines, "Departure date (YYYY-MM-DD): ").await? else {
            break;
        };
        let Some(channel) = prompt(&mut lines, "Sales channel [Airbnb]: ").await? else {
            break;
        };
        let channel = select_channel(&channels, &channel);

        match submit(&desk, &guest, start, end, channel).await {
            Ok(summary) => println!("booked {}", summary),
            Err(e) if e.is_retryable() => println!("not saved, try again: {}", e),
            Err(e) => println!("rejected: {}", e),
        }
    }

    let property = desk.property().await?;
    info!(
        "受付を終了します: {} 件の予約 (物件 {})",
        property.reservations().len(),
        property.name()
    );
    Ok(())
}

async fn submit(
    desk: &BookingDesk,
    guest: &str,
    start: NaiveDate,
    end: NaiveDate,
    channel: Option<Arc<dyn SalesChannel>>,
) -> Result<String, BookingError> {
    let reservation = Reservation::create(guest, start, end, channel)?;
    let summary = reservation.to_string();
    let id = desk.book(reservation).await?;
    Ok(format!("{} [{}]", summary, id))
}

/// Airbnbを先頭に、設定ファイルのチャネルを続ける
fn sales_channels(
    settings: &[ChannelSettings],
) -> Result<Vec<Arc<dyn SalesChannel>>, SalesChannelError> {
    let mut channels = vec![AirbnbChannel::shared()];
    for s in settings {
        channels.push(Arc::new(CustomChannel::create(
            s.name.clone(),
            s.commission_rate,
        )?));
    }
    Ok(channels)
}

fn select_channel(channels: &[Arc<dyn SalesChannel>], input: &str) -> Option<Arc<dyn SalesChannel>> {
    let name = match input.trim() {
        "" => AirbnbChannel::NAME,
        name => name,
    };
    channels
        .iter()
        .find(|c| c.channel_name().eq_ignore_ascii_case(name))
        .cloned()
}

async fn prompt(
    lines: &mut Lines<BufReader<Stdin>>,
    message: &str,
) -> Result<Option<String>, std::io::Error> {
    print!("{}", message);
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?.map(|line| line.trim().to_owned()))
}

/// 日付として読めるまで繰り返し入力を求める
async fn prompt_date(
    lines: &mut Lines<BufReader<Stdin>>,
    message: &str,
) -> Result<Option<NaiveDate>, std::io::Error> {
    loop {
        let Some(input) = prompt(lines, message).await? else {
            return Ok(None);
        };
        match NaiveDate::parse_from_str(&input, DATE_FORMAT) {
            Ok(date) => return Ok(Some(date)),
            Err(_) => println!("invalid date, use YYYY-MM-DD (e.g. 2026-03-15)"),
        }
    }
}
