use std::{fmt::Debug, sync::Arc};

use derive_more::{Display, Error};

/// 販売チャネル
///
/// 予約を販売したプラットフォームと、その手数料率を表す。
/// 新しいチャネルはこのトレイトを実装するだけで追加できる。
pub trait SalesChannel: Debug + Send + Sync {
    /// 手数料率 (0.0〜1.0)
    fn commission_rate(&self) -> f64;
    /// チャネル名
    fn channel_name(&self) -> &str;
}

/// Airbnb
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AirbnbChannel {
    commission_rate: f64,
}

impl AirbnbChannel {
    pub const NAME: &'static str = "Airbnb";
    pub const COMMISSION_RATE: f64 = 0.15;

    pub fn new() -> Self {
        Self {
            commission_rate: Self::COMMISSION_RATE,
        }
    }

    pub fn shared() -> Arc<dyn SalesChannel> {
        Arc::new(Self::new())
    }
}

impl Default for AirbnbChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SalesChannel for AirbnbChannel {
    fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    fn channel_name(&self) -> &str {
        Self::NAME
    }
}

/// 設定から読み込む任意の販売チャネル
#[derive(Clone, Debug, PartialEq)]
pub struct CustomChannel {
    name: String,
    commission_rate: f64,
}

impl CustomChannel {
    pub fn create(name: String, commission_rate: f64) -> Result<Self, SalesChannelError> {
        Self::validate_created(&name, commission_rate)?;
        Ok(Self {
            name: name.trim().to_owned(),
            commission_rate,
        })
    }

    fn validate_created(name: &str, commission_rate: f64) -> Result<(), SalesChannelError> {
        if name.trim().is_empty() {
            return Err(SalesChannelError::NameIsBlank);
        }
        if !(0.0..=1.0).contains(&commission_rate) {
            return Err(SalesChannelError::InvalidCommissionRate);
        }
        Ok(())
    }
}

impl SalesChannel for CustomChannel {
    fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    fn channel_name(&self) -> &str {
        &self.name
    }
}

/// 販売チャネルエラー
#[derive(Error, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesChannelError {
    /// チャネル名が空欄です
    #[display(fmt = "Sales channel name cannot be blank")]
    NameIsBlank,
    /// 手数料率が0〜1の範囲外です
    #[display(fmt = "Commission rate must be within [0, 1]")]
    InvalidCommissionRate,
}
