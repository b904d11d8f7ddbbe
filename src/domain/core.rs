mod booking;
mod property;
mod reservation;
mod sales_channel;

pub use self::booking::*;
pub use self::property::*;
pub use self::reservation::*;
pub use self::sales_channel::*;
