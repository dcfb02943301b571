pub mod booking;
pub mod fleet;
pub mod user;

pub use booking::{Booking, BookingStatus, MultiRoomPolicy};
pub use fleet::{Room, Sailing, Ship, Tour};
pub use user::{PaymentStatus, User, UserRole};

use serde::{Deserialize, Deserializer};

/// Text columns in the record store are nullable; treat `null` as an empty string.
pub(crate) fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
