pub mod models;
pub mod money;
pub mod pii;

pub use models::{
    Booking, BookingStatus, MultiRoomPolicy, PaymentStatus, Room, Sailing, Ship, Tour, User,
    UserRole,
};
pub use pii::Masked;
