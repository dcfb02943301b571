use rust_decimal::Decimal;
use voyage_shared::money::clamp_count;

use crate::reconciler::{GuestDetails, PaymentDetails};
use crate::BookingError;

/// Trim text fields, require name and phone, clamp negative head counts to zero.
pub fn normalize_guest(guest: GuestDetails) -> Result<GuestDetails, BookingError> {
    let name = guest.name.trim().to_string();
    let phone = guest.phone.trim().to_string();

    if name.is_empty() || phone.is_empty() {
        return Err(BookingError::Validation("Name and phone are required".to_string()));
    }

    Ok(GuestDetails {
        name,
        phone,
        email: guest.email.trim().to_string(),
        adults: clamp_count(guest.adults),
        children: clamp_count(guest.children),
    })
}

pub fn normalize_payment(payment: PaymentDetails) -> Result<PaymentDetails, BookingError> {
    for (label, amount) in [
        ("total", payment.total),
        ("paid", payment.paid),
        ("discount", payment.discount),
    ] {
        if amount < Decimal::ZERO {
            return Err(BookingError::Validation(format!(
                "{} amount must not be negative",
                label
            )));
        }
    }

    Ok(PaymentDetails {
        method: payment.method.trim().to_string(),
        details: payment.details.trim().to_string(),
        ..payment
    })
}
