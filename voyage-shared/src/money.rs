use rust_decimal::Decimal;

/// Remaining balance owed: `total - discount - paid`, floored at zero.
pub fn due_amount(total: Decimal, discount: Decimal, paid: Decimal) -> Decimal {
    (total - discount - paid).max(Decimal::ZERO)
}

/// Counts entered by staff are forgiving: negatives become zero.
pub fn clamp_count(count: i32) -> i32 {
    count.max(0)
}
