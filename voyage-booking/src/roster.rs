use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;
use voyage_shared::money::clamp_count;
use voyage_shared::{PaymentStatus, User, UserRole};

use crate::lifecycle::BookingView;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomerEntry {
    pub booking_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub room_number: Option<String>,
    pub room_type: Option<String>,
    pub adults: i32,
    pub children: i32,
    pub payment_status: PaymentStatus,
}

/// Identity of a customer across bookings: email if present, then phone, then name.
fn customer_key(view: &BookingView) -> String {
    let b = &view.booking;
    if !b.email.trim().is_empty() {
        format!("email:{}", b.email.trim().to_lowercase())
    } else if !b.phone.trim().is_empty() {
        format!("phone:{}", b.phone.trim())
    } else {
        format!("name:{}", b.name.trim().to_lowercase())
    }
}

/// Case-insensitive on name and email, plain substring on phone.
fn matches_query(name: &str, email: &str, phone: &str, query: &str) -> bool {
    let q = query.to_lowercase();
    name.to_lowercase().contains(&q) || email.to_lowercase().contains(&q) || phone.contains(query)
}

fn normalized(query: Option<&str>) -> Option<&str> {
    query.map(str::trim).filter(|q| !q.is_empty())
}

/// Collapse bookings into unique customers. Each booking is checked against
/// the query on its own fields before deduplication, and the first matching
/// booking of a customer wins. Callers pass active bookings only.
pub fn project(views: &[BookingView], query: Option<&str>) -> Vec<CustomerEntry> {
    let mut seen = HashSet::new();
    let query = normalized(query);

    views
        .iter()
        .filter(|v| {
            let b = &v.booking;
            query.map_or(true, |q| matches_query(&b.name, &b.email, &b.phone, q))
        })
        .filter(|v| seen.insert(customer_key(v)))
        .map(|v| CustomerEntry {
            booking_id: v.booking.id,
            name: v.booking.name.clone(),
            email: v.booking.email.clone(),
            phone: v.booking.phone.clone(),
            room_number: v.room_number.clone(),
            room_type: v.room_type.clone(),
            adults: clamp_count(v.booking.adult_count),
            children: clamp_count(v.booking.child_count),
            payment_status: v.booking.payment_status(),
        })
        .collect()
}

/// Registered passenger accounts matching the query. Staff accounts are dropped.
pub fn passengers(users: Vec<User>, query: Option<&str>) -> Vec<User> {
    let query = normalized(query);
    users
        .into_iter()
        .filter(|u| u.role == UserRole::Passenger)
        .filter(|u| query.map_or(true, |q| matches_query(&u.name, &u.email, &u.phone, q)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use voyage_shared::{Booking, BookingStatus};

    fn view(name: &str, email: &str, phone: &str, due: i64) -> BookingView {
        BookingView {
            booking: Booking {
                id: Uuid::new_v4(),
                tour_instance_id: Uuid::new_v4(),
                room_id: Uuid::new_v4(),
                name: name.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
                payment_method: String::new(),
                payment_details: String::new(),
                total_payment: Decimal::from(100),
                paid_amount: Decimal::ZERO,
                due_amount: Decimal::from(due),
                discount: Decimal::ZERO,
                adult_count: 2,
                child_count: -3,
                status: BookingStatus::Pending,
            },
            room_number: Some("101".to_string()),
            room_type: Some("Single".to_string()),
        }
    }

    #[test]
    fn test_dedupes_by_email_case_insensitive() {
        let views = vec![
            view("Alice", "Alice@Example.com", "1", 50),
            view("Alice Again", "alice@example.com", "2", 0),
        ];
        let roster = project(&views, None);

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Alice");
        assert_eq!(roster[0].payment_status, PaymentStatus::Due);
        assert_eq!(roster[0].children, 0);
    }

    #[test]
    fn test_falls_back_to_phone_then_name() {
        let views = vec![
            view("Bob", "", "555", 0),
            view("Robert", "", "555", 0),
            view("Carol", "", "", 0),
            view("carol", "", "", 0),
            view("Dan", "", "", 0),
        ];
        let roster = project(&views, None);

        let names: Vec<&str> = roster.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Carol", "Dan"]);
        assert!(roster.iter().all(|e| e.payment_status == PaymentStatus::Paid));
    }

    #[test]
    fn test_query_checked_per_booking_before_dedupe() {
        let views = vec![
            view("Alice", "a@x.com", "1", 0),
            view("Alice Brown", "a@x.com", "1", 50),
        ];
        let roster = project(&views, Some("brown"));

        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].name, "Alice Brown");
        assert_eq!(roster[0].payment_status, PaymentStatus::Due);
    }

    #[test]
    fn test_passengers_exclude_admins_and_filter() {
        let user = |name: &str, role: UserRole| User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "0155".to_string(),
            role,
        };
        let users = vec![
            user("Alice", UserRole::Passenger),
            user("Root", UserRole::Admin),
            user("Bob", UserRole::Passenger),
        ];

        assert_eq!(passengers(users.clone(), None).len(), 2);
        let found = passengers(users, Some("BOB"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Bob");
    }

    #[test]
    fn test_query_filters_name_email_phone() {
        let views = vec![
            view("Alice", "alice@example.com", "0171", 0),
            view("Bob", "bob@example.com", "0199", 0),
        ];

        assert_eq!(project(&views, Some("ALI")).len(), 1);
        assert_eq!(project(&views, Some("bob@")).len(), 1);
        assert_eq!(project(&views, Some("019")).len(), 1);
        assert_eq!(project(&views, Some("  ")).len(), 2);
        assert!(project(&views, Some("zed")).is_empty());
    }
}
