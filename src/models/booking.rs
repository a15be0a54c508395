//! Consultation bookings
use chrono::NaiveDateTime;

use models::row::{format_flag, format_timestamp, record_id, Row, ToRow};

pub const BOOKING_ID_PREFIX: &str = "BK";

fn unknown() -> String {
    "Unknown".to_string()
}

/// Payload of `POST /api/bookings`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewBooking {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default = "unknown")]
    pub phone: String,
    #[serde(default = "unknown")]
    pub doctor_type: String,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default = "unknown")]
    pub country: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub doctor_type: String,
    pub emergency: bool,
    pub country: String,
    pub created_at: NaiveDateTime,
}

impl Booking {
    pub fn new(payload: NewBooking, now: NaiveDateTime) -> Self {
        Booking {
            id: record_id(BOOKING_ID_PREFIX, now),
            name: payload.name,
            phone: payload.phone,
            doctor_type: payload.doctor_type,
            emergency: payload.emergency,
            country: payload.country,
            created_at: now,
        }
    }
}

impl ToRow for Booking {
    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), self.id.clone());
        row.insert("name".to_string(), self.name.clone());
        row.insert("phone".to_string(), self.phone.clone());
        row.insert("doctor_type".to_string(), self.doctor_type.clone());
        row.insert("emergency".to_string(), format_flag(self.emergency));
        row.insert("country".to_string(), self.country.clone());
        row.insert("timestamp".to_string(), format_timestamp(self.created_at));
        row
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BookingCreated {
    pub success: bool,
    pub booking_id: String,
    pub message: String,
}

impl<'a> From<&'a Booking> for BookingCreated {
    fn from(booking: &'a Booking) -> Self {
        BookingCreated {
            success: true,
            booking_id: booking.id.clone(),
            message: "Booking created successfully".to_string(),
        }
    }
}
