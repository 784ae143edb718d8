use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Width of a bookable slot. Appointments always start on a multiple of
/// this interval within the doctor's working-hours window.
pub const SLOT_INTERVAL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub name: String,
    pub specialty: String,
    pub appointment_price_in_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One weekday window of a doctor's working-hours profile.
/// day_of_week: 0 = Sunday, 1 = Monday, ... 6 = Saturday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHours {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Projection of an appointment row used when computing occupancy.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedSlot {
    pub id: Uuid,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
