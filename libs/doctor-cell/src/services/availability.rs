use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{BookedSlot, Doctor, DoctorError, WorkingHours, SLOT_INTERVAL_MINUTES};

/// Computes which time slots are actually bookable for a doctor on a given
/// calendar date: inside the weekday's working-hours window, aligned to the
/// slot grid, and not already taken by an existing appointment.
///
/// Results are recomputed from the store on every call. Caching them would
/// reintroduce the double-booking staleness this service exists to prevent.
pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Weekday index used by the working-hours table (0 = Sunday).
    pub fn day_of_week(date: NaiveDate) -> i16 {
        match date.weekday() {
            Weekday::Sun => 0,
            Weekday::Mon => 1,
            Weekday::Tue => 2,
            Weekday::Wed => 3,
            Weekday::Thu => 4,
            Weekday::Fri => 5,
            Weekday::Sat => 6,
        }
    }

    /// Candidate slots for a window: start inclusive, end exclusive, stepping
    /// by the grid interval. An 08:00-12:00 window yields 08:00 through 11:00.
    pub fn slot_grid(start: NaiveTime, end: NaiveTime) -> Vec<NaiveTime> {
        let step = Duration::minutes(SLOT_INTERVAL_MINUTES);
        let mut slots = Vec::new();
        let mut current = start;

        while current < end {
            slots.push(current);
            let (next, wrapped) = current.overflowing_add_signed(step);
            if wrapped != 0 {
                // Stepping past midnight wraps NaiveTime; the window is over.
                break;
            }
            current = next;
        }

        slots
    }

    /// Ordered free slots for a doctor on a date. Empty when the doctor has
    /// no working hours that weekday or is fully booked.
    ///
    /// `exclude_appointment` removes one appointment from the occupied set;
    /// the upsert flow passes the id of a booking that is being moved so its
    /// own slot does not block it.
    pub async fn available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        exclude_appointment: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<NaiveTime>, DoctorError> {
        debug!("Calculating available slots for doctor {} on {}", doctor_id, date);

        let day_of_week = Self::day_of_week(date);
        let window = match self.working_hours_for_day(doctor_id, day_of_week, auth_token).await? {
            Some(window) => window,
            None => {
                debug!("Doctor {} has no working hours on weekday {}", doctor_id, day_of_week);
                return Ok(vec![]);
            }
        };

        let mut slots = Self::slot_grid(window.start_time, window.end_time);

        let booked = self
            .booked_times(doctor_id, date, exclude_appointment, auth_token)
            .await?;

        // Exact-match removal is enough: committed appointments are always
        // grid-aligned, so a taken slot can only collide with one candidate.
        slots.retain(|slot| !booked.contains(slot));

        debug!("Found {} available slots", slots.len());
        Ok(slots)
    }

    /// Read-only variant for the slot-listing endpoint. Confirms the doctor
    /// belongs to the caller's clinic before computing anything; a missing
    /// and a foreign doctor are indistinguishable to the caller.
    pub async fn available_slots_for_clinic(
        &self,
        clinic_id: Uuid,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<NaiveTime>, DoctorError> {
        self.get_clinic_doctor(clinic_id, doctor_id, auth_token).await?;
        self.available_slots(doctor_id, date, None, auth_token).await
    }

    /// Point lookup of a doctor scoped to a clinic.
    pub async fn get_clinic_doctor(
        &self,
        clinic_id: Uuid,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let path = format!(
            "/rest/v1/doctors?id=eq.{}&clinic_id=eq.{}",
            doctor_id, clinic_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(DoctorError::NotFound);
        }

        let doctor: Doctor = serde_json::from_value(result[0].clone())
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse doctor: {}", e)))?;

        Ok(doctor)
    }

    async fn working_hours_for_day(
        &self,
        doctor_id: Uuid,
        day_of_week: i16,
        auth_token: &str,
    ) -> Result<Option<WorkingHours>, DoctorError> {
        let path = format!(
            "/rest/v1/doctor_working_hours?doctor_id=eq.{}&day_of_week=eq.{}&order=start_time.asc",
            doctor_id, day_of_week
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Ok(None);
        };

        let window: WorkingHours = serde_json::from_value(row).map_err(|e| {
            DoctorError::DatabaseError(format!("Failed to parse working hours: {}", e))
        })?;

        Ok(Some(window))
    }

    async fn booked_times(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        exclude_appointment: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<NaiveTime>, DoctorError> {
        let mut path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&order=time.asc",
            doctor_id, date
        );
        if let Some(exclude_id) = exclude_appointment {
            path.push_str(&format!("&id=neq.{}", exclude_id));
        }

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let booked: Vec<BookedSlot> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<BookedSlot>, _>>()
            .map_err(|e| {
                DoctorError::DatabaseError(format!("Failed to parse appointments: {}", e))
            })?;

        Ok(booked.into_iter().map(|slot| slot.time).collect())
    }
}
