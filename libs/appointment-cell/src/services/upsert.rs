// libs/appointment-cell/src/services/upsert.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::models::DoctorError;
use doctor_cell::services::availability::AvailabilityService;
use shared_config::AppConfig;
use shared_database::supabase::{StoreError, SupabaseClient};

use crate::models::{Appointment, AppointmentError, UpsertAppointmentPayload, UpsertAppointmentRequest};
use crate::services::tenant::TenantGuard;
use crate::services::validation;

/// Orchestrates the full create-or-update flow for one appointment:
/// validation, tenant check, price defaulting, slot availability, commit.
pub struct AppointmentUpsertService {
    supabase: SupabaseClient,
    tenant_guard: TenantGuard,
    availability_service: AvailabilityService,
}

impl AppointmentUpsertService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            tenant_guard: TenantGuard::new(config),
            availability_service: AvailabilityService::new(config),
        }
    }

    pub async fn upsert(
        &self,
        clinic_id: Uuid,
        payload: UpsertAppointmentPayload,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        // Step 1: shape of the request, every violation reported at once
        let request = validation::validate(&payload).map_err(AppointmentError::Validation)?;

        debug!(
            "Upserting appointment for clinic {}: doctor {}, patient {}, {} {}",
            clinic_id, request.doctor_id, request.patient_id, request.date, request.time
        );

        // Step 2: both referenced records must belong to the caller's clinic
        let (doctor, _patient) = self
            .tenant_guard
            .load_doctor_and_patient(clinic_id, request.doctor_id, request.patient_id, auth_token)
            .await?;

        // Step 3: explicit price wins, otherwise the doctor's current rate
        let price_in_cents = request
            .price_in_minor_units
            .unwrap_or(doctor.appointment_price_in_cents);

        // Steps 4-5: slot check and commit
        match request.id {
            None => {
                self.create_appointment(clinic_id, &request, price_in_cents, auth_token)
                    .await
            }
            Some(appointment_id) => {
                self.update_appointment(clinic_id, appointment_id, &request, price_in_cents, auth_token)
                    .await
            }
        }
    }

    async fn create_appointment(
        &self,
        clinic_id: Uuid,
        request: &UpsertAppointmentRequest,
        price_in_cents: i64,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.ensure_slot_free(request, None, auth_token).await?;

        let now = Utc::now();
        let appointment_data = json!({
            "clinic_id": clinic_id,
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "date": request.date,
            "time": request.time.format("%H:%M:%S").to_string(),
            "price_in_cents": price_in_cents,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| self.classify_commit_error(e, request))?;

        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Failed to create appointment".to_string(),
            ));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone()).map_err(|e| {
            AppointmentError::DatabaseError(format!("Failed to parse created appointment: {}", e))
        })?;

        info!(
            "Appointment {} created for doctor {} at {} {}",
            appointment.id, appointment.doctor_id, appointment.date, appointment.time
        );
        Ok(appointment)
    }

    async fn update_appointment(
        &self,
        clinic_id: Uuid,
        appointment_id: Uuid,
        request: &UpsertAppointmentRequest,
        price_in_cents: i64,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let existing = self
            .get_clinic_appointment(appointment_id, clinic_id, auth_token)
            .await?;

        // Re-check availability only when the booking actually moves. The
        // moved appointment's own slot is excluded from the occupied set, so
        // keeping the current time never fails as "taken by itself".
        let moved = request.doctor_id != existing.doctor_id
            || request.date != existing.date
            || request.time != existing.time;

        if moved {
            self.ensure_slot_free(request, Some(appointment_id), auth_token)
                .await?;
        }

        let update_data = json!({
            "patient_id": request.patient_id,
            "doctor_id": request.doctor_id,
            "date": request.date,
            "time": request.time.format("%H:%M:%S").to_string(),
            "price_in_cents": price_in_cents,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&clinic_id=eq.{}",
            appointment_id, clinic_id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(headers),
            )
            .await
            .map_err(|e| self.classify_commit_error(e, request))?;

        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Failed to update appointment".to_string(),
            ));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone()).map_err(|e| {
            AppointmentError::DatabaseError(format!("Failed to parse updated appointment: {}", e))
        })?;

        info!("Appointment {} updated", appointment.id);
        Ok(appointment)
    }

    /// The requested time must be one of the currently open slots for the
    /// doctor and date. `exclude_appointment` carries the id of a booking
    /// being moved so it does not block itself.
    async fn ensure_slot_free(
        &self,
        request: &UpsertAppointmentRequest,
        exclude_appointment: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let open_slots = self
            .availability_service
            .available_slots(request.doctor_id, request.date, exclude_appointment, auth_token)
            .await
            .map_err(|e| match e {
                DoctorError::NotFound => AppointmentError::DoctorOrPatientNotFound,
                DoctorError::DatabaseError(detail) => AppointmentError::DatabaseError(detail),
            })?;

        if !open_slots.contains(&request.time) {
            warn!(
                "Slot {} on {} rejected for doctor {} ({} slots open)",
                request.time,
                request.date,
                request.doctor_id,
                open_slots.len()
            );
            return Err(AppointmentError::SlotUnavailable {
                doctor_id: request.doctor_id,
                date: request.date,
                time: request.time,
            });
        }

        Ok(())
    }

    /// The store enforces uniqueness on (doctor_id, date, time). A conflict
    /// at commit time means another request won the slot between our
    /// availability check and the write, which is a booking outcome, not a
    /// system fault.
    fn classify_commit_error(
        &self,
        error: StoreError,
        request: &UpsertAppointmentRequest,
    ) -> AppointmentError {
        match error {
            StoreError::Conflict(detail) => {
                warn!(
                    "Concurrent booking for doctor {} at {} {}: {}",
                    request.doctor_id, request.date, request.time, detail
                );
                AppointmentError::SlotUnavailable {
                    doctor_id: request.doctor_id,
                    date: request.date,
                    time: request.time,
                }
            }
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }

    async fn get_clinic_appointment(
        &self,
        appointment_id: Uuid,
        clinic_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&clinic_id=eq.{}",
            appointment_id, clinic_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone()).map_err(|e| {
            AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e))
        })?;

        Ok(appointment)
    }
}
