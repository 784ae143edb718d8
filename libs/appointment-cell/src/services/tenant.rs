use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use doctor_cell::models::Doctor;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentError, Patient};

/// Confirms that the doctor and patient named by a request both exist and
/// both belong to the caller's clinic, and loads them for later use (price
/// defaulting needs the doctor row). Read-only.
pub struct TenantGuard {
    supabase: SupabaseClient,
}

impl TenantGuard {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// "Does not exist" and "owned by another clinic" collapse into one
    /// failure, so a caller cannot learn which records other tenants hold.
    pub async fn load_doctor_and_patient(
        &self,
        clinic_id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<(Doctor, Patient), AppointmentError> {
        debug!(
            "Checking clinic {} ownership of doctor {} and patient {}",
            clinic_id, doctor_id, patient_id
        );

        let doctor: Option<Doctor> = self
            .find_clinic_row("doctors", doctor_id, clinic_id, auth_token)
            .await?;
        let patient: Option<Patient> = self
            .find_clinic_row("patients", patient_id, clinic_id, auth_token)
            .await?;

        match (doctor, patient) {
            (Some(doctor), Some(patient)) => Ok((doctor, patient)),
            (doctor, patient) => {
                warn!(
                    "Tenant check failed for clinic {} (doctor found: {}, patient found: {})",
                    clinic_id,
                    doctor.is_some(),
                    patient.is_some()
                );
                Err(AppointmentError::DoctorOrPatientNotFound)
            }
        }
    }

    async fn find_clinic_row<T>(
        &self,
        table: &str,
        id: Uuid,
        clinic_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<T>, AppointmentError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}?id=eq.{}&clinic_id=eq.{}", table, id, clinic_id);

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Ok(None);
        };

        let record: T = serde_json::from_value(row).map_err(|e| {
            AppointmentError::DatabaseError(format!("Failed to parse {} row: {}", table, e))
        })?;

        Ok(Some(record))
    }
}
