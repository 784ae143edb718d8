// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AppointmentError, UpsertAppointmentPayload};
use crate::services::upsert::AppointmentUpsertService;

/// Create a new appointment, or update an existing one when the payload
/// carries an id. The caller's clinic comes from the validated token and is
/// the tenant scope for every lookup the service performs.
#[axum::debug_handler]
pub async fn upsert_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpsertAppointmentPayload>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = AppointmentUpsertService::new(&state);

    let appointment = service
        .upsert(user.clinic_id, payload, token)
        .await
        .map_err(|e| match e {
            AppointmentError::Validation(fields) => AppError::Validation(fields),
            AppointmentError::DoctorOrPatientNotFound => {
                AppError::NotFound("doctor or patient not found".to_string())
            }
            AppointmentError::SlotUnavailable { doctor_id, date, time } => AppError::Conflict(format!(
                "slot {} on {} is not available for doctor {}",
                time.format("%H:%M"),
                date,
                doctor_id
            )),
            AppointmentError::NotFound => AppError::NotFound("appointment not found".to_string()),
            AppointmentError::DatabaseError(detail) => {
                // Store details stay in the logs; the caller gets an opaque failure
                tracing::error!("Appointment upsert failed: {}", detail);
                AppError::Database("appointment could not be saved".to_string())
            }
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
    })))
}
