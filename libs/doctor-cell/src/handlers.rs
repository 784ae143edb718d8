// libs/doctor-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::DoctorError;
use crate::services::availability::AvailabilityService;

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: NaiveDate,
}

/// List the bookable slots for one of the clinic's doctors on a date.
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let service = AvailabilityService::new(&state);

    let slots = service
        .available_slots_for_clinic(user.clinic_id, doctor_id, query.date, token)
        .await
        .map_err(|e| match e {
            DoctorError::NotFound => AppError::NotFound("doctor not found".to_string()),
            DoctorError::DatabaseError(detail) => {
                tracing::error!("Slot query for doctor {} failed: {}", doctor_id, detail);
                AppError::Database("could not load available slots".to_string())
            }
        })?;

    let slots: Vec<String> = slots
        .iter()
        .map(|slot| slot.format("%H:%M").to_string())
        .collect();

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "slots": slots,
    })))
}
