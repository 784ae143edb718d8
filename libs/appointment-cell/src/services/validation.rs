use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use shared_models::error::FieldError;

use crate::models::{UpsertAppointmentPayload, UpsertAppointmentRequest};

/// Checks the shape of a raw upsert payload and produces the normalized,
/// strongly-typed request. All violations are accumulated so the caller can
/// correct every field in one round trip. Pure; no store access.
pub fn validate(
    payload: &UpsertAppointmentPayload,
) -> Result<UpsertAppointmentRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let patient_id = required_identifier(payload.patient_id.as_deref(), "patientId", &mut errors);
    let doctor_id = required_identifier(payload.doctor_id.as_deref(), "doctorId", &mut errors);

    let date = match payload.date.as_deref() {
        None => {
            errors.push(FieldError::new("date", "date is required"));
            None
        }
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.push(FieldError::new("date", "date must be a calendar date (YYYY-MM-DD)"));
                None
            }
        },
    };

    let time = match payload.time.as_deref() {
        None => {
            errors.push(FieldError::new("time", "time is required"));
            None
        }
        Some(raw) => match NaiveTime::parse_from_str(raw, "%H:%M") {
            Ok(time) => Some(time),
            Err(_) => {
                errors.push(FieldError::new("time", "time must be a slot start (HH:MM)"));
                None
            }
        },
    };

    if let Some(price) = payload.price_in_minor_units {
        if price < 1 {
            errors.push(FieldError::new(
                "priceInMinorUnits",
                "price must be a positive amount in minor units",
            ));
        }
    }

    let id = match payload.id.as_deref() {
        None => None,
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push(FieldError::new("id", "id must be a valid identifier"));
                None
            }
        },
    };

    match (patient_id, doctor_id, date, time) {
        (Some(patient_id), Some(doctor_id), Some(date), Some(time)) if errors.is_empty() => {
            Ok(UpsertAppointmentRequest {
                id,
                patient_id,
                doctor_id,
                date,
                time,
                price_in_minor_units: payload.price_in_minor_units,
            })
        }
        _ => Err(errors),
    }
}

fn required_identifier(
    raw: Option<&str>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Uuid> {
    match raw {
        None => {
            errors.push(FieldError::new(field, &format!("{} is required", field)));
            None
        }
        Some(value) => match Uuid::parse_str(value) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push(FieldError::new(
                    field,
                    &format!("{} must be a valid identifier", field),
                ));
                None
            }
        },
    }
}
