use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::DoctorError;
use doctor_cell::services::availability::AvailabilityService;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn service_for(mock_server: &MockServer) -> AvailabilityService {
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    AvailabilityService::new(&config)
}

fn time(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M").unwrap()
}

// 2025-06-02 is a Monday (day_of_week = 1)
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

async fn mount_working_hours(
    mock_server: &MockServer,
    doctor_id: Uuid,
    day_of_week: i16,
    rows: Vec<serde_json::Value>,
) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_working_hours"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("day_of_week", format!("eq.{}", day_of_week)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(rows)))
        .mount(mock_server)
        .await;
}

async fn mount_day_appointments(
    mock_server: &MockServer,
    doctor_id: Uuid,
    date: NaiveDate,
    rows: Vec<serde_json::Value>,
) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", format!("eq.{}", date)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(rows)))
        .mount(mock_server)
        .await;
}

#[test]
fn test_slot_grid_start_inclusive_end_exclusive() {
    let grid = AvailabilityService::slot_grid(time("08:00"), time("12:00"));
    assert_eq!(
        grid,
        vec![time("08:00"), time("09:00"), time("10:00"), time("11:00")]
    );
}

#[test]
fn test_slot_grid_keeps_window_alignment() {
    let grid = AvailabilityService::slot_grid(time("08:30"), time("11:00"));
    assert_eq!(grid, vec![time("08:30"), time("09:30"), time("10:30")]);
}

#[test]
fn test_slot_grid_empty_window() {
    assert!(AvailabilityService::slot_grid(time("09:00"), time("09:00")).is_empty());
}

#[test]
fn test_slot_grid_stops_at_midnight() {
    let grid = AvailabilityService::slot_grid(time("23:00"), NaiveTime::from_hms_opt(23, 59, 59).unwrap());
    assert_eq!(grid, vec![time("23:00")]);
}

#[test]
fn test_day_of_week_uses_sunday_zero() {
    // 2025-06-01 is a Sunday
    assert_eq!(
        AvailabilityService::day_of_week(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
        0
    );
    assert_eq!(AvailabilityService::day_of_week(monday()), 1);
}

#[tokio::test]
async fn test_available_slots_full_open_day() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    mount_working_hours(
        &mock_server,
        doctor_id,
        1,
        vec![MockStoreResponses::working_hours_row(doctor_id, 1, "08:00:00", "12:00:00")],
    )
    .await;
    mount_day_appointments(&mock_server, doctor_id, monday(), vec![]).await;

    let service = service_for(&mock_server);
    let slots = service
        .available_slots(doctor_id, monday(), None, "test-token")
        .await
        .expect("slot query should succeed");

    assert_eq!(
        slots,
        vec![time("08:00"), time("09:00"), time("10:00"), time("11:00")]
    );
}

#[tokio::test]
async fn test_available_slots_removes_booked_times() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let clinic_id = Uuid::new_v4();

    mount_working_hours(
        &mock_server,
        doctor_id,
        1,
        vec![MockStoreResponses::working_hours_row(doctor_id, 1, "08:00:00", "12:00:00")],
    )
    .await;
    mount_day_appointments(
        &mock_server,
        doctor_id,
        monday(),
        vec![MockStoreResponses::appointment_row(
            Uuid::new_v4(),
            clinic_id,
            Uuid::new_v4(),
            doctor_id,
            "2025-06-02",
            "09:00:00",
            15000,
        )],
    )
    .await;

    let service = service_for(&mock_server);
    let slots = service
        .available_slots(doctor_id, monday(), None, "test-token")
        .await
        .expect("slot query should succeed");

    assert_eq!(slots, vec![time("08:00"), time("10:00"), time("11:00")]);
}

#[tokio::test]
async fn test_available_slots_empty_on_non_working_day() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    mount_working_hours(&mock_server, doctor_id, 1, vec![]).await;
    mount_day_appointments(&mock_server, doctor_id, monday(), vec![]).await;

    let service = service_for(&mock_server);
    let slots = service
        .available_slots(doctor_id, monday(), None, "test-token")
        .await
        .expect("slot query should succeed");

    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_available_slots_read_is_idempotent() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let clinic_id = Uuid::new_v4();

    mount_working_hours(
        &mock_server,
        doctor_id,
        1,
        vec![MockStoreResponses::working_hours_row(doctor_id, 1, "08:00:00", "12:00:00")],
    )
    .await;
    mount_day_appointments(
        &mock_server,
        doctor_id,
        monday(),
        vec![MockStoreResponses::appointment_row(
            Uuid::new_v4(),
            clinic_id,
            Uuid::new_v4(),
            doctor_id,
            "2025-06-02",
            "10:00:00",
            15000,
        )],
    )
    .await;

    let service = service_for(&mock_server);
    let first = service
        .available_slots(doctor_id, monday(), None, "test-token")
        .await
        .expect("first read should succeed");
    let second = service
        .available_slots(doctor_id, monday(), None, "test-token")
        .await
        .expect("second read should succeed");

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_excluded_appointment_does_not_occupy_its_slot() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let moving_id = Uuid::new_v4();

    mount_working_hours(
        &mock_server,
        doctor_id,
        1,
        vec![MockStoreResponses::working_hours_row(doctor_id, 1, "08:00:00", "12:00:00")],
    )
    .await;

    // The store applies the id=neq filter, so the moving appointment's own
    // row is absent from the occupancy result.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", format!("eq.{}", monday())))
        .and(query_param("id", format!("neq.{}", moving_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let slots = service
        .available_slots(doctor_id, monday(), Some(moving_id), "test-token")
        .await
        .expect("slot query should succeed");

    assert!(slots.contains(&time("09:00")));
}

#[tokio::test]
async fn test_clinic_scoped_query_rejects_foreign_doctor() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let clinic_id = Uuid::new_v4();

    // Clinic-filtered lookup finds nothing, whether the doctor is missing
    // or owned by another clinic.
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .and(query_param("clinic_id", format!("eq.{}", clinic_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server);
    let result = service
        .available_slots_for_clinic(clinic_id, doctor_id, monday(), "test-token")
        .await;

    assert_matches!(result, Err(DoctorError::NotFound));
}
