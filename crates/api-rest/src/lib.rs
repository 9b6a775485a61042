//! # CareBook REST API
//!
//! HTTP surface for the CareBook intake and appointment flows.
//!
//! Handles:
//! - wire DTOs and their translation to domain payloads
//! - driving each form session (validate → submit → map the outcome)
//! - the admin passkey gate, checked at exactly one boundary
//! - OpenAPI/Swagger documentation and CORS
//!
//! Uses `carebook-core` for all behaviour; nothing in this crate talks to a
//! collaborator directly.

pub mod dto;

use axum::{
    extract::{Path as AxumPath, Query as AxumQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use carebook_core::{
    intake, AppConfig, AppointmentMode, AppointmentService, AppointmentTransition, CoreError,
    Gender, NewAppointment, NewUser, PatientDirectory, PatientRegistration,
};
use carebook_forms::{BeginSubmit, FileUpload, RenderedField, SubmitOutcome};
use carebook_types::{EmailAddress, PhoneNumber};
use dto::{
    AppointmentRes, BoardRes, CreateAppointmentReq, CreateUserReq, DocumentUploadReq, ErrorRes,
    HealthRes, PatientRes, RegisterPatientReq, TransitionRes, UpdateAppointmentReq, UserRes,
    ValidationRes,
};

/// Header carrying the admin passkey.
pub const ADMIN_PASSKEY_HEADER: &str = "x-admin-passkey";

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<AppConfig>,
    pub directory: Arc<PatientDirectory>,
    pub appointments: Arc<AppointmentService>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_user,
        get_user,
        register_patient,
        get_patient,
        create_appointment,
        get_appointment,
        update_appointment,
        list_appointments,
        user_form,
        registration_form,
        appointment_form,
    ),
    components(schemas(
        HealthRes,
        ValidationRes,
        ErrorRes,
        CreateUserReq,
        UserRes,
        DocumentUploadReq,
        RegisterPatientReq,
        PatientRes,
        CreateAppointmentReq,
        UpdateAppointmentReq,
        AppointmentRes,
        TransitionRes,
        BoardRes,
    ))
)]
struct ApiDoc;

/// Builds the CareBook router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", post(create_user))
        .route("/users/:id", get(get_user))
        .route("/patients", post(register_patient))
        .route("/patients/:user_id", get(get_patient))
        .route("/appointments", post(create_appointment))
        .route("/appointments", get(list_appointments))
        .route("/appointments/:id", get(get_appointment))
        .route("/appointments/:id", patch(update_appointment))
        .route("/forms/user", get(user_form))
        .route("/forms/register", get(registration_form))
        .route("/forms/appointment", get(appointment_form))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Error mapping
// ============================================================================

/// API-level failure, reduced from core errors at the boundary. Internal
/// failure detail is logged here and never exposed in the response body.
#[derive(Debug)]
pub enum ApiError {
    Validation(BTreeMap<String, String>),
    BadRequest(String),
    Unauthorized,
    NotFound,
    Conflict(String),
    Internal,
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(_) => ApiError::NotFound,
            CoreError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            CoreError::InvalidInput(message) => ApiError::BadRequest(message),
            other => {
                tracing::error!("request failed: {other}");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationRes { errors }),
            )
                .into_response(),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorRes { message })).into_response()
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorRes {
                    message: "Invalid passkey".to_owned(),
                }),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorRes {
                    message: "Not found".to_owned(),
                }),
            )
                .into_response(),
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(ErrorRes { message })).into_response()
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes {
                    message: "Something went wrong, please try again.".to_owned(),
                }),
            )
                .into_response(),
        }
    }
}

/// The single comparison boundary for the admin gate.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let provided = headers
        .get(ADMIN_PASSKEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if state.cfg.is_admin_passkey(provided) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::BadRequest(format!("{field} must be an RFC 3339 timestamp")))
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "CareBook API is alive".to_owned(),
    })
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserReq,
    responses(
        (status = 200, description = "User created or reused", body = UserRes),
        (status = 422, description = "Validation failed", body = ValidationRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// First intake step: create a user identity.
///
/// A duplicate email is recovered by reusing the existing identity, so this
/// endpoint never surfaces a conflict.
#[axum::debug_handler]
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserReq>,
) -> Result<Json<UserRes>, ApiError> {
    let mut session = intake::user_session();
    session.set_value("name", req.name);
    session.set_value("email", req.email);
    session.set_value("phone", req.phone);

    let directory = state.directory.clone();
    let outcome = session
        .submit(Utc::now(), |payload| async move {
            let new = NewUser {
                name: payload.text("name").unwrap_or_default().to_owned(),
                email: EmailAddress::new(payload.text("email").unwrap_or_default())
                    .map_err(|err| CoreError::InvalidInput(err.to_string()))?,
                phone: PhoneNumber::new(payload.text("phone").unwrap_or_default())
                    .map_err(|err| CoreError::InvalidInput(err.to_string()))?,
            };
            directory.create_user(new).await
        })
        .await;

    match outcome {
        SubmitOutcome::Completed(user) => Ok(Json(user.into())),
        SubmitOutcome::Rejected => Err(ApiError::Validation(session.state().errors().clone())),
        SubmitOutcome::Suppressed | SubmitOutcome::Failed => Err(ApiError::Internal),
    }
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    responses(
        (status = 200, description = "User found", body = UserRes),
        (status = 404, description = "Unknown user", body = ErrorRes)
    )
)]
/// Fetch one user identity.
#[axum::debug_handler]
async fn get_user(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<UserRes>, ApiError> {
    let user = state.directory.user(&id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = RegisterPatientReq,
    responses(
        (status = 200, description = "Patient registered", body = PatientRes),
        (status = 400, description = "Malformed request", body = ErrorRes),
        (status = 422, description = "Validation failed", body = ValidationRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Register a patient profile for an existing user.
///
/// The identification document travels base64-encoded and is stored before
/// the profile is written; omitting it is a valid path.
#[axum::debug_handler]
async fn register_patient(
    State(state): State<AppState>,
    Json(req): Json<RegisterPatientReq>,
) -> Result<Json<PatientRes>, ApiError> {
    let upload = match req.identification_document {
        Some(doc) => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(doc.data_base64.as_bytes())
                .map_err(|_| {
                    ApiError::BadRequest(
                        "identification_document.data_base64 is not valid base64".to_owned(),
                    )
                })?;
            Some(FileUpload::new(doc.file_name, bytes))
        }
        None => None,
    };
    let birth_date = parse_timestamp(&req.birth_date, "birth_date")?;

    let mut session = intake::registration_session();
    session.set_value("name", req.name);
    session.set_value("email", req.email);
    session.set_value("phone", req.phone);
    session.set_value("birth_date", birth_date);
    session.set_value("gender", req.gender);
    session.set_value("address", req.address);
    session.set_value("occupation", req.occupation);
    session.set_value("emergency_contact_name", req.emergency_contact_name);
    session.set_value("emergency_contact_number", req.emergency_contact_number);
    session.set_value("primary_physician", req.primary_physician);
    session.set_value("insurance_provider", req.insurance_provider);
    session.set_value("insurance_policy_number", req.insurance_policy_number);
    for (name, value) in [
        ("allergies", req.allergies),
        ("current_medications", req.current_medications),
        ("family_medical_history", req.family_medical_history),
        ("past_medical_history", req.past_medical_history),
        ("identification_type", req.identification_type),
        ("identification_number", req.identification_number),
    ] {
        if let Some(value) = value {
            session.set_value(name, value);
        }
    }
    if let Some(upload) = upload {
        session.set_value("identification_document", vec![upload]);
    }
    session.set_value("treatment_consent", req.treatment_consent);
    session.set_value("disclosure_consent", req.disclosure_consent);
    session.set_value("privacy_consent", req.privacy_consent);

    let directory = state.directory.clone();
    let user_id = req.user_id;
    let outcome = session
        .submit(Utc::now(), |payload| async move {
            let registration = PatientRegistration {
                user_id,
                name: payload.text("name").unwrap_or_default().to_owned(),
                email: EmailAddress::new(payload.text("email").unwrap_or_default())
                    .map_err(|err| CoreError::InvalidInput(err.to_string()))?,
                phone: PhoneNumber::new(payload.text("phone").unwrap_or_default())
                    .map_err(|err| CoreError::InvalidInput(err.to_string()))?,
                birth_date: payload
                    .datetime("birth_date")
                    .ok_or_else(|| CoreError::InvalidInput("birth_date is required".to_owned()))?,
                gender: Gender::parse(payload.text("gender").unwrap_or_default())
                    .ok_or_else(|| CoreError::InvalidInput("invalid gender".to_owned()))?,
                address: payload.text("address").unwrap_or_default().to_owned(),
                occupation: payload.text("occupation").unwrap_or_default().to_owned(),
                emergency_contact_name: payload
                    .text("emergency_contact_name")
                    .unwrap_or_default()
                    .to_owned(),
                emergency_contact_number: PhoneNumber::new(
                    payload.text("emergency_contact_number").unwrap_or_default(),
                )
                .map_err(|err| CoreError::InvalidInput(err.to_string()))?,
                primary_physician: payload
                    .text("primary_physician")
                    .unwrap_or_default()
                    .to_owned(),
                insurance_provider: payload
                    .text("insurance_provider")
                    .unwrap_or_default()
                    .to_owned(),
                insurance_policy_number: payload
                    .text("insurance_policy_number")
                    .unwrap_or_default()
                    .to_owned(),
                allergies: payload.text("allergies").map(str::to_owned),
                current_medications: payload.text("current_medications").map(str::to_owned),
                family_medical_history: payload.text("family_medical_history").map(str::to_owned),
                past_medical_history: payload.text("past_medical_history").map(str::to_owned),
                identification_type: payload.text("identification_type").map(str::to_owned),
                identification_number: payload.text("identification_number").map(str::to_owned),
                identification_document: payload
                    .files("identification_document")
                    .and_then(|files| files.first().cloned()),
                treatment_consent: payload.flag("treatment_consent").unwrap_or(false),
                disclosure_consent: payload.flag("disclosure_consent").unwrap_or(false),
                privacy_consent: payload.flag("privacy_consent").unwrap_or(false),
            };
            directory.register_patient(registration).await
        })
        .await;

    match outcome {
        SubmitOutcome::Completed(profile) => Ok(Json(profile.into())),
        SubmitOutcome::Rejected => Err(ApiError::Validation(session.state().errors().clone())),
        SubmitOutcome::Suppressed | SubmitOutcome::Failed => Err(ApiError::Internal),
    }
}

#[utoipa::path(
    get,
    path = "/patients/{user_id}",
    responses(
        (status = 200, description = "Patient profile found", body = PatientRes),
        (status = 404, description = "No profile for this user", body = ErrorRes)
    )
)]
/// Fetch the registered profile for a user.
#[axum::debug_handler]
async fn get_patient(
    State(state): State<AppState>,
    AxumPath(user_id): AxumPath<String>,
) -> Result<Json<PatientRes>, ApiError> {
    let profile = state
        .directory
        .patient_for_user(&user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    post,
    path = "/appointments",
    request_body = CreateAppointmentReq,
    responses(
        (status = 200, description = "Appointment requested", body = AppointmentRes),
        (status = 400, description = "Malformed request", body = ErrorRes),
        (status = 422, description = "Validation failed", body = ValidationRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Request a new appointment. Always lands as `pending`.
#[axum::debug_handler]
async fn create_appointment(
    State(state): State<AppState>,
    Json(req): Json<CreateAppointmentReq>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let schedule = parse_timestamp(&req.schedule, "schedule")?;
    let now = Utc::now();

    let mut session = intake::appointment_session(AppointmentMode::Create, None, now);
    session.set_value("primary_physician", req.primary_physician);
    session.set_value("schedule", schedule);
    session.set_value("reason", req.reason);
    if let Some(note) = req.note {
        session.set_value("note", note);
    }

    let appointments = state.appointments.clone();
    let (user_id, patient_id) = (req.user_id, req.patient_id);
    let outcome = session
        .submit(now, |payload| async move {
            let new = NewAppointment {
                user_id,
                patient_id,
                primary_physician: payload
                    .text("primary_physician")
                    .unwrap_or_default()
                    .to_owned(),
                schedule: payload
                    .datetime("schedule")
                    .ok_or_else(|| CoreError::InvalidInput("schedule is required".to_owned()))?,
                reason: payload.text("reason").unwrap_or_default().to_owned(),
                note: payload.text("note").map(str::to_owned),
            };
            appointments.create_appointment(new).await
        })
        .await;

    match outcome {
        SubmitOutcome::Completed(record) => Ok(Json(record.into())),
        SubmitOutcome::Rejected => Err(ApiError::Validation(session.state().errors().clone())),
        SubmitOutcome::Suppressed | SubmitOutcome::Failed => Err(ApiError::Internal),
    }
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    responses(
        (status = 200, description = "Appointment found", body = AppointmentRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes)
    )
)]
/// Fetch one appointment, as on the confirmation page.
#[axum::debug_handler]
async fn get_appointment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<AppointmentRes>, ApiError> {
    let record = state.appointments.appointment(&id).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    patch,
    path = "/appointments/{id}",
    request_body = UpdateAppointmentReq,
    responses(
        (status = 200, description = "Transition committed", body = TransitionRes),
        (status = 401, description = "Missing or invalid passkey", body = ErrorRes),
        (status = 404, description = "Unknown appointment", body = ErrorRes),
        (status = 409, description = "Transition not allowed", body = ErrorRes),
        (status = 422, description = "Validation failed", body = ValidationRes)
    )
)]
/// Operator action: schedule or cancel an appointment.
///
/// The form session is prefilled from the current record, so an operator can
/// confirm without retyping; provided fields override the prefill.
#[axum::debug_handler]
async fn update_appointment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateAppointmentReq>,
) -> Result<Json<TransitionRes>, ApiError> {
    require_admin(&state, &headers)?;

    let mode = match req.mode.as_str() {
        "schedule" => AppointmentMode::Schedule,
        "cancel" => AppointmentMode::Cancel,
        _ => {
            return Err(ApiError::BadRequest(
                "mode must be \"schedule\" or \"cancel\"".to_owned(),
            ))
        }
    };

    let existing = state.appointments.appointment(&id).await?;
    let now = Utc::now();
    let mut session = intake::appointment_session(mode, Some(&existing), now);
    if let Some(physician) = req.primary_physician {
        session.set_value("primary_physician", physician);
    }
    if let Some(schedule) = req.schedule {
        session.set_value("schedule", parse_timestamp(&schedule, "schedule")?);
    }
    if let Some(reason) = req.cancellation_reason {
        session.set_value("cancellation_reason", reason);
    }

    let payload = match session.begin_submit(now) {
        BeginSubmit::Valid(payload) => payload,
        BeginSubmit::Invalid => {
            return Err(ApiError::Validation(session.state().errors().clone()))
        }
        BeginSubmit::Suppressed => return Err(ApiError::Internal),
    };

    let transition = AppointmentTransition {
        appointment_id: id,
        user_id: req.user_id,
        mode,
        primary_physician: payload.text("primary_physician").map(str::to_owned),
        schedule: payload.datetime("schedule"),
        cancellation_reason: payload.text("cancellation_reason").map(str::to_owned),
    };
    let result = state.appointments.update_appointment(transition).await;
    session.finish_submit();

    let outcome = result?;
    Ok(Json(TransitionRes {
        appointment: outcome.appointment.into(),
        notification_delivered: outcome.notification_delivered,
    }))
}

#[utoipa::path(
    get,
    path = "/appointments",
    responses(
        (status = 200, description = "Recent appointments with counts", body = BoardRes),
        (status = 401, description = "Missing or invalid passkey", body = ErrorRes)
    )
)]
/// Admin dashboard: recent appointments, newest first, with summary counts.
#[axum::debug_handler]
async fn list_appointments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BoardRes>, ApiError> {
    require_admin(&state, &headers)?;

    let board = state.appointments.recent_appointments().await?;
    state.appointments.admin_view().take_stale();
    Ok(Json(BoardRes::new(board.counts, board.appointments)))
}

#[derive(Debug, Deserialize)]
struct AppointmentFormQuery {
    mode: Option<AppointmentMode>,
    appointment_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/forms/user",
    responses(
        (status = 200, description = "Rendered controls for the intake form")
    )
)]
/// Rendered controls for the first intake step.
#[axum::debug_handler]
async fn user_form(State(_state): State<AppState>) -> Json<Vec<RenderedField>> {
    Json(intake::user_session().render())
}

#[utoipa::path(
    get,
    path = "/forms/register",
    responses(
        (status = 200, description = "Rendered controls for the registration form")
    )
)]
/// Rendered controls for the registration form.
#[axum::debug_handler]
async fn registration_form(State(_state): State<AppState>) -> Json<Vec<RenderedField>> {
    Json(intake::registration_session().render())
}

#[utoipa::path(
    get,
    path = "/forms/appointment",
    responses(
        (status = 200, description = "Rendered controls for the appointment form"),
        (status = 404, description = "Unknown appointment", body = ErrorRes)
    )
)]
/// Rendered controls for an appointment form.
///
/// `mode` defaults to `create`; passing `appointment_id` prefills the form
/// from that record, as the operator modals do.
#[axum::debug_handler]
async fn appointment_form(
    State(state): State<AppState>,
    AxumQuery(query): AxumQuery<AppointmentFormQuery>,
) -> Result<Json<Vec<RenderedField>>, ApiError> {
    let mode = query.mode.unwrap_or(AppointmentMode::Create);
    let existing = match &query.appointment_id {
        Some(id) => Some(state.appointments.appointment(id).await?),
        None => None,
    };
    let session = intake::appointment_session(mode, existing.as_ref(), Utc::now());
    Ok(Json(session.render()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use carebook_store::{LogSender, MemoryFileStore, MemoryStore};

    fn state(passkey: Option<&str>) -> AppState {
        let cfg = Arc::new(
            AppConfig::new(
                "CareBook",
                passkey.map(str::to_owned),
                "https://files.carebook.example",
            )
            .expect("config"),
        );
        let store = Arc::new(MemoryStore::new().with_unique_key("users", "email"));
        let files = Arc::new(MemoryFileStore::new(cfg.storage_endpoint()));
        AppState {
            directory: Arc::new(PatientDirectory::new(store.clone(), files)),
            appointments: Arc::new(AppointmentService::new(
                store,
                Arc::new(LogSender::new()),
                cfg.clinic_name(),
            )),
            cfg,
        }
    }

    #[test]
    fn admin_gate_requires_the_configured_passkey() {
        let state = state(Some("123456"));

        let mut headers = HeaderMap::new();
        assert!(require_admin(&state, &headers).is_err());

        headers.insert(ADMIN_PASSKEY_HEADER, "654321".parse().unwrap());
        assert!(require_admin(&state, &headers).is_err());

        headers.insert(ADMIN_PASSKEY_HEADER, "123456".parse().unwrap());
        assert!(require_admin(&state, &headers).is_ok());
    }

    #[test]
    fn admin_gate_stays_locked_without_a_passkey() {
        let state = state(None);
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_PASSKEY_HEADER, "anything".parse().unwrap());
        assert!(require_admin(&state, &headers).is_err());
    }

    #[test]
    fn router_builds() {
        let _router = router(state(Some("123456")));
    }

    #[test]
    fn timestamps_must_be_rfc3339() {
        assert!(parse_timestamp("2026-03-14T10:30:00Z", "schedule").is_ok());
        assert!(parse_timestamp("tomorrow", "schedule").is_err());
    }
}
