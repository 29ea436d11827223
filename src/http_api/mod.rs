use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router, async_trait,
    extract::{FromRequest, Path, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::export::{self, DEFAULT_EXPORT_FILE, ExportError};
use crate::person::{NewPeople, Person, PersonDirectory, PersonId, PersonUpdate};
use crate::persistence::{PersistenceError, RosterStore};
use crate::record::{ScheduleDraft, ScheduleKey, ScheduleRecord, deserialize_role_list};
use crate::record_validation::{self, ValidationError};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RosterStore>,
    export_file_name: Arc<str>,
}

impl AppState {
    pub fn new<S>(store: S) -> Self
    where
        S: RosterStore + 'static,
    {
        Self::with_shared(Arc::new(store))
    }

    pub fn with_shared(store: Arc<dyn RosterStore>) -> Self {
        Self {
            store,
            export_file_name: Arc::from(DEFAULT_EXPORT_FILE),
        }
    }

    pub fn export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = Arc::from(name.into());
        self
    }

    /// Runs a store call on the blocking pool; SQLite access holds a lock and
    /// does file I/O, so it stays off the async workers.
    async fn with_store<T, F>(&self, job: F) -> Result<T, ApiError>
    where
        F: FnOnce(&dyn RosterStore) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || job(store.as_ref()))
            .await
            .map_err(|err| ApiError::Internal(format!("store task failed: {err}")))?
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug, Serialize)]
struct DataBody<T> {
    data: T,
}

fn data<T: Serialize>(value: T) -> Json<DataBody<T>> {
    Json(DataBody { data: value })
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::Validation(err) => ApiError::Invalid(err.to_string()),
            PersistenceError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            PersistenceError::Conflict(message) => ApiError::Conflict(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(value: ExportError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                tracing::error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

/// `Json` whose rejections come back as 400 `invalid_request` rather than
/// axum's 415/422.
struct ApiJson<T>(T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Invalid(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Debug, Deserialize)]
struct CreatePeoplePayload {
    #[serde(default)]
    names: Option<Vec<String>>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SchedulePayload {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    section: Option<String>,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    wl: Vec<PersonId>,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    singer: Vec<PersonId>,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    musik: Vec<PersonId>,
    #[serde(default, deserialize_with = "deserialize_role_list")]
    tari: Vec<PersonId>,
}

impl SchedulePayload {
    fn into_draft(self) -> Result<ScheduleDraft, ValidationError> {
        let date = record_validation::require_date(self.date.as_deref())?;
        let section = record_validation::require_section(self.section.as_deref())?;
        Ok(ScheduleDraft {
            date,
            section,
            wl: self.wl,
            singer: self.singer,
            musik: self.musik,
            tari: self.tari,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeleteSchedulePayload {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    section: Option<String>,
}

impl DeleteSchedulePayload {
    fn into_key(self) -> Result<ScheduleKey, ValidationError> {
        let date = record_validation::require_date(self.date.as_deref())?;
        let section = self
            .section
            .as_deref()
            .map(str::trim)
            .filter(|section| !section.is_empty())
            .ok_or(ValidationError::MissingField("section"))?;
        Ok(ScheduleKey::new(date, section))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/people", get(list_people).post(create_people))
        .route("/people/:id", put(update_person).delete(delete_person))
        .route(
            "/schedules",
            get(list_schedules)
                .post(upsert_schedule)
                .delete(delete_schedule),
        )
        .route("/export", get(export_workbook))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "roster HTTP API listening");
    axum::serve(listener, app).await
}

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let (people, schedules) = state
        .with_store(|store| Ok((store.all_people()?.len(), store.list_schedules()?.len())))
        .await?;
    Ok(Json(json!({
        "status": "ok",
        "people": people,
        "schedules": schedules,
    })))
}

async fn list_people(
    State(state): State<AppState>,
) -> Result<Json<DataBody<Vec<Person>>>, ApiError> {
    let people = state.with_store(|store| Ok(store.list_people()?)).await?;
    Ok(data(people))
}

async fn create_people(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePeoplePayload>,
) -> Result<(StatusCode, Json<DataBody<Vec<Person>>>), ApiError> {
    let names = payload
        .names
        .or_else(|| payload.name.map(|name| vec![name]))
        .unwrap_or_default();
    let batch = NewPeople::from_names(names).ok_or(ValidationError::NoNames)?;
    let created = state
        .with_store(move |store| Ok(store.create_people(&batch)?))
        .await?;
    Ok((StatusCode::CREATED, data(created)))
}

async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<PersonUpdate>,
) -> Result<Json<DataBody<Person>>, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::invalid("missing id"));
    }
    let id = PersonId::new(id);
    let updated = state
        .with_store(move |store| Ok(store.update_person(&id, &update)?))
        .await?;
    Ok(data(updated))
}

async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = PersonId::new(id.trim());
    state
        .with_store(move |store| Ok(store.delete_person(&id)?))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_schedules(
    State(state): State<AppState>,
) -> Result<Json<DataBody<Vec<ScheduleRecord>>>, ApiError> {
    let records = state.with_store(|store| Ok(store.list_schedules()?)).await?;
    Ok(data(records))
}

async fn upsert_schedule(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SchedulePayload>,
) -> Result<Json<DataBody<ScheduleRecord>>, ApiError> {
    let draft = payload.into_draft()?;
    let saved = state
        .with_store(move |store| Ok(store.upsert_schedule(&draft)?))
        .await?;
    Ok(data(saved))
}

async fn delete_schedule(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<DeleteSchedulePayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let key = payload.into_key()?;
    let removed = state
        .with_store(move |store| Ok(store.delete_schedule(&key)?))
        .await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}

async fn export_workbook(State(state): State<AppState>) -> Result<Response, ApiError> {
    let bytes = state
        .with_store(|store| {
            let people = PersonDirectory::new(store.all_people()?);
            let records = store.list_schedules()?;
            Ok(export::export_workbook(&records, &people)?)
        })
        .await?;
    let disposition = format!("attachment; filename=\"{}\"", state.export_file_name);
    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, bytes).into_response())
}
