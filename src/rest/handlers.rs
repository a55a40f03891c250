use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::{
    storage::{Store, StoreError},
    types::{
        normalize_password, normalize_text, random_job_no, token_to_job_no, Completion, MountType,
        Order, OrderDraft, OrderUpdate, Technician, ADMIN_LEVEL, CREATABLE_LEVELS,
    },
};

use super::{
    models::{
        ErrorResponse, HealthResponse, LoginRequest, MessageResponse, OrderEnvelope,
        OrderResponse, SetupRequest, TechnicianEnvelope, TechnicianRequest, TechnicianResponse,
    },
    AppState, Session, SessionSigner,
};

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
        .into_response()
}

fn unauthorized() -> Response {
    json_error(StatusCode::UNAUTHORIZED, "not signed in")
}

fn order_not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "order not found")
}

fn require_session<S: Store>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<Session, Response> {
    state
        .signer
        .session_from_headers(headers)
        .ok_or_else(unauthorized)
}

/// Retries random suffixes until the order collection has no match.
fn assign_job_no<S: Store>(store: &S) -> Result<String, StoreError> {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = random_job_no(&mut rng);
        if store.find_order(&candidate)?.is_none() {
            return Ok(candidate);
        }
    }
}

struct UploadedFile {
    file_name: String,
    data: Bytes,
}

/// A fully-read multipart form: text fields and files, in arrival order.
#[derive(Default)]
struct UploadForm {
    texts: Vec<(String, String)>,
    files: Vec<(String, UploadedFile)>,
}

impl UploadForm {
    fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
    }

    fn files<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a UploadedFile> {
        self.files
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, f)| f)
    }
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, Response> {
    let mut form = UploadForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                log::warn!("malformed multipart body: {}", err);
                return Err(json_error(StatusCode::BAD_REQUEST, "malformed upload"));
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(|f| f.to_string());
        match file_name {
            Some(file_name) => {
                let data = field.bytes().await.map_err(|err| {
                    log::warn!("failed reading upload field {}: {}", name, err);
                    json_error(StatusCode::BAD_REQUEST, "malformed upload")
                })?;
                form.files.push((name, UploadedFile { file_name, data }));
            }
            None => {
                let value = field.text().await.map_err(|err| {
                    log::warn!("failed reading form field {}: {}", name, err);
                    json_error(StatusCode::BAD_REQUEST, "malformed upload")
                })?;
                form.texts.push((name, value));
            }
        }
    }
    Ok(form)
}

/// Writes the invoice file and swaps it into the order document. The
/// file is rolled back when the document update fails.
fn attach_invoice<S: Store>(
    state: &AppState<S>,
    mut order: Order,
    file: &UploadedFile,
) -> Result<Order, Response> {
    let entry = state
        .files
        .store_invoice(&order.job_no, &file.file_name, &file.data)
        .map_err(|err| json_error(StatusCode::BAD_REQUEST, err.to_string()))?;

    let previous = order.invoice.replace(entry.clone());
    if let Err(err) = state.store.update_order(&order) {
        log::error!("failed to record invoice for {}: {:?}", order.job_no, err);
        state.files.delete_invoice(&entry.stored_name);
        return Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "invoice could not be saved",
        ));
    }
    if let Some(previous) = previous {
        state.files.delete_invoice(&previous.stored_name);
    }
    Ok(order)
}

pub async fn health<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            uptime_secs,
        }),
    )
}

pub async fn setup<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    payload: Option<Json<SetupRequest>>,
) -> Response {
    match state.store.count_admins() {
        Ok(0) => {}
        Ok(_) => return json_error(StatusCode::CONFLICT, "setup already completed"),
        Err(err) => {
            log::error!("failed to check admin count: {:?}", err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "setup unavailable");
        }
    }

    let req = payload.map(|Json(p)| p).unwrap_or_default();
    let name = normalize_text(req.name.as_deref().unwrap_or(""));
    let username = normalize_text(req.username.as_deref().unwrap_or(""));
    let password = normalize_password(req.password.as_deref().unwrap_or(""));
    if name.is_empty() || username.is_empty() || password.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "please fill in all fields");
    }

    let technician = Technician {
        name,
        username,
        password,
        level: ADMIN_LEVEL,
        created_at: Utc::now(),
    };
    match state.store.insert_technician(&technician) {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return json_error(StatusCode::CONFLICT, "username already registered")
        }
        Err(err) => {
            log::error!("failed to create initial admin: {:?}", err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "admin could not be saved");
        }
    }

    let session = Session {
        username: technician.username.clone(),
        name: technician.name.clone(),
        level: technician.level,
    };
    (
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, state.signer.cookie(&session))]),
        Json(TechnicianEnvelope {
            technician: TechnicianResponse {
                name: technician.name,
                username: technician.username,
                level: technician.level,
            },
            message: "admin created".to_string(),
        }),
    )
        .into_response()
}

pub async fn login<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let req = payload.map(|Json(p)| p).unwrap_or_default();
    let username = normalize_text(req.username.as_deref().unwrap_or(""));
    let password = normalize_password(req.password.as_deref().unwrap_or(""));

    let technician = if username.is_empty() {
        None
    } else {
        match state.store.find_technician(&username) {
            Ok(found) => found,
            Err(err) => {
                log::error!("failed to look up technician {}: {:?}", username, err);
                return json_error(StatusCode::INTERNAL_SERVER_ERROR, "sign-in unavailable");
            }
        }
    };

    match technician {
        Some(technician) if technician.password == password => {
            let session = Session {
                username: technician.username.clone(),
                name: technician.name.clone(),
                level: technician.level,
            };
            (
                StatusCode::OK,
                AppendHeaders([(header::SET_COOKIE, state.signer.cookie(&session))]),
                Json(TechnicianResponse {
                    name: technician.name,
                    username: technician.username,
                    level: technician.level,
                }),
            )
                .into_response()
        }
        _ => json_error(StatusCode::UNAUTHORIZED, "invalid username or password"),
    }
}

pub async fn logout<S: Store + Clone + Send + Sync + 'static>(
    State(_state): State<AppState<S>>,
) -> Response {
    (
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, SessionSigner::clear_cookie())]),
        Json(MessageResponse {
            message: "signed out".to_string(),
        }),
    )
        .into_response()
}

pub async fn list_orders<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    match state.store.list_orders() {
        Ok(orders) => {
            let out: Vec<OrderResponse> = orders.iter().map(OrderResponse::from_order).collect();
            Json(out).into_response()
        }
        Err(err) => {
            log::error!("failed to list orders: {:?}", err);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "records unavailable")
        }
    }
}

pub async fn open_installations<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    match state.store.list_open_installations() {
        Ok(orders) => {
            let out: Vec<OrderResponse> = orders.iter().map(OrderResponse::from_order).collect();
            Json(out).into_response()
        }
        Err(err) => {
            log::error!("failed to list open installations: {:?}", err);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "records unavailable")
        }
    }
}

pub async fn create_order<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    payload: Option<Json<OrderDraft>>,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let draft = payload.map(|Json(p)| p).unwrap_or_default();
    // the SMS greeting prefers the name and number as typed
    let raw_name = draft.name.clone().unwrap_or_default();
    let raw_phone = draft.phone.clone().unwrap_or_default();

    let job_no = match assign_job_no(&state.store) {
        Ok(job_no) => job_no,
        Err(err) => {
            log::error!("failed to assign job number: {:?}", err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "order could not be saved");
        }
    };
    let order = match draft.into_order(job_no, Utc::now()) {
        Ok(order) => order,
        Err(err) => return json_error(StatusCode::BAD_REQUEST, err.to_string()),
    };

    match state.store.insert_order(&order) {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "job number collided, please try again",
            )
        }
        Err(err) => {
            log::error!("failed to insert order {}: {:?}", order.job_no, err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "order could not be saved");
        }
    }

    let sms = state.sms.clone();
    let notified = order.clone();
    tokio::spawn(async move {
        sms.notify_new_order(&notified, &raw_name, &raw_phone).await;
    });

    (
        StatusCode::CREATED,
        Json(OrderEnvelope {
            order: OrderResponse::from_order(&order),
            message: None,
        }),
    )
        .into_response()
}

pub async fn update_order<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(job_no): Path<String>,
    headers: HeaderMap,
    payload: Option<Json<OrderUpdate>>,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let mut order = match state.store.find_order(&job_no) {
        Ok(Some(order)) => order,
        Ok(None) => return order_not_found(),
        Err(err) => {
            log::error!("failed to load order {}: {:?}", job_no, err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "record unavailable");
        }
    };

    let update = payload.map(|Json(p)| p).unwrap_or_default();
    if update.apply(&mut order) == 0 {
        return json_error(StatusCode::BAD_REQUEST, "no updatable fields");
    }

    if let Err(err) = state.store.update_order(&order) {
        log::error!("failed to update order {}: {:?}", job_no, err);
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, "update failed");
    }

    Json(OrderEnvelope {
        order: OrderResponse::from_order(&order),
        message: None,
    })
    .into_response()
}

pub async fn delete_order<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(job_no): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let order = match state.store.find_order(&job_no) {
        Ok(Some(order)) => order,
        Ok(None) => return order_not_found(),
        Err(err) => {
            log::error!("failed to load order {}: {:?}", job_no, err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "record unavailable");
        }
    };

    if let Some(invoice) = &order.invoice {
        state.files.delete_invoice(&invoice.stored_name);
    }
    for photo in &order.photos {
        state.files.delete_photo(&photo.stored_name);
    }

    if let Err(err) = state.store.delete_order(&job_no) {
        log::error!("failed to delete order {}: {:?}", job_no, err);
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, "record could not be deleted");
    }

    Json(MessageResponse {
        message: "record deleted".to_string(),
    })
    .into_response()
}

pub async fn upload_invoice<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(job_no): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let order = match state.store.find_order(&job_no) {
        Ok(Some(order)) => order,
        Ok(None) => return order_not_found(),
        Err(err) => {
            log::error!("failed to load order {}: {:?}", job_no, err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "record unavailable");
        }
    };

    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let Some(file) = form.file("invoice") else {
        return json_error(StatusCode::BAD_REQUEST, "invoice file missing");
    };

    match attach_invoice(&state, order, file) {
        Ok(order) => (
            StatusCode::CREATED,
            Json(OrderEnvelope {
                order: OrderResponse::from_order(&order),
                message: Some("invoice uploaded".to_string()),
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}

pub async fn complete_order<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(job_no): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let mut order = match state.store.find_order(&job_no) {
        Ok(Some(order)) => order,
        Ok(None) => return order_not_found(),
        Err(err) => {
            log::error!("failed to load order {}: {:?}", job_no, err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "record unavailable");
        }
    };

    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let mount_type = match MountType::parse(form.text("mount_type").unwrap_or("")) {
        Ok(mount_type) => mount_type,
        Err(err) => return json_error(StatusCode::BAD_REQUEST, err.to_string()),
    };
    let note = form.text("note").unwrap_or("").trim().to_string();

    let mut saved = Vec::new();
    for file in form.files("photos") {
        // browser file inputs submit an empty part when nothing is chosen
        if file.file_name.trim().is_empty() {
            continue;
        }
        match state
            .files
            .store_photo(&job_no, &file.file_name, &file.data)
        {
            Ok(entry) => saved.push(entry),
            Err(err) => {
                for entry in &saved {
                    state.files.delete_photo(&entry.stored_name);
                }
                return json_error(StatusCode::BAD_REQUEST, err.to_string());
            }
        }
    }
    if saved.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "please upload at least one photo");
    }

    order.photos.extend(saved);
    order.completed = true;
    order.completion = Some(Completion {
        mount_type,
        note,
        photo_count: order.photos.len(),
        completed_at: Utc::now(),
    });

    if let Err(err) = state.store.update_order(&order) {
        log::error!("failed to close installation {}: {:?}", job_no, err);
        return json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "installation could not be closed",
        );
    }

    Json(OrderEnvelope {
        order: OrderResponse::from_order(&order),
        message: None,
    })
    .into_response()
}

pub async fn download_photos<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(job_no): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let order = match state.store.find_order(&job_no) {
        Ok(Some(order)) => order,
        Ok(None) => return order_not_found(),
        Err(err) => {
            log::error!("failed to load order {}: {:?}", job_no, err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "record unavailable");
        }
    };

    let photos: Vec<_> = order
        .photos
        .iter()
        .filter(|photo| !photo.stored_name.is_empty())
        .cloned()
        .collect();
    if photos.is_empty() {
        return json_error(StatusCode::NOT_FOUND, "no saved photos");
    }

    let archive = match state.files.zip_photos(&photos) {
        Ok(archive) => archive,
        Err(err) => {
            log::error!("failed to pack photos for {}: {:?}", job_no, err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "photos unavailable");
        }
    };

    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{job_no}-PHOTOS.zip\""),
            ),
        ],
        archive,
    )
        .into_response()
}

pub async fn create_technician<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    payload: Option<Json<TechnicianRequest>>,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let req = payload.map(|Json(p)| p).unwrap_or_default();
    let name = normalize_text(req.name.as_deref().unwrap_or(""));
    let username = normalize_text(req.username.as_deref().unwrap_or(""));
    let password = normalize_password(req.password.as_deref().unwrap_or(""));
    if name.is_empty() || username.is_empty() || password.is_empty() || req.level.is_none() {
        return json_error(StatusCode::BAD_REQUEST, "missing fields");
    }

    let level = match req.parsed_level() {
        Some(level) if CREATABLE_LEVELS.contains(&level) => level,
        _ => return json_error(StatusCode::BAD_REQUEST, "invalid level"),
    };

    let technician = Technician {
        name,
        username,
        password,
        level,
        created_at: Utc::now(),
    };
    match state.store.insert_technician(&technician) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(TechnicianEnvelope {
                technician: TechnicianResponse {
                    name: technician.name,
                    username: technician.username,
                    level: technician.level,
                },
                message: "technician created".to_string(),
            }),
        )
            .into_response(),
        Err(StoreError::Conflict(_)) => {
            json_error(StatusCode::CONFLICT, "username already registered")
        }
        Err(err) => {
            log::error!("failed to create technician: {:?}", err);
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "technician could not be saved",
            )
        }
    }
}

pub async fn serve_invoice<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let Some(path) = state.files.invoice_path(&name) else {
        return json_error(StatusCode::NOT_FOUND, "file not found");
    };
    match tokio::fs::read(&path).await {
        Ok(data) => (
            [
                (
                    header::CONTENT_TYPE,
                    "application/octet-stream".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{name}\""),
                ),
            ],
            data,
        )
            .into_response(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            json_error(StatusCode::NOT_FOUND, "file not found")
        }
        Err(err) => {
            log::error!("failed to read invoice {}: {}", name, err);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "file unavailable")
        }
    }
}

pub async fn serve_photo<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_session(&state, &headers) {
        return response;
    }
    let Some(path) = state.files.photo_path(&name) else {
        return json_error(StatusCode::NOT_FOUND, "file not found");
    };
    match tokio::fs::read(&path).await {
        Ok(data) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], data).into_response()
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            json_error(StatusCode::NOT_FOUND, "file not found")
        }
        Err(err) => {
            log::error!("failed to read photo {}: {}", name, err);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "file unavailable")
        }
    }
}

pub async fn public_order_summary<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
) -> Response {
    let Some(job_no) = token_to_job_no(&token) else {
        return json_error(StatusCode::BAD_REQUEST, "invalid link");
    };
    match state.store.find_order(&job_no) {
        Ok(Some(order)) => Json(OrderEnvelope {
            order: OrderResponse::from_order(&order),
            message: None,
        })
        .into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "record not found"),
        Err(err) => {
            log::error!("failed to resolve token {}: {:?}", token, err);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "record unavailable")
        }
    }
}

pub async fn public_upload_invoice<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(token): Path<String>,
    multipart: Multipart,
) -> Response {
    let Some(job_no) = token_to_job_no(&token) else {
        return json_error(StatusCode::BAD_REQUEST, "invalid link");
    };
    let order = match state.store.find_order(&job_no) {
        Ok(Some(order)) => order,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "record not found"),
        Err(err) => {
            log::error!("failed to resolve token {}: {:?}", token, err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "record unavailable");
        }
    };

    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let Some(file) = form.file("invoice") else {
        return json_error(StatusCode::BAD_REQUEST, "invoice file missing");
    };

    match attach_invoice(&state, order, file) {
        Ok(order) => (
            StatusCode::CREATED,
            Json(OrderEnvelope {
                order: OrderResponse::from_order(&order),
                message: Some("invoice received, thank you".to_string()),
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// Dealer intake: same order document, but the priority is fixed, the
/// service has a default and the invoice must arrive with the form.
pub async fn dealer_create_order<S: Store + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    multipart: Multipart,
) -> Response {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let Some(invoice) = form.file("invoice") else {
        return json_error(StatusCode::BAD_REQUEST, "invoice file is required");
    };

    let service = form
        .text("service")
        .map(normalize_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "TV INSTALL".to_string());
    let draft = OrderDraft {
        priority: Some("MEDIUM".to_string()),
        name: form.text("name").map(str::to_string),
        model: form.text("model").map(str::to_string),
        phone: form.text("phone").map(str::to_string),
        service: Some(service),
        reference: None,
        address: form.text("address").map(str::to_string),
        note: form.text("note").map(str::to_string),
    };

    let job_no = match assign_job_no(&state.store) {
        Ok(job_no) => job_no,
        Err(err) => {
            log::error!("failed to assign job number: {:?}", err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "order could not be saved");
        }
    };
    let order = match draft.into_order(job_no, Utc::now()) {
        Ok(order) => order,
        Err(err) => return json_error(StatusCode::BAD_REQUEST, err.to_string()),
    };

    match state.store.insert_order(&order) {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "job number collided, please try again",
            )
        }
        Err(err) => {
            log::error!("failed to insert dealer order {}: {:?}", order.job_no, err);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "order could not be saved");
        }
    }

    match attach_invoice(&state, order, invoice) {
        Ok(order) => Json(OrderEnvelope {
            order: OrderResponse::from_order(&order),
            message: None,
        })
        .into_response(),
        Err(response) => response,
    }
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "endpoint not found".to_string(),
        }),
    )
}
