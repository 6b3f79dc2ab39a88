use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc as StdArc;
use tower_http::cors::{Any, CorsLayer};

use crate::constants::MAX_UPLOAD_BYTES;
use crate::recognition::{Identity, Recognizer};
use crate::schedule::{normalize_guest_name, today_key, tomorrow_key, Slot};
use crate::store::{BookingOutcome, MeetingBook};
use crate::videos::{RangeSpec, VideoArchive};

// State shared by all kiosk handlers
pub struct AppState {
    pub book: MeetingBook,
    pub archive: VideoArchive,
    pub recognizer: Recognizer,
}

/// Run the kiosk HTTP server
pub fn serve_kiosk(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    println!("Starting reception kiosk server");
    println!("Schedule store: {}", state.book.path().display());
    println!("Video directory: {}", state.archive.dir().display());
    println!("Listening on: http://[::]:{} (IPv4 + IPv6)", port);
    println!("Endpoints:");
    println!("  GET  /health  - Health check");
    println!("  POST /recognize  - Identify a camera frame (base64 image)");
    println!("  GET  /admin  - Admin snapshot: today/tomorrow slots and video list");
    println!("  POST /schedule  - Book the next free slot today");
    println!("  POST /schedule_tomorrow  - Book the next free slot on a given date");
    println!("  POST /cancel_meeting  - Free a booked slot");
    println!("  POST /record_video  - Upload a guest recording (multipart)");
    println!("  POST /delete_video  - Delete a recording");
    println!("  GET  /videos/:filename  - Stream a recording (Range-aware)");

    // Create tokio runtime and run server
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let app_state = StdArc::new(state);

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/recognize", post(recognize_handler))
            .route("/admin", get(admin_handler))
            .route("/schedule", post(schedule_handler))
            .route("/schedule_tomorrow", post(schedule_tomorrow_handler))
            .route("/cancel_meeting", post(cancel_meeting_handler))
            .route("/record_video", post(record_video_handler))
            .route("/delete_video", post(delete_video_handler))
            .route("/videos/{filename}", get(video_handler))
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
            .layer(cors)
            .with_state(app_state);

        let listener = tokio::net::TcpListener::bind(format!("[::]:{}", port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", port, e))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

// Health check endpoint - returns 200 OK if server is running
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[derive(Deserialize)]
struct RecognizeRequest {
    image: String,
}

async fn recognize_handler(
    State(state): State<StdArc<AppState>>,
    Json(req): Json<RecognizeRequest>,
) -> impl IntoResponse {
    // The browser sends a data URL; the base64 body follows the last comma.
    // A bare base64 string is accepted as-is.
    let encoded = req.image.rsplit(',').next().unwrap_or(&req.image);
    let frame = match base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        encoded.trim(),
    ) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Undecodable recognize payload: {}", e);
            return (StatusCode::BAD_REQUEST, Json(Identity::guest())).into_response();
        }
    };

    Json(state.recognizer.identify(&frame)).into_response()
}

#[derive(Serialize)]
struct AdminSnapshot {
    name: String,
    today: String,
    slots_today: Vec<Slot>,
    slots_tomorrow: Vec<Slot>,
    videos: Vec<String>,
}

async fn admin_handler(
    State(state): State<StdArc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let name = params
        .get("name")
        .cloned()
        .unwrap_or_else(|| "Admin".to_string());
    let today = today_key();
    let tomorrow = tomorrow_key();

    let slots_today = match state.book.slots_for(&today) {
        Ok(slots) => slots,
        Err(e) => {
            error!("Failed to load schedule for {}: {}", today, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Store error: {}", e))
                .into_response();
        }
    };
    let slots_tomorrow = match state.book.slots_for(&tomorrow) {
        Ok(slots) => slots,
        Err(e) => {
            error!("Failed to load schedule for {}: {}", tomorrow, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Store error: {}", e))
                .into_response();
        }
    };

    Json(AdminSnapshot {
        name,
        today,
        slots_today,
        slots_tomorrow,
        videos: state.archive.list(),
    })
    .into_response()
}

#[derive(Deserialize)]
struct ScheduleRequest {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct ScheduleDateRequest {
    date: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize)]
struct BookingResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tomorrow: Option<String>,
}

impl BookingResponse {
    fn booked(time: String, date: String) -> Self {
        Self {
            success: true,
            time: Some(time),
            date: Some(date),
            tomorrow: None,
        }
    }

    fn full(tomorrow: Option<String>) -> Self {
        Self {
            success: false,
            time: None,
            date: None,
            tomorrow,
        }
    }
}

async fn schedule_handler(
    State(state): State<StdArc<AppState>>,
    Json(req): Json<ScheduleRequest>,
) -> impl IntoResponse {
    let guest = normalize_guest_name(req.name.as_deref());
    let today = today_key();

    match state.book.book_next_available(&today, &guest) {
        Ok(BookingOutcome::Booked { time }) => {
            Json(BookingResponse::booked(time, today)).into_response()
        }
        Ok(BookingOutcome::Full) => {
            // Today is exhausted; offer tomorrow as the fallback date
            Json(BookingResponse::full(Some(tomorrow_key()))).into_response()
        }
        Err(e) => {
            error!("Booking failed for {}: {}", today, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BookingResponse::full(None)),
            )
                .into_response()
        }
    }
}

async fn schedule_tomorrow_handler(
    State(state): State<StdArc<AppState>>,
    Json(req): Json<ScheduleDateRequest>,
) -> impl IntoResponse {
    let guest = normalize_guest_name(req.name.as_deref());

    match state.book.book_next_available(&req.date, &guest) {
        Ok(BookingOutcome::Booked { time }) => {
            Json(BookingResponse::booked(time, req.date)).into_response()
        }
        Ok(BookingOutcome::Full) => Json(BookingResponse::full(None)).into_response(),
        Err(e) => {
            error!("Booking failed for {}: {}", req.date, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BookingResponse::full(None)),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct CancelRequest {
    date: String,
    index: usize,
}

#[derive(Serialize)]
struct StatusResponse {
    success: bool,
}

async fn cancel_meeting_handler(
    State(state): State<StdArc<AppState>>,
    Json(req): Json<CancelRequest>,
) -> impl IntoResponse {
    match state.book.cancel(&req.date, req.index) {
        Ok(true) => Json(StatusResponse { success: true }).into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(StatusResponse { success: false }),
        )
            .into_response(),
        Err(e) => {
            error!("Cancel failed for {} slot {}: {}", req.date, req.index, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse { success: false }),
            )
                .into_response()
        }
    }
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl UploadResponse {
    fn failure(error: &str) -> Self {
        Self {
            success: false,
            filename: None,
            error: Some(error.to_string()),
        }
    }
}

async fn record_video_handler(
    State(state): State<StdArc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut video: Option<Vec<u8>> = None;
    let mut guest_name = String::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload body: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(UploadResponse::failure("Malformed multipart body")),
                )
                    .into_response();
            }
        };

        let field_name = field.name().map(|name| name.to_string());
        match field_name.as_deref() {
            Some("video") => match field.bytes().await {
                Ok(bytes) => video = Some(bytes.to_vec()),
                Err(e) => {
                    warn!("Failed to read video part: {}", e);
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(UploadResponse::failure("Unreadable video part")),
                    )
                        .into_response();
                }
            },
            Some("name") => guest_name = field.text().await.unwrap_or_default(),
            _ => {}
        }
    }

    let data = match video {
        Some(data) if !data.is_empty() => data,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(UploadResponse::failure("No video")),
            )
                .into_response()
        }
    };

    let guest = normalize_guest_name(Some(&guest_name));
    match state.archive.store(&guest, &data) {
        Ok(filename) => Json(UploadResponse {
            success: true,
            filename: Some(filename),
            error: None,
        })
        .into_response(),
        Err(e) => {
            error!("Failed to store recording: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UploadResponse::failure("Storage failure")),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct DeleteVideoRequest {
    #[serde(default)]
    filename: Option<String>,
}

async fn delete_video_handler(
    State(state): State<StdArc<AppState>>,
    Json(req): Json<DeleteVideoRequest>,
) -> impl IntoResponse {
    let filename = match req.filename.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(StatusResponse { success: false }),
            )
                .into_response()
        }
    };

    match state.archive.delete(filename) {
        Ok(true) => Json(StatusResponse { success: true }).into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(StatusResponse { success: false }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to delete video {}: {}", filename, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse { success: false }),
            )
                .into_response()
        }
    }
}

async fn video_handler(
    State(state): State<StdArc<AppState>>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // Missing files 404 before any range parsing
    let size = match state.archive.size_of(&filename) {
        Some(size) => size,
        None => return (StatusCode::NOT_FOUND, "Video not found").into_response(),
    };

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    match RangeSpec::parse(range_header, size) {
        RangeSpec::Full => {
            let data = match state.archive.read_all(&filename) {
                Ok(data) => data,
                Err(e) => {
                    error!("Failed to read video {}: {}", filename, e);
                    return (StatusCode::INTERNAL_SERVER_ERROR, "Read failure").into_response();
                }
            };
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static("video/mp4")),
                    (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
                    (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
                    (
                        header::CONTENT_LENGTH,
                        HeaderValue::from_str(&size.to_string()).unwrap(),
                    ),
                ],
                data,
            )
                .into_response()
        }
        RangeSpec::Satisfiable { start, end } => {
            let data = match state.archive.read_range(&filename, start, end) {
                Ok(data) => data,
                Err(e) => {
                    error!(
                        "Failed to read range {}-{} of video {}: {}",
                        start, end, filename, e
                    );
                    return (StatusCode::INTERNAL_SERVER_ERROR, "Read failure").into_response();
                }
            };
            (
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static("video/mp4")),
                    (
                        header::CONTENT_RANGE,
                        HeaderValue::from_str(&format!("bytes {}-{}/{}", start, end, size))
                            .unwrap(),
                    ),
                    (
                        header::CONTENT_LENGTH,
                        HeaderValue::from_str(&(end - start + 1).to_string()).unwrap(),
                    ),
                    (header::ACCEPT_RANGES, HeaderValue::from_static("bytes")),
                    (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
                ],
                data,
            )
                .into_response()
        }
        RangeSpec::Unsatisfiable => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(
                header::CONTENT_RANGE,
                HeaderValue::from_str(&format!("bytes */{}", size)).unwrap(),
            )],
            "Requested range not satisfiable",
        )
            .into_response(),
        RangeSpec::Malformed => {
            (StatusCode::BAD_REQUEST, "Malformed Range header").into_response()
        }
    }
}
