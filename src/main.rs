use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::extract::multipart::Multipart;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::post, Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use gunluk_rapor::report::safe_date;
use gunluk_rapor::{build_report, parse_report_text, FontPaths, ReportError};

/// Service configuration, read once from the environment at startup.
#[derive(Clone)]
struct Config {
    fonts: FontPaths,
    logo_path: Option<PathBuf>,
    output_dir: PathBuf,
}

impl Config {
    fn from_env() -> Config {
        let font_dir = PathBuf::from(
            std::env::var("RAPOR_FONT_DIR").unwrap_or_else(|_| "fonts".to_string()),
        );
        Config {
            fonts: FontPaths {
                regular: font_dir.join("DejaVuSans.ttf"),
                bold: font_dir.join("DejaVuSans-Bold.ttf"),
            },
            logo_path: std::env::var("RAPOR_LOGO").ok().map(PathBuf::from),
            output_dir: PathBuf::from(
                std::env::var("RAPOR_OUTPUT_DIR").unwrap_or_else(|_| "generated_pdfs".to_string()),
            ),
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Config::from_env();
    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        log::error!("cannot create output dir {}: {e}", config.output_dir.display());
        std::process::exit(1);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/generate-report", post(generate_report))
        .layer(cors)
        // Eight photos straight off a phone camera add up fast.
        .layer(DefaultBodyLimit::max(64 * 1024 * 1024))
        .with_state(config);

    let addr: SocketAddr = std::env::var("RAPOR_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3001".to_string())
        .parse()
        .unwrap_or_else(|e| {
            log::error!("bad RAPOR_ADDR: {e}");
            std::process::exit(1);
        });
    log::info!("report engine listening on http://{addr}");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("server failed: {e}");
        std::process::exit(1);
    }
}

/// One grid page's worth of photos; extra photo parts are dropped.
const MAX_PHOTOS: usize = 8;

/// Drain the multipart form: one `report_text` field plus photo parts
/// in grid order, staged into `staging_dir` as they arrive. Photo
/// parts beyond `MAX_PHOTOS` are ignored with a warning.
async fn read_report_form(
    mut multipart: Multipart,
    staging_dir: &Path,
) -> Result<(String, Vec<PathBuf>), ApiError> {
    let mut report_text = String::new();
    let mut photo_paths: Vec<PathBuf> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "report_text" {
            report_text = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("unreadable report_text: {e}")))?;
        } else if name.starts_with("photo") {
            if photo_paths.len() >= MAX_PHOTOS {
                log::warn!("photo limit of {MAX_PHOTOS} reached, ignoring part {name}");
                continue;
            }
            let original = field.file_name().unwrap_or("photo.jpg").to_string();
            let ext = Path::new(&original)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("jpg");
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("unreadable photo part: {e}")))?;
            let path = staging_dir.join(format!("photo-{}.{ext}", photo_paths.len() + 1));
            tokio::fs::write(&path, &data)
                .await
                .map_err(|e| ApiError::internal(e.to_string()))?;
            photo_paths.push(path);
        }
    }

    Ok((report_text, photo_paths))
}

/// Multipart form: one `report_text` field with the pasted form, plus
/// up to eight photo parts in grid order. Photos are staged in a temp
/// dir that lives until the build finishes.
async fn generate_report(
    State(config): State<Config>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let staging = tempfile::tempdir().map_err(|e| ApiError::internal(e.to_string()))?;
    let (report_text, photo_paths) = read_report_form(multipart, staging.path()).await?;

    if report_text.trim().is_empty() {
        return Err(ApiError::bad_request("report_text field is required".to_string()));
    }

    let record = parse_report_text(&report_text);
    let file_name = format!(
        "rapor-{}-{}.pdf",
        safe_date(&record.date),
        &uuid::Uuid::new_v4().simple().to_string()[..8]
    );
    let output_path = config.output_dir.join(&file_name);

    // The composer is pure blocking CPU and file IO.
    let build_output = output_path.clone();
    let fonts = config.fonts.clone();
    let logo = config.logo_path.clone();
    tokio::task::spawn_blocking(move || {
        build_report(
            &record,
            &photo_paths,
            &build_output,
            logo.as_deref(),
            &fonts,
        )
    })
    .await
    .map_err(|e| ApiError::internal(format!("build task panicked: {e}")))?
    .map_err(ApiError::from)?;

    let pdf_bytes = tokio::fs::read(&output_path)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok((
        [
            ("Content-Type", "application/pdf".to_string()),
            (
                "Content-Disposition",
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        pdf_bytes,
    ))
}

/// JSON error envelope for the HTTP surface.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> ApiError {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn internal(message: String) -> ApiError {
        log::error!("{message}");
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> ApiError {
        ApiError::internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn staged_photo_count(
        State(dir): State<PathBuf>,
        multipart: Multipart,
    ) -> Result<String, ApiError> {
        let (_, photos) = read_report_form(multipart, &dir).await?;
        Ok(photos.len().to_string())
    }

    fn form_body(photo_parts: usize) -> String {
        let mut body = String::from(
            "--X\r\nContent-Disposition: form-data; name=\"report_text\"\r\n\r\nRAPOR NO\n5\r\n",
        );
        for i in 0..photo_parts {
            body.push_str(&format!(
                "--X\r\nContent-Disposition: form-data; name=\"photo{i}\"; filename=\"p{i}.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nnot-a-real-jpeg\r\n"
            ));
        }
        body.push_str("--X--\r\n");
        body
    }

    async fn count_for(photo_parts: usize) -> String {
        let staging = tempfile::tempdir().unwrap();
        let app = Router::new()
            .route("/", post(staged_photo_count))
            .with_state(staging.path().to_path_buf());

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "multipart/form-data; boundary=X")
            .body(Body::from(form_body(photo_parts)))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn photo_parts_within_the_cap_are_all_staged() {
        assert_eq!(count_for(3).await, "3");
    }

    #[tokio::test]
    async fn photo_parts_beyond_the_cap_are_dropped() {
        assert_eq!(count_for(12).await, "8");
    }
}
