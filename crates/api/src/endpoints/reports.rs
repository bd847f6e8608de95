//! Report endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use civicreport_common::{AppError, AppResult};
use civicreport_core::{
    CreateReportInput, FilterOptions, Pagination, ReportFilter, ReportStatus, ReportView,
    SortKey, SortOrder, Submitter, UpdateStatusInput,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{middleware::AppState, response::ApiResponse};

/// Create report router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_report))
        .route("/search", get(search_reports))
        .route("/filters", get(filter_options))
        .route("/user/{user_id}", get(user_reports))
        .route("/{id}", get(get_report))
        .route("/{id}", delete(delete_report))
        .route("/{id}/status", put(update_status))
        .route("/{id}/image", post(attach_image))
        .route("/{id}/image", delete(clear_image))
}

/// Create report request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub title: String,
    pub description: String,
    pub address: String,
    pub category_id: i32,
    /// Already-stored image reference, if any.
    #[serde(default)]
    pub image: Option<String>,
    /// Submitting user; absent for anonymous reports.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

/// Create report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportResponse {
    pub success: bool,
    pub report_id: i32,
    pub message: String,
}

async fn create_report(
    State(state): State<AppState>,
    Json(request): Json<CreateReportRequest>,
) -> AppResult<Response> {
    request.validate()?;

    let submitter = match request.user_id {
        Some(user_id) => Submitter::Registered { user_id },
        None => Submitter::Anonymous {
            contact_email: request.contact_email,
            contact_phone: request.contact_phone,
        },
    };

    let created = state
        .report_service
        .create_report(CreateReportInput {
            title: request.title,
            description: request.description,
            address: request.address,
            category_id: request.category_id,
            image: request.image,
            submitter,
        })
        .await?;

    let body = CreateReportResponse {
        success: true,
        report_id: created.id,
        message: "Report created successfully".to_string(),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<ReportView>> {
    let report = state.report_service.get_report_view(id).await?;
    Ok(ApiResponse::ok(report))
}

async fn user_reports(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<ReportView>>> {
    let reports = state.report_service.list_for_user(&user_id).await?;
    Ok(ApiResponse::ok(reports))
}

async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<()>> {
    state.report_service.delete_report(id).await?;
    Ok(ApiResponse::<()>::message("Report deleted successfully"))
}

/// A status in a request body, by name or numeric value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StatusParam {
    Number(i32),
    Name(String),
}

impl StatusParam {
    fn resolve(&self) -> Option<ReportStatus> {
        match self {
            Self::Number(value) => status_from_number(*value),
            Self::Name(name) => parse_status(name),
        }
    }
}

/// Update status request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: StatusParam,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStatusRequest>,
) -> Response {
    let Some(status) = request.status.resolve() else {
        return AppError::Validation("Unknown report status".to_string()).into_response();
    };

    let result = state
        .report_service
        .update_status(
            id,
            UpdateStatusInput {
                status,
                admin_notes: request.admin_notes,
            },
        )
        .await;

    match result {
        Ok(_) => ApiResponse::<()>::message("Report status updated successfully").into_response(),
        Err(AppError::ReportNotFound(_)) => {
            ApiResponse::<()>::failure(StatusCode::NOT_FOUND, "Report not found")
        }
        Err(err @ AppError::Database(_)) => {
            tracing::error!(report_id = id, error = %err, "Failed to update report status");
            // The caller sees driver detail only in verbose deployments.
            let verbose = state.config.server.verbose_errors;
            ApiResponse::<()>::failure(StatusCode::BAD_REQUEST, err.public_message(verbose))
        }
        Err(err) => err.into_response(),
    }
}

/// Attach image request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachImageRequest {
    pub path: String,
}

/// Image update response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub success: bool,
    pub message: String,
    pub image_path: Option<String>,
}

async fn attach_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AttachImageRequest>,
) -> AppResult<Json<ImageResponse>> {
    let report = state.report_service.attach_image(id, request.path).await?;
    Ok(Json(ImageResponse {
        success: true,
        message: "Image uploaded successfully".to_string(),
        image_path: report.image,
    }))
}

async fn clear_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<()>> {
    state.report_service.clear_image(id).await?;
    Ok(ApiResponse::<()>::message("Image deleted successfully"))
}

/// Search query parameters.
///
/// Pagination, status, and date values are parsed leniently: anything
/// malformed falls back to its default instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub from_date: Option<String>,
    #[serde(default)]
    pub to_date: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub has_image: Option<bool>,
    #[serde(default)]
    pub is_anonymous: Option<bool>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub page_size: Option<String>,
}

/// Echo of the filters a search actually applied.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub keyword: Option<String>,
    pub category_id: Option<i32>,
    pub status: Option<ReportStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub has_image: Option<bool>,
    pub is_anonymous: Option<bool>,
    pub sort_by: &'static str,
    pub sort_order: &'static str,
}

/// Search response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub data: Vec<ReportView>,
    pub pagination: Pagination,
    pub filters: AppliedFilters,
}

async fn search_reports(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    let filter = ReportFilter {
        keyword: query.keyword,
        category_id: query.category_id,
        status: query.status.as_deref().and_then(parse_status),
        from_date: query.from_date.as_deref().and_then(parse_date),
        to_date: query.to_date.as_deref().and_then(parse_date),
        address: query.address,
        has_image: query.has_image,
        is_anonymous: query.is_anonymous,
    };

    let sort_key = SortKey::parse(query.sort_by.as_deref().unwrap_or_default());
    let sort_order = SortOrder::parse(query.sort_order.as_deref().unwrap_or_default());
    let page = parse_number(query.page.as_deref(), 1);
    let page_size = parse_number(query.page_size.as_deref(), 20);

    let result = state
        .report_service
        .search(&filter, sort_key, sort_order, page, page_size)
        .await?;

    Ok(Json(SearchResponse {
        success: true,
        data: result.items,
        pagination: result.pagination,
        filters: AppliedFilters {
            keyword: filter.keyword,
            category_id: filter.category_id,
            status: filter.status,
            from_date: filter.from_date,
            to_date: filter.to_date,
            address: filter.address,
            has_image: filter.has_image,
            is_anonymous: filter.is_anonymous,
            sort_by: sort_key.name(),
            sort_order: sort_order.name(),
        },
    }))
}

async fn filter_options(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<FilterOptions>> {
    let options = state.report_service.filter_options().await?;
    Ok(ApiResponse::ok(options))
}

fn status_from_number(value: i32) -> Option<ReportStatus> {
    match value {
        1 => Some(ReportStatus::Submitted),
        2 => Some(ReportStatus::InReview),
        3 => Some(ReportStatus::InProgress),
        4 => Some(ReportStatus::Resolved),
        5 => Some(ReportStatus::Closed),
        _ => None,
    }
}

/// Parse a status by name (case-insensitive, underscores ignored) or number.
fn parse_status(raw: &str) -> Option<ReportStatus> {
    if let Ok(value) = raw.parse::<i32>() {
        return status_from_number(value);
    }
    match raw.to_ascii_lowercase().replace('_', "").as_str() {
        "submitted" => Some(ReportStatus::Submitted),
        "inreview" => Some(ReportStatus::InReview),
        "inprogress" => Some(ReportStatus::InProgress),
        "resolved" => Some(ReportStatus::Resolved),
        "closed" => Some(ReportStatus::Closed),
        _ => None,
    }
}

/// Parse an RFC 3339 timestamp or a plain date (taken at midnight UTC).
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    raw.parse::<NaiveDate>()
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

fn parse_number(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|value| value.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_names_and_numbers() {
        assert_eq!(parse_status("resolved"), Some(ReportStatus::Resolved));
        assert_eq!(parse_status("IN_REVIEW"), Some(ReportStatus::InReview));
        assert_eq!(parse_status("inProgress"), Some(ReportStatus::InProgress));
        assert_eq!(parse_status("4"), Some(ReportStatus::Resolved));
        assert_eq!(parse_status("99"), None);
        assert_eq!(parse_status("bogus"), None);
    }

    #[test]
    fn dates_parse_timestamps_and_plain_dates() {
        assert_eq!(
            parse_date("2025-09-01"),
            Some("2025-09-01T00:00:00Z".parse().unwrap())
        );
        assert_eq!(
            parse_date("2025-09-01T10:30:00+02:00"),
            Some("2025-09-01T08:30:00Z".parse().unwrap())
        );
        assert_eq!(parse_date("last tuesday"), None);
    }

    #[test]
    fn malformed_page_numbers_fall_back() {
        assert_eq!(parse_number(Some("3"), 1), 3);
        assert_eq!(parse_number(Some("abc"), 1), 1);
        assert_eq!(parse_number(None, 20), 20);
    }
}
