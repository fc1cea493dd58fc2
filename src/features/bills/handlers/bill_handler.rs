use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::bills::dtos::{
    BillResponseDto, CreateBillForm, DeleteBillResponseDto, DescribeBillsResponseDto,
    UploadBillDto, UploadedFile,
};
use crate::features::bills::services::{BillService, SpendingSummary};
use crate::shared::types::ApiResponse;

/// Message returned when there is nothing to analyze
pub const NO_BILLS_MESSAGE: &str = "No bills found.";

/// Confirmation returned after a successful delete
pub const BILL_DELETED_MESSAGE: &str = "Bill and associated files deleted successfully";

async fn read_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read {} field: {}", name, e)))
}

/// Create a bill
///
/// Accepts multipart/form-data with:
/// - `name`, `category`, `amount` (required)
/// - `note`, `date` (optional; date defaults to today)
/// - `files`: zero or more attachments
#[utoipa::path(
    post,
    path = "/api/bills/add",
    tag = "bills",
    request_body(
        content = UploadBillDto,
        content_type = "multipart/form-data",
        description = "Bill fields with any number of `files` parts",
    ),
    responses(
        (status = 201, description = "Bill created", body = BillResponseDto),
        (status = 400, description = "Missing or invalid field"),
        (status = 413, description = "Request body too large"),
        (status = 502, description = "Attachment upload failed")
    )
)]
pub async fn create_bill(
    State(service): State<Arc<BillService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<BillResponseDto>), AppError> {
    let mut form = CreateBillForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "name" => form.name = Some(read_text(field, "name").await?),
            "category" => form.category = Some(read_text(field, "category").await?),
            "amount" => form.amount = Some(read_text(field, "amount").await?),
            "note" => form.note = Some(read_text(field, "note").await?),
            "date" => form.date = Some(read_text(field, "date").await?),
            "files" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let file_name = field.file_name().unwrap_or("").to_string();

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                // Browsers send an empty, unnamed part when no file was picked
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }

                form.files.push(UploadedFile {
                    file_name: if file_name.is_empty() {
                        "unnamed".to_string()
                    } else {
                        file_name
                    },
                    content_type,
                    data: data.to_vec(),
                });
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let bill = service.create_bill(form).await?;

    Ok((StatusCode::CREATED, Json(bill.into())))
}

/// List all bills, most recent first
#[utoipa::path(
    get,
    path = "/api/bills",
    tag = "bills",
    responses(
        (status = 200, description = "All bills", body = Vec<BillResponseDto>)
    )
)]
pub async fn list_bills(
    State(service): State<Arc<BillService>>,
) -> Result<Json<Vec<BillResponseDto>>, AppError> {
    let bills = service.list_bills().await?;

    Ok(Json(bills.into_iter().map(Into::into).collect()))
}

/// Delete a bill and its stored files
#[utoipa::path(
    delete,
    path = "/api/bills/{id}",
    tag = "bills",
    params(
        ("id" = String, Path, description = "Bill id")
    ),
    responses(
        (status = 200, description = "Bill deleted", body = ApiResponse<DeleteBillResponseDto>),
        (status = 404, description = "Bill not found"),
        (status = 502, description = "Stored files could not be removed; bill kept")
    )
)]
pub async fn delete_bill(
    State(service): State<Arc<BillService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteBillResponseDto>>, AppError> {
    // A malformed id cannot name any bill
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::NotFound(format!("Bill {} not found", id)))?;

    let deleted_attachments = service.delete_bill(id).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteBillResponseDto {
            id,
            deleted_attachments,
        }),
        Some(BILL_DELETED_MESSAGE.to_string()),
    )))
}

/// Generate a spending analysis of all bills
///
/// The analysis text is returned in `message`.
#[utoipa::path(
    get,
    path = "/api/bills/describe",
    tag = "bills",
    responses(
        (status = 200, description = "Analysis text, or \"No bills found.\"", body = ApiResponse<DescribeBillsResponseDto>),
        (status = 502, description = "Insight generation failed")
    )
)]
pub async fn describe_bills(
    State(service): State<Arc<BillService>>,
) -> Result<Json<ApiResponse<DescribeBillsResponseDto>>, AppError> {
    let (message, bill_count) = match service.describe_bills().await? {
        SpendingSummary::NoData => (NO_BILLS_MESSAGE.to_string(), 0),
        SpendingSummary::Generated { text, bill_count } => (text, bill_count),
    };

    Ok(Json(ApiResponse::success(
        Some(DescribeBillsResponseDto { bill_count }),
        Some(message),
    )))
}
