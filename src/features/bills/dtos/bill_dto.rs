use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::core::error::AppError;
use crate::features::bills::models::{Attachment, Bill};

/// Raw fields and files of a `POST /api/bills/add` multipart body
#[derive(Debug, Default)]
pub struct CreateBillForm {
    pub name: Option<String>,
    pub category: Option<String>,
    pub amount: Option<String>,
    pub note: Option<String>,
    pub date: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// One `files` part of the multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Create bill request DTO for OpenAPI documentation
/// Note: This struct is for OpenAPI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadBillDto {
    #[schema(example = "Electricity")]
    pub name: String,
    #[schema(example = "Utilities")]
    pub category: String,
    /// Non-negative decimal amount
    #[schema(example = "125.50")]
    pub amount: String,
    pub note: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339; defaults to today
    #[schema(example = "2024-05-01")]
    pub date: Option<String>,
    /// A file to attach; repeat the part to attach several
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub files: Option<String>,
}

/// Validated scalar fields of a new bill
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct CreateBillDto {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    pub note: Option<String>,
    #[validate(custom(function = "validate_non_negative"))]
    pub amount: Decimal,
    pub date: NaiveDate,
}

fn validate_non_negative(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < Decimal::ZERO {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("amount must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Trimmed value, or None when missing or blank
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse `YYYY-MM-DD`, or an RFC 3339 timestamp keeping its date
pub fn parse_bill_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::Validation(format!("date '{}' is not a valid date", raw)))
}

impl CreateBillDto {
    /// Parse and validate the scalar fields of a form; `today` fills a missing date
    pub fn from_form(form: &CreateBillForm, today: NaiveDate) -> Result<Self, AppError> {
        let amount = match non_blank(&form.amount) {
            Some(raw) => Decimal::from_str(raw).map_err(|_| {
                AppError::Validation(format!("amount '{}' is not a valid number", raw))
            })?,
            None => return Err(AppError::Validation("amount is required".to_string())),
        };

        let date = match non_blank(&form.date) {
            Some(raw) => parse_bill_date(raw)?,
            None => today,
        };

        let dto = Self {
            name: non_blank(&form.name).unwrap_or_default().to_string(),
            category: non_blank(&form.category).unwrap_or_default().to_string(),
            note: non_blank(&form.note).map(str::to_string),
            amount,
            date,
        };

        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok(dto)
    }
}

/// Attachment as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDto {
    /// Public URL of the stored file
    pub url: String,
    /// Original file name
    pub display_name: String,
}

/// Response DTO for a bill
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillResponseDto {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub note: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 125.5)]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub attachments: Vec<AttachmentDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentDto {
    fn from(attachment: Attachment) -> Self {
        Self {
            url: attachment.url,
            display_name: attachment.display_name,
        }
    }
}

impl From<Bill> for BillResponseDto {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id,
            name: bill.name,
            category: bill.category,
            note: bill.note,
            amount: bill.amount,
            date: bill.date,
            attachments: bill.attachments.into_iter().map(Into::into).collect(),
            created_at: bill.created_at,
            updated_at: bill.updated_at,
        }
    }
}

/// The only bill fields shared with the insight generator.
///
/// Field order is fixed so serialization is stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillInsightDto {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub name: String,
}

impl From<&Bill> for BillInsightDto {
    fn from(bill: &Bill) -> Self {
        Self {
            category: bill.category.clone(),
            amount: bill.amount,
            date: bill.date,
            name: bill.name.clone(),
        }
    }
}

/// Response data for a deleted bill
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBillResponseDto {
    pub id: Uuid,
    /// Number of stored files removed with the bill
    pub deleted_attachments: usize,
}

/// Response data for a spending analysis; the analysis itself is the message
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DescribeBillsResponseDto {
    /// Number of bills that were analyzed
    pub bill_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn form(name: &str, category: &str, amount: &str) -> CreateBillForm {
        CreateBillForm {
            name: Some(name.to_string()),
            category: Some(category.to_string()),
            amount: Some(amount.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_form_trims_and_defaults() {
        let mut f = form("  Water  ", " Utilities ", " 42.10 ");
        f.note = Some("   ".to_string());

        let dto = CreateBillDto::from_form(&f, today()).unwrap();
        assert_eq!(dto.name, "Water");
        assert_eq!(dto.category, "Utilities");
        assert_eq!(dto.amount, Decimal::from_str("42.10").unwrap());
        assert_eq!(dto.note, None);
        assert_eq!(dto.date, today());
    }

    #[test]
    fn test_from_form_parses_dates() {
        let mut f = form("Rent", "Housing", "900");
        f.date = Some("2024-01-31".to_string());
        assert_eq!(
            CreateBillDto::from_form(&f, today()).unwrap().date,
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
        );

        f.date = Some("2024-02-29T10:00:00.000Z".to_string());
        assert_eq!(
            CreateBillDto::from_form(&f, today()).unwrap().date,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );

        f.date = Some("31/01/2024".to_string());
        assert!(matches!(
            CreateBillDto::from_form(&f, today()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_from_form_rejects_missing_fields() {
        let cases = vec![
            form("", "Food", "1"),
            form("Lunch", "   ", "1"),
            form("Lunch", "Food", ""),
            form("Lunch", "Food", "twelve"),
            form("Lunch", "Food", "-0.01"),
        ];
        for f in cases {
            assert!(
                matches!(
                    CreateBillDto::from_form(&f, today()),
                    Err(AppError::Validation(_))
                ),
                "{:?}",
                f
            );
        }
    }

    #[test]
    fn test_zero_amount_is_allowed() {
        let dto = CreateBillDto::from_form(&form("Free trial", "Software", "0"), today()).unwrap();
        assert_eq!(dto.amount, Decimal::ZERO);
    }

    #[test]
    fn test_insight_projection_serializes_in_fixed_order() {
        let row = BillInsightDto {
            category: "Food".to_string(),
            amount: Decimal::from_str("12.5").unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            name: "Groceries".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"category":"Food","amount":12.5,"date":"2024-03-01","name":"Groceries"}"#
        );
    }
}
