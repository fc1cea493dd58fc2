use utoipa::OpenApi;

use crate::features::bills::{dtos as bills_dtos, handlers as bills_handlers};
use crate::shared::types::ApiResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Bills
        bills_handlers::create_bill,
        bills_handlers::list_bills,
        bills_handlers::delete_bill,
        bills_handlers::describe_bills,
    ),
    components(
        schemas(
            bills_dtos::UploadBillDto,
            bills_dtos::AttachmentDto,
            bills_dtos::BillResponseDto,
            bills_dtos::DeleteBillResponseDto,
            bills_dtos::DescribeBillsResponseDto,
            ApiResponse<bills_dtos::DeleteBillResponseDto>,
            ApiResponse<bills_dtos::DescribeBillsResponseDto>,
        )
    ),
    tags(
        (name = "bills", description = "Bills, their attachments and spending insights"),
    ),
    info(
        title = "Bill Tracker API",
        description = "Track bills with file attachments and get AI spending summaries",
    )
)]
pub struct ApiDoc;
