use actix_web::{web, HttpResponse};

use crate::api::callable::{CallableRequest, CallableResponse};
use crate::models::Inquiry;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/sendInqueries",
    tag = "Inquiries",
    request_body(content = Inquiry, description = "Inquiry wrapped as {\"data\": ...}"),
    responses(
        (status = 200, description = "result is null when both mails were sent, otherwise the error message"),
        (status = 400, description = "Malformed payload")
    )
)]
pub async fn send_inquiries(
    state: web::Data<AppState>,
    request: web::Json<CallableRequest<Inquiry>>,
) -> HttpResponse {
    let inquiry = &request.data;
    log::info!("📨 POST /sendInqueries - from: {}", inquiry.email);

    let result = match state.inquiries.notify(inquiry).await {
        Ok(()) => None,
        Err(e) => {
            log::warn!("❌ Inquiry mail failed for {}: {}", inquiry.email, e);
            Some(e.to_string())
        }
    };

    HttpResponse::Ok().json(CallableResponse::new(result))
}
