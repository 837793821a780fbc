use actix_web::{HttpResponse, Responder, web};

use crate::chat::{InboundEvent, OutboundMessage};
use crate::context::AppContext;

/// Inbound chat event from the bot transport. The response carries the
/// messages the transport should deliver; delivery itself is its job.
#[utoipa::path(
    post,
    path = "/chat/event",
    request_body = InboundEvent,
    responses(
        (status = 200, description = "Messages to deliver", body = [OutboundMessage])
    ),
    tag = "Chat"
)]
pub async fn chat_event(
    ctx: web::Data<AppContext>,
    payload: web::Json<InboundEvent>,
) -> impl Responder {
    let outbound = ctx.chat.handle(payload.into_inner()).await;
    HttpResponse::Ok().json(outbound)
}
