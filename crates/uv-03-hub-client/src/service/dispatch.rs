//! Inbound frame routing.

use crate::domain::events::HubEvent;
use shared_types::InboundMessage;
use tracing::{debug, warn};

/// Decode one text frame into the event it produces.
///
/// Malformed frames and unknown types are logged and yield `None`; they
/// never affect the connection.
pub(crate) fn route_frame(text: &str) -> Option<HubEvent> {
    match InboundMessage::decode(text) {
        Ok(InboundMessage::SignupAck(ack)) => Some(HubEvent::Registered {
            validator_id: ack.validator_id,
        }),
        Ok(InboundMessage::ValidationRequest(request)) => {
            debug!(
                callback_id = %request.callback_id,
                url = %request.url,
                "[hub] Validation request received"
            );
            Some(HubEvent::ValidationRequest(request))
        }
        Ok(InboundMessage::Error(error)) => {
            warn!(message = %error.message, "[hub] Hub reported an error");
            Some(HubEvent::HubError {
                message: error.message,
            })
        }
        Ok(InboundMessage::Unknown { message_type }) => {
            debug!(%message_type, "[hub] Ignoring frame of unknown type");
            None
        }
        Err(e) => {
            warn!(error = %e, "[hub] Ignoring malformed frame");
            None
        }
    }
}
