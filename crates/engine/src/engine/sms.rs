//! SMS conversation flow: outbound sends and the inbound webhook.

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use shopdesk_core::TicketId;
use shopdesk_store::{
    DocPath, DocumentStore, SmsDirection, SmsEntry, StoreFilter, TicketField,
};

use crate::engine::{
    CUSTOMER_REPLY_STATUS, ConsistencyEngine, mirror, now_millis, partial_write, to_json,
};
use crate::error::EngineError;
use crate::gateway::sms::SmsGateway;

/// An inbound message as posted by the SMS provider's webhook.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InboundSms {
    /// Sub-account SID the message arrived on; identifies the store.
    pub account_sid: String,
    /// Sender in E.164 form (`+1` prefix).
    pub from: String,
    pub body: String,
}

impl<S: DocumentStore> ConsistencyEngine<S> {
    /// Send a text message to a customer and record it on the ticket's
    /// transcript.
    ///
    /// The transcript entry records the body as accepted by the
    /// provider, not the submitted one.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store or ticket; `Sms` if the provider
    /// rejects the message (nothing is recorded); `PartialWrite` if the
    /// message went out but the transcript append failed.
    pub async fn send_sms(
        &self,
        gateway: &impl SmsGateway,
        storename: &str,
        ticket_id: TicketId,
        to_phone: &str,
        body: &str,
    ) -> Result<String, EngineError> {
        let doc = self.get_store(storename).await?;
        if doc.ticket(ticket_id).is_none() {
            return Err(EngineError::not_found("ticket", ticket_id.key()));
        }

        let sent = gateway.send(&doc.sms_account, to_phone, body).await?;

        let entry = SmsEntry {
            timestamp: now_millis(),
            direction: SmsDirection::Outbound,
            message: sent.clone(),
        };
        self.store()
            .append_to_array(
                &StoreFilter::storename(storename),
                &DocPath::ticket_sms_log(ticket_id),
                to_json(&entry)?,
            )
            .await
            .map_err(partial_write("message sent but transcript append failed"))?;

        Ok(sent)
    }

    /// Route an inbound message to the sender's most recently updated
    /// ticket and flag it for attention.
    ///
    /// The store is located by the sub-account SID the message arrived
    /// on; the sender's country prefix is stripped to recover the phone
    /// key. The message is appended to the ticket's transcript and the
    /// status is set to "Customer Reply" in both copies. Returns the
    /// ticket that received the message.
    ///
    /// # Errors
    ///
    /// `NotFound` when no store matches the SID, the sender is not a
    /// registered customer, or the customer has no tickets;
    /// `PartialWrite` if the status update fails after the message was
    /// already recorded.
    pub async fn receive_sms(&self, inbound: &InboundSms) -> Result<TicketId, EngineError> {
        let filter = StoreFilter::SmsAccountSid(inbound.account_sid.clone());
        let doc = self
            .store()
            .find_one(&filter)
            .await?
            .ok_or_else(|| EngineError::not_found("store", &inbound.account_sid))?;

        let phone = inbound.from.strip_prefix("+1").unwrap_or(&inbound.from);
        let customer = doc
            .customer(phone)
            .ok_or_else(|| EngineError::not_found("customer", phone))?;

        let ticket_id = customer
            .tickets
            .iter()
            .max_by_key(|(_, summary)| summary.last_updated)
            .and_then(|(key, _)| key.parse::<TicketId>().ok())
            .ok_or_else(|| EngineError::not_found("ticket", phone))?;

        let entry = SmsEntry {
            timestamp: now_millis(),
            direction: SmsDirection::Inbound,
            message: inbound.body.clone(),
        };
        self.store()
            .append_to_array(&filter, &DocPath::ticket_sms_log(ticket_id), to_json(&entry)?)
            .await?;

        let writes = mirror::ticket_mirror_writes(
            phone,
            ticket_id,
            &[
                (TicketField::Status, json!(CUSTOMER_REPLY_STATUS)),
                (TicketField::LastUpdated, json!(now_millis())),
            ],
        );
        self.store()
            .set_fields(&filter, writes)
            .await
            .map_err(partial_write(
                "inbound message recorded but status update failed",
            ))?;

        info!(storename = %doc.storename, ticket = %ticket_id, "inbound SMS routed");

        Ok(ticket_id)
    }
}
