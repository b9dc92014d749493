//! Live search over record keys.

use serde::Serialize;

use shopdesk_core::{PaymentId, TicketId};
use shopdesk_store::DocumentStore;

use crate::engine::ConsistencyEngine;
use crate::error::EngineError;

/// Matches for one search query, grouped by entity kind. Each list is
/// independent; a query may hit all three.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub tickets: Vec<TicketId>,
    pub customers: Vec<String>,
    pub payments: Vec<PaymentId>,
}

impl<S: DocumentStore> ConsistencyEngine<S> {
    /// Substring match of the trimmed query against ticket IDs, customer
    /// phone keys, and payment IDs. ID lists come back in ascending
    /// numeric order; customers in key order.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn live_search(
        &self,
        storename: &str,
        query: &str,
    ) -> Result<SearchResults, EngineError> {
        let doc = self.get_store(storename).await?;
        let query = query.trim();

        // Map keys iterate in string order, which misorders IDs of
        // different widths, so the parsed lists are re-sorted.
        let mut tickets: Vec<TicketId> = doc
            .tickets
            .keys()
            .filter(|k| k.contains(query))
            .filter_map(|k| k.parse().ok())
            .collect();
        tickets.sort_unstable();

        let mut payments: Vec<PaymentId> = doc
            .payments
            .keys()
            .filter(|k| k.contains(query))
            .filter_map(|k| k.parse().ok())
            .collect();
        payments.sort_unstable();

        Ok(SearchResults {
            tickets,
            customers: doc
                .customers
                .keys()
                .filter(|k| k.contains(query))
                .cloned()
                .collect(),
            payments,
        })
    }
}
