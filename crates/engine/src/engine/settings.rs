//! Store registration and settings maintenance.
//!
//! Vocabulary changes (statuses, issues, payment categories) only affect
//! what the intake forms offer going forward; records already using a
//! removed value keep it.

use rand::{Rng, distr::Alphanumeric};
use serde_json::json;
use tracing::info;

use shopdesk_store::{
    ArrayMatcher, DocPath, DocumentStore, PaymentSettings, SmsAccount, StoreAddress,
    StoreDocument, StoreError, StoreFilter, StoreSettings, TicketSettings,
};

use crate::engine::{CUSTOMER_REPLY_STATUS, ConsistencyEngine, NEW_STATUS, to_json};
use crate::error::EngineError;

/// Length of the generated employee signup code.
const SIGNUP_CODE_LEN: usize = 8;

/// Registration form for a new store.
#[derive(Debug, Clone, Default)]
pub struct NewStoreForm {
    pub storename: String,
}

/// Status vocabulary a fresh store starts with, as `[name, color]` pairs.
fn default_statuses() -> Vec<(String, String)> {
    [
        (NEW_STATUS, "#29b6f6"),
        (CUSTOMER_REPLY_STATUS, "#ffa726"),
        ("Resolved", "#66bb6a"),
    ]
    .into_iter()
    .map(|(name, color)| (name.to_owned(), color.to_owned()))
    .collect()
}

/// Issue vocabulary a fresh store starts with.
fn default_issues() -> Vec<String> {
    ["Repair", "Exchange", "Refund", "Question", "Other"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

/// Capitalized form used for status names: first letter upper, rest lower.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
    })
}

impl<S: DocumentStore> ConsistencyEngine<S> {
    /// Register a store with default settings and a generated employee
    /// signup code. Storenames are lowercased and must be unique.
    ///
    /// # Errors
    ///
    /// `Validation` keyed `storename` when the name is taken.
    pub async fn create_store(&self, form: &NewStoreForm) -> Result<StoreDocument, EngineError> {
        let storename = form.storename.trim().to_lowercase();
        let signup_code: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(SIGNUP_CODE_LEN)
            .map(char::from)
            .collect();

        let doc = StoreDocument::new(
            storename.clone(),
            signup_code,
            StoreSettings {
                tickets: TicketSettings {
                    status: default_statuses(),
                    issue: default_issues(),
                },
                payments: PaymentSettings::default(),
                pay_period: String::new(),
            },
        );

        match self.store().insert(doc.clone()).await {
            Ok(()) => {
                info!(storename = %storename, "store registered");
                Ok(doc)
            }
            Err(StoreError::DuplicateStorename(_)) => {
                Err(EngineError::field("storename", "Store already registered"))
            }
            Err(source) => Err(source.into()),
        }
    }

    /// The store an employee signup code belongs to.
    ///
    /// # Errors
    ///
    /// `NotFound` when no store issued the code.
    pub async fn store_for_signup_code(&self, code: &str) -> Result<StoreDocument, EngineError> {
        self.store()
            .find_one(&StoreFilter::SignupCode(code.to_owned()))
            .await?
            .ok_or_else(|| EngineError::not_found("store", code))
    }

    /// A store's current settings.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn get_store_settings(&self, storename: &str) -> Result<StoreSettings, EngineError> {
        Ok(self.get_store(storename).await?.settings)
    }

    /// Attach SMS sub-account credentials to a store.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn set_sms_account(
        &self,
        storename: &str,
        account: &SmsAccount,
    ) -> Result<(), EngineError> {
        self.store()
            .set_fields(
                &StoreFilter::storename(storename),
                vec![(DocPath::sms_account(), to_json(account)?)],
            )
            .await?;
        Ok(())
    }

    /// Add a `[name, color]` pair to the status vocabulary. The name is
    /// stored capitalized.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn add_ticket_status(
        &self,
        storename: &str,
        name: &str,
        color: &str,
    ) -> Result<(), EngineError> {
        self.store()
            .append_to_array(
                &StoreFilter::storename(storename),
                &DocPath::ticket_status_settings(),
                json!([capitalize(name), color]),
            )
            .await?;
        Ok(())
    }

    /// Remove a status from the vocabulary by name. Tickets already in
    /// that status keep it.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn remove_ticket_status(&self, storename: &str, name: &str) -> Result<(), EngineError> {
        self.store()
            .remove_from_array(
                &StoreFilter::storename(storename),
                &DocPath::ticket_status_settings(),
                &ArrayMatcher::First(json!(capitalize(name))),
            )
            .await?;
        Ok(())
    }

    /// Add an issue category; duplicates are ignored.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn add_issue(&self, storename: &str, issue: &str) -> Result<(), EngineError> {
        self.store()
            .add_unique(
                &StoreFilter::storename(storename),
                &DocPath::issue_settings(),
                json!(issue),
            )
            .await?;
        Ok(())
    }

    /// Remove an issue category. Tickets already filed under it keep it.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn remove_issue(&self, storename: &str, issue: &str) -> Result<(), EngineError> {
        self.store()
            .remove_from_array(
                &StoreFilter::storename(storename),
                &DocPath::issue_settings(),
                &ArrayMatcher::Equals(json!(issue)),
            )
            .await?;
        Ok(())
    }

    /// Add a payment category; duplicates are ignored.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn add_payment_category(
        &self,
        storename: &str,
        category: &str,
    ) -> Result<(), EngineError> {
        self.store()
            .add_unique(
                &StoreFilter::storename(storename),
                &DocPath::payment_categories(),
                json!(category),
            )
            .await?;
        Ok(())
    }

    /// Remove a payment category.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn remove_payment_category(
        &self,
        storename: &str,
        category: &str,
    ) -> Result<(), EngineError> {
        self.store()
            .remove_from_array(
                &StoreFilter::storename(storename),
                &DocPath::payment_categories(),
                &ArrayMatcher::Equals(json!(category)),
            )
            .await?;
        Ok(())
    }

    /// Set the store tax rate, stripping any non-numeric prefix the form
    /// lets through (currency signs, stray spaces).
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn set_tax_rate(&self, storename: &str, rate: &str) -> Result<(), EngineError> {
        let cleaned = rate.trim_start_matches(|c: char| !c.is_ascii_digit());
        self.store()
            .set_fields(
                &StoreFilter::storename(storename),
                vec![(DocPath::tax_rate(), json!(cleaned))],
            )
            .await?;
        Ok(())
    }

    /// Set the store mailing address used on receipts.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown store.
    pub async fn set_store_address(
        &self,
        storename: &str,
        address: &StoreAddress,
    ) -> Result<(), EngineError> {
        use shopdesk_store::AddressField;

        let writes = vec![
            (DocPath::address_field(AddressField::Primary), json!(address.primary)),
            (DocPath::address_field(AddressField::City), json!(address.city)),
            (DocPath::address_field(AddressField::Province), json!(address.province)),
            (DocPath::address_field(AddressField::Postal), json!(address.postal)),
        ];
        self.store()
            .set_fields(&StoreFilter::storename(storename), writes)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use shopdesk_store::MemoryStore;

    async fn engine_with_store() -> ConsistencyEngine<MemoryStore> {
        let engine = ConsistencyEngine::new(MemoryStore::new());
        engine
            .create_store(&NewStoreForm {
                storename: "Acme".into(),
            })
            .await
            .unwrap();
        engine
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("resolved"), "Resolved");
        assert_eq!(capitalize("IN PROGRESS"), "In progress");
        assert_eq!(capitalize(""), "");
    }

    #[tokio::test]
    async fn test_create_store_lowercases_and_seeds_defaults() {
        let engine = engine_with_store().await;

        let doc = engine.get_store("acme").await.unwrap();
        assert_eq!(doc.storename, "acme");
        assert_eq!(doc.signup_code.len(), SIGNUP_CODE_LEN);
        assert!(
            doc.settings
                .tickets
                .status
                .iter()
                .any(|(name, _)| name == "New")
        );
        assert!(doc.settings.tickets.issue.contains(&"Repair".to_owned()));
    }

    #[tokio::test]
    async fn test_duplicate_storename_rejected() {
        let engine = engine_with_store().await;

        let err = engine
            .create_store(&NewStoreForm {
                storename: "ACME ".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.as_field_errors().unwrap().get("storename"),
            Some("Store already registered")
        );
    }

    #[tokio::test]
    async fn test_signup_code_locates_store() {
        let engine = ConsistencyEngine::new(MemoryStore::new());
        let doc = engine
            .create_store(&NewStoreForm {
                storename: "acme".into(),
            })
            .await
            .unwrap();

        let found = engine.store_for_signup_code(&doc.signup_code).await.unwrap();
        assert_eq!(found.storename, "acme");

        assert!(matches!(
            engine.store_for_signup_code("nope").await.unwrap_err(),
            EngineError::NotFound { entity: "store", .. }
        ));
    }

    #[tokio::test]
    async fn test_status_vocabulary_roundtrip() {
        let engine = engine_with_store().await;

        engine.add_ticket_status("acme", "waiting ON PARTS", "#ab47bc").await.unwrap();
        let settings = engine.get_store_settings("acme").await.unwrap();
        assert!(
            settings
                .tickets
                .status
                .contains(&("Waiting on parts".to_owned(), "#ab47bc".to_owned()))
        );

        engine.remove_ticket_status("acme", "WAITING on parts").await.unwrap();
        let settings = engine.get_store_settings("acme").await.unwrap();
        assert!(
            !settings
                .tickets
                .status
                .iter()
                .any(|(name, _)| name == "Waiting on parts")
        );
    }

    #[tokio::test]
    async fn test_issue_vocabulary_is_a_set() {
        let engine = engine_with_store().await;

        engine.add_issue("acme", "Warranty").await.unwrap();
        engine.add_issue("acme", "Warranty").await.unwrap();
        let settings = engine.get_store_settings("acme").await.unwrap();
        assert_eq!(
            settings.tickets.issue.iter().filter(|i| *i == "Warranty").count(),
            1
        );

        engine.remove_issue("acme", "Warranty").await.unwrap();
        let settings = engine.get_store_settings("acme").await.unwrap();
        assert!(!settings.tickets.issue.contains(&"Warranty".to_owned()));
    }

    #[tokio::test]
    async fn test_payment_categories() {
        let engine = engine_with_store().await;

        engine.add_payment_category("acme", "Accessories").await.unwrap();
        let settings = engine.get_store_settings("acme").await.unwrap();
        assert_eq!(settings.payments.categories, ["Accessories"]);

        engine.remove_payment_category("acme", "Accessories").await.unwrap();
        let settings = engine.get_store_settings("acme").await.unwrap();
        assert!(settings.payments.categories.is_empty());
    }

    #[tokio::test]
    async fn test_tax_rate_strips_non_numeric_prefix() {
        let engine = engine_with_store().await;

        engine.set_tax_rate("acme", "% 8.25").await.unwrap();
        let settings = engine.get_store_settings("acme").await.unwrap();
        assert_eq!(settings.payments.tax_rate, "8.25");
    }

    #[tokio::test]
    async fn test_store_address_round_trips() {
        let engine = engine_with_store().await;

        let address = StoreAddress {
            primary: "100 Main St".into(),
            city: "Springfield".into(),
            province: "IL".into(),
            postal: "62701".into(),
        };
        engine.set_store_address("acme", &address).await.unwrap();

        let settings = engine.get_store_settings("acme").await.unwrap();
        assert_eq!(settings.payments.address, address);
    }
}
