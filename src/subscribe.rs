//! Newsletter subscription.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::{endpoints, SharedApi};
use crate::app::{PlazaError, Result};
use crate::domain::{validate_email, Subscription, ValidationErrors};
use crate::notify::Notifier;

/// Form-level slot for failures that belong to no single field.
pub const RESPONSE_ERROR_FIELD: &str = "responseError";

#[derive(Debug, Default)]
struct SubscriptionState {
    subscription: Option<Subscription>,
    errors: ValidationErrors,
}

pub struct SubscriptionStore {
    api: SharedApi,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SubscriptionState>,
}

impl SubscriptionStore {
    pub fn new(api: SharedApi, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: Mutex::new(SubscriptionState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SubscriptionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subscription(&self) -> Option<Subscription> {
        self.lock().subscription.clone()
    }

    /// Field errors of the last attempt, including `responseError`.
    pub fn errors(&self) -> ValidationErrors {
        self.lock().errors.clone()
    }

    pub fn clear_response_error(&self) {
        self.lock().errors = ValidationErrors::new();
    }

    pub async fn subscribe(&self, email: &str) -> Result<Subscription> {
        if let Err(errors) = validate_email(email) {
            self.lock().errors = errors.clone();
            return Err(PlazaError::Validation(errors));
        }
        self.lock().errors = ValidationErrors::new();

        let result = async {
            let mut data = self
                .api
                .post(endpoints::SUBSCRIBERS, &json!({ "email": email }))
                .await?
                .data;
            if let Value::Object(fields) = &mut data {
                fields.insert("email".into(), Value::String(email.to_string()));
            } else {
                data = json!({ "email": email });
            }
            serde_json::from_value::<Subscription>(data)
                .map_err(|e| PlazaError::Decode(e.to_string()))
        }
        .await;

        match result {
            Ok(subscription) => {
                info!("Subscribed {}", email);
                self.lock().subscription = Some(subscription.clone());
                self.notifier.success("Successfully subscribed!");
                Ok(subscription)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Subscription failed: {}", message);
                self.lock().errors.add(RESPONSE_ERROR_FIELD, &message);
                self.notifier.error(&message);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApiClient;
    use crate::app::ErrorKind;
    use crate::notify::{Level, RecordingNotifier};
    use reqwest::Method;
    use tokio_test::{assert_err, assert_ok};

    fn store() -> (Arc<MockApiClient>, Arc<RecordingNotifier>, SubscriptionStore) {
        let api = Arc::new(MockApiClient::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let store = SubscriptionStore::new(api.clone(), notifier.clone());
        (api, notifier, store)
    }

    #[tokio::test]
    async fn test_subscribe_posts_email() {
        let (api, notifier, store) = store();
        api.on(Method::POST, "/subscribers", json!({"_id": "s1"}));

        let subscription = assert_ok!(store.subscribe("mai@example.com").await);

        assert_eq!(subscription.email, "mai@example.com");
        assert_eq!(subscription.id.as_deref(), Some("s1"));
        assert_eq!(api.calls()[0].body, Some(json!({"email": "mai@example.com"})));
        assert_eq!(notifier.last().unwrap().message, "Successfully subscribed!");
        assert!(store.errors().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected_locally() {
        let (api, _, store) = store();

        let err = store.subscribe("not-an-email").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.errors().get("email"), Some("Invalid email"));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_server_failure_lands_in_response_error() {
        let (api, notifier, store) = store();
        api.fail(Method::POST, "/subscribers", 409, "Email already subscribed");

        assert_err!(store.subscribe("mai@example.com").await);

        let errors = store.errors();
        assert!(errors
            .get(RESPONSE_ERROR_FIELD)
            .unwrap()
            .contains("Email already subscribed"));
        assert_eq!(notifier.last().unwrap().level, Level::Error);

        store.clear_response_error();
        assert!(store.errors().is_empty());
    }
}
