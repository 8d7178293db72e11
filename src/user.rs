//! User profiles.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::api::{endpoints, SharedApi};
use crate::app::Result;
use crate::domain::{ProfileUpdate, User};
use crate::notify::Notifier;

#[derive(Debug, Default)]
struct UserState {
    selected_user: Option<User>,
    updated_profile: Option<User>,
    error: Option<String>,
}

pub struct UserStore {
    api: SharedApi,
    notifier: Arc<dyn Notifier>,
    state: Mutex<UserState>,
}

impl UserStore {
    pub fn new(api: SharedApi, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: Mutex::new(UserState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UserState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn selected_user(&self) -> Option<User> {
        self.lock().selected_user.clone()
    }

    pub fn updated_profile(&self) -> Option<User> {
        self.lock().updated_profile.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    fn store_profile(&self, user: &User) {
        let mut state = self.lock();
        state.updated_profile = Some(user.clone());
        state.selected_user = Some(user.clone());
        state.error = None;
    }

    fn store_error(&self, message: String, notify: bool) {
        warn!("User request failed: {}", message);
        if notify {
            self.notifier.error(&message);
        }
        self.lock().error = Some(message);
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        match async { self.api.get(&endpoints::user(id)).await?.json::<User>() }.await {
            Ok(user) => {
                let mut state = self.lock();
                state.selected_user = Some(user.clone());
                state.error = None;
                Ok(user)
            }
            Err(e) => {
                self.store_error(e.to_string(), true);
                Err(e)
            }
        }
    }

    /// The signed-in viewer. Failures are recorded without a notification.
    pub async fn current_profile(&self) -> Result<User> {
        match async { self.api.get(endpoints::CURRENT_USER).await?.json::<User>() }.await {
            Ok(user) => {
                self.store_profile(&user);
                Ok(user)
            }
            Err(e) => {
                self.store_error(e.to_string(), false);
                Err(e)
            }
        }
    }

    pub async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<User> {
        let result = async {
            let body = serde_json::to_value(update)?;
            self.api
                .put(&endpoints::user(user_id), &body)
                .await?
                .json::<User>()
        }
        .await;

        match result {
            Ok(user) => {
                info!("Updated profile of {}", user.id);
                self.store_profile(&user);
                self.notifier.success("Profile updated successfully");
                Ok(user)
            }
            Err(e) => {
                self.store_error(e.to_string(), true);
                Err(e)
            }
        }
    }
}
