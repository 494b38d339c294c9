use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::db::KeyValueStore;
use crate::error::{PortalError, Result};
use crate::models::{User, UserType};
use crate::store::Store;

pub const DEFAULT_SESSION_KEY: &str = "adhyayan_user";

/// Which screen the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Landing,
    StudentDashboard,
    AlumniDashboard,
    AdminDashboard,
    OrganizationDashboard,
}

impl Page {
    pub const fn dashboard_for(user_type: UserType) -> Self {
        match user_type {
            UserType::Student => Self::StudentDashboard,
            UserType::Alumni => Self::AlumniDashboard,
            UserType::Admin => Self::AdminDashboard,
            UserType::Organization => Self::OrganizationDashboard,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landing => "landing-page",
            Self::StudentDashboard => "student-dashboard",
            Self::AlumniDashboard => "alumni-dashboard",
            Self::AdminDashboard => "admin-dashboard",
            Self::OrganizationDashboard => "organization-dashboard",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape written to the key-value store.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedSession {
    user: User,
    user_type: UserType,
}

/// The logged-in user (if any) and the page being shown.
#[derive(Debug)]
pub struct Session {
    key: String,
    user: Option<User>,
    page: Page,
}

impl Session {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            user: None,
            page: Page::Landing,
        }
    }

    /// Load the saved session under `key`. Data that does not parse is
    /// treated as no session at all.
    pub fn restore(kv: &dyn KeyValueStore, key: impl Into<String>) -> Result<Self> {
        let mut session = Self::new(key);
        let Some(raw) = kv.get(&session.key)? else {
            debug!(key = %session.key, "no saved session");
            return Ok(session);
        };

        match serde_json::from_str::<SavedSession>(&raw) {
            Ok(saved) if saved.user.user_type() == saved.user_type => {
                debug!(user = saved.user.email(), user_type = %saved.user_type, "restored session");
                session.page = Page::dashboard_for(saved.user_type);
                session.user = Some(saved.user);
            }
            Ok(saved) => {
                warn!(
                    user_type = %saved.user_type,
                    record = %saved.user.user_type(),
                    "invalid saved user data: user type does not match record"
                );
            }
            Err(e) => warn!(error = %e, "invalid saved user data"),
        }
        Ok(session)
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.user.as_ref().map(User::user_type)
    }

    pub const fn page(&self) -> Page {
        self.page
    }

    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Authenticate against `store` and persist the result.
    pub fn login(
        &mut self,
        store: &Store,
        kv: &mut dyn KeyValueStore,
        email: &str,
        password: &str,
        user_type: UserType,
    ) -> Result<&User> {
        let user = store.authenticate(email, password, user_type)?;

        let saved = SavedSession { user, user_type };
        kv.set(&self.key, &serde_json::to_string(&saved)?)?;

        info!(email, %user_type, "logged in");
        self.page = Page::dashboard_for(user_type);
        Ok(&*self.user.insert(saved.user))
    }

    pub fn logout(&mut self, kv: &mut dyn KeyValueStore) -> Result<()> {
        kv.remove(&self.key)?;
        if let Some(user) = self.user.take() {
            info!(email = user.email(), "logged out");
        }
        self.page = Page::Landing;
        Ok(())
    }

    /// The current user, provided they hold `user_type`.
    pub fn require(&self, user_type: UserType) -> Result<&User> {
        match &self.user {
            Some(user) if user.user_type() == user_type => Ok(user),
            other => Err(PortalError::AuthFailure {
                email: other
                    .as_ref()
                    .map(|u| u.email().to_string())
                    .unwrap_or_default(),
                user_type,
            }),
        }
    }
}
