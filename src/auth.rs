//! Session and identity service.
//!
//! Identity lives under two reserved substrate keys: the registered-users
//! array and the session key holding a copy of the signed-in [`User`].
//! Both hold plain JSON objects; beyond `id`, `email` and `password` the
//! service assumes nothing about their fields. Credentials are stored and
//! compared as plaintext.
//!
//! Lock order is registered users first, then session. Every method that
//! needs both takes them in that order.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::{StoreError, StoreResult};
use crate::record::{into_record, merge_patch, new_record_id, now_iso, Record, ID_FIELD};
use crate::store::DataStore;

pub const DEMO_STUDENT_EMAIL: &str = "student@vignanhub.com";
pub const DEMO_TEACHER_EMAIL: &str = "teacher@vignanhub.com";
const DEMO_CREATED_DATE: &str = "2024-01-01T00:00:00.000Z";

const EMAIL_FIELD: &str = "email";
const PASSWORD_FIELD: &str = "password";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Student,
    Teacher,
}

impl Display for AccountType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountType::Student => write!(f, "student"),
            AccountType::Teacher => write!(f, "teacher"),
        }
    }
}

impl FromStr for AccountType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(AccountType::Student),
            "teacher" => Ok(AccountType::Teacher),
            other => Err(StoreError::InvalidRecord(format!("unknown account type: {other}"))),
        }
    }
}

/// A user record. Only `id`, `email` and `password` are read by the
/// service; every other field (points, badges, streaks, avatars, quiz
/// state, ...) is carried as-is and may hold any JSON value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(Record);

impl User {
    pub fn from_record(record: Record) -> Self {
        Self(record)
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field(ID_FIELD)
    }

    pub fn email(&self) -> Option<&str> {
        self.str_field(EMAIL_FIELD)
    }

    pub fn password(&self) -> Option<&str> {
        self.str_field(PASSWORD_FIELD)
    }

    /// The `account_type` field, if it holds a known type.
    pub fn account_type(&self) -> Option<AccountType> {
        self.str_field("account_type").and_then(|s| s.parse().ok())
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.0.get(field)
    }

    pub fn record(&self) -> &Record {
        &self.0
    }

    pub fn into_record(self) -> Record {
        self.0
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(JsonValue::as_str)
    }

    fn set(&mut self, field: &str, value: impl Into<JsonValue>) {
        self.0.insert(field.to_string(), value.into());
    }

    fn has_email(&self, email: &str) -> bool {
        self.email().is_some_and(|own| same_email(own, email))
    }

    fn has_id(&self, id: Option<&str>) -> bool {
        id.is_some() && self.id() == id
    }
}

/// Navigation hint handed back to the UI when it needs a sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRedirect {
    pub login_path: String,
    pub return_to: Option<String>,
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

pub fn is_demo_email(email: &str) -> bool {
    same_email(email, DEMO_STUDENT_EMAIL) || same_email(email, DEMO_TEACHER_EMAIL)
}

/// Deterministic identity for a demo address. Demo users are never stored
/// with the registered users and carry no password.
pub fn demo_user(email: &str) -> Option<User> {
    let fields = if same_email(email, DEMO_STUDENT_EMAIL) {
        json!({
            "id": "demo_student",
            "email": DEMO_STUDENT_EMAIL,
            "full_name": "Demo Student",
            "account_type": AccountType::Student,
            "points": 150,
            "badges": [],
            "enrolled_courses": ["course_1", "course_4"],
            "onboarding_completed": true,
            "created_date": DEMO_CREATED_DATE,
        })
    } else if same_email(email, DEMO_TEACHER_EMAIL) {
        json!({
            "id": "demo_teacher",
            "email": DEMO_TEACHER_EMAIL,
            "full_name": "Demo Teacher",
            "account_type": AccountType::Teacher,
            "points": 0,
            "badges": [],
            "enrolled_courses": [],
            "onboarding_completed": true,
            "created_date": DEMO_CREATED_DATE,
        })
    } else {
        return None;
    };

    into_record(fields).ok().map(User::from_record)
}

#[derive(Clone)]
pub struct AuthService {
    store: DataStore,
}

impl AuthService {
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }

    fn users_key(&self) -> &str {
        &self.store.config().registered_users_key
    }

    fn session_key(&self) -> &str {
        &self.store.config().session_key
    }

    fn load_registered(&self) -> StoreResult<Vec<User>> {
        Ok(self.store.read_json(self.users_key())?.unwrap_or_default())
    }

    fn save_registered(&self, users: &[User]) -> StoreResult<()> {
        self.store.write_json(self.users_key(), users)
    }

    fn read_session(&self) -> StoreResult<Option<User>> {
        self.store.read_json(self.session_key())
    }

    fn write_session(&self, user: &User) -> StoreResult<()> {
        self.store.write_json(self.session_key(), user)
    }

    /// Whether a session is present.
    pub fn is_authenticated(&self) -> StoreResult<bool> {
        self.store.contains(self.session_key())
    }

    /// The signed-in user, or `None` when anonymous.
    pub fn me(&self) -> StoreResult<Option<User>> {
        self.store.simulate_latency();
        self.read_session()
    }

    /// Every signed-up user. Demo users are not included.
    pub fn registered_users(&self) -> StoreResult<Vec<User>> {
        self.store.simulate_latency();
        self.load_registered()
    }

    /// Signs in. Registered accounts take precedence over the demo addresses;
    /// demo addresses accept any password.
    ///
    /// Addresses are matched ignoring case and surrounding whitespace, so
    /// `" Student@VignanHub.com "` finds the same account as
    /// `student@vignanhub.com`. The same rule applies in [`signup`] and
    /// [`reset_password`].
    ///
    /// [`signup`]: AuthService::signup
    /// [`reset_password`]: AuthService::reset_password
    pub fn login(&self, email: &str, password: &str) -> StoreResult<User> {
        self.store.simulate_latency();

        let registered = self
            .load_registered()?
            .into_iter()
            .find(|user| user.has_email(email));

        let user = match registered {
            Some(user) if user.password() == Some(password) => user,
            Some(_) => {
                warn!("Rejected login for {email}: wrong password");
                return Err(StoreError::InvalidCredentials);
            }
            None => match demo_user(email) {
                Some(user) => user,
                None => {
                    warn!("Rejected login for unknown account {email}");
                    return Err(StoreError::InvalidCredentials);
                }
            },
        };

        let lock = self.store.write_lock(self.session_key());
        let _guard = lock.lock();
        self.write_session(&user)?;
        info!("User {} signed in", user.id().unwrap_or("<no id>"));
        Ok(user)
    }

    /// Registers a new account and signs it in. An address already
    /// registered (ignoring case and surrounding whitespace) is rejected.
    pub fn signup(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        account_type: AccountType,
    ) -> StoreResult<User> {
        self.store.simulate_latency();
        let users_lock = self.store.write_lock(self.users_key());
        let _users_guard = users_lock.lock();

        let mut users = self.load_registered()?;
        if users.iter().any(|user| user.has_email(email)) {
            return Err(StoreError::DuplicateAccount(email.trim().to_string()));
        }

        let user = User::from_record(into_record(json!({
            "id": new_record_id(),
            "email": email.trim(),
            "password": password,
            "full_name": full_name,
            "account_type": account_type,
            "points": 0,
            "badges": [],
            "enrolled_courses": [],
            "onboarding_completed": true,
            "created_date": now_iso(),
        }))?);
        users.push(user.clone());
        self.save_registered(&users)?;

        let session_lock = self.store.write_lock(self.session_key());
        let _session_guard = session_lock.lock();
        self.write_session(&user)?;

        info!("Registered {} account {}", account_type, user.id().unwrap_or_default());
        Ok(user)
    }

    /// Overwrites a registered account's password. Demo addresses succeed
    /// without any effect.
    pub fn reset_password(&self, email: &str, new_password: &str) -> StoreResult<()> {
        self.store.simulate_latency();
        let users_lock = self.store.write_lock(self.users_key());
        let _users_guard = users_lock.lock();

        let mut users = self.load_registered()?;
        let Some(user) = users.iter_mut().find(|user| user.has_email(email)) else {
            if is_demo_email(email) {
                info!("Password reset requested for demo account {email}; nothing stored");
                return Ok(());
            }
            return Err(StoreError::AccountNotFound(email.trim().to_string()));
        };

        user.set(PASSWORD_FIELD, new_password);
        let user_id = user.id().map(str::to_string);
        self.save_registered(&users)?;

        let session_lock = self.store.write_lock(self.session_key());
        let _session_guard = session_lock.lock();
        if let Some(mut current) = self.read_session()? {
            if current.has_id(user_id.as_deref()) {
                current.set(PASSWORD_FIELD, new_password);
                self.write_session(&current)?;
            }
        }

        info!("Password reset for user {}", user_id.as_deref().unwrap_or("<no id>"));
        Ok(())
    }

    /// Ends the session. The registered record is left untouched.
    pub fn logout(&self) -> StoreResult<()> {
        let lock = self.store.write_lock(self.session_key());
        let _guard = lock.lock();
        self.store.remove(self.session_key())?;
        info!("Session cleared");
        Ok(())
    }

    /// Shallow-merges `patch` into the signed-in user and into the matching
    /// registered record, if there is one. Values of any type are accepted.
    pub fn update_me(&self, patch: &Record) -> StoreResult<User> {
        self.store.simulate_latency();
        let users_lock = self.store.write_lock(self.users_key());
        let _users_guard = users_lock.lock();
        let session_lock = self.store.write_lock(self.session_key());
        let _session_guard = session_lock.lock();

        let mut current = self.read_session()?.ok_or(StoreError::NotAuthenticated)?;
        merge_patch(&mut current.0, patch);

        let mut users = self.load_registered()?;
        if let Some(registered) = users.iter_mut().find(|user| user.has_id(current.id())) {
            merge_patch(&mut registered.0, patch);
            self.save_registered(&users)?;
        }

        self.write_session(&current)?;
        Ok(current)
    }

    /// Where the UI should send an anonymous visitor.
    pub fn redirect_to_login(&self, return_to: Option<&str>) -> LoginRedirect {
        LoginRedirect {
            login_path: self.store.config().login_path.clone(),
            return_to: return_to.map(str::to_string),
        }
    }
}
