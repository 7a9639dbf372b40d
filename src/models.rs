//! Records exchanged with the family API and the forms that feed them.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The authenticated user as returned by `get_user` / `create_user`.
///
/// Only the fields the site relies on are typed; everything else the backend
/// returned is kept in `extra` so it round-trips through the session intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{}{}", self.first_name, self.last_name)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub dob: Option<String>,
    /// Nested on `user-account` responses; some endpoints return a bare id here,
    /// which is dropped.
    #[serde(default, deserialize_with = "nested_or_none")]
    pub user: Option<AccountUser>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub vital_status: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    /// Owning user id.
    #[serde(default)]
    pub user: Option<i64>,
}

fn nested_or_none<'de, D>(deserializer: D) -> Result<Option<AccountUser>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{}{}", self.first_name, self.last_name)
    }
}

// Forms

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub vital_status: String,
}

/// Sign-up fields kept in the session to re-populate the form. Never holds
/// passwords.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedSignUpForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
}

impl From<&SignUpForm> for SavedSignUpForm {
    fn from(form: &SignUpForm) -> Self {
        Self {
            username: form.username.clone(),
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            dob: form.dob.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub vital_status: String,
    #[serde(default)]
    pub relationship: String,
}

const MAX_FIELD_LEN: usize = 100;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

impl MemberForm {
    /// Local checks mirroring the member form: every text field is required
    /// and at most 100 characters, `dob` must be a `YYYY-MM-DD` date.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("First name", &self.first_name),
            ("Last name", &self.last_name),
            ("Vital status", &self.vital_status),
            ("Relationship", &self.relationship),
        ];
        for (label, value) in fields {
            let value = value.trim();
            if value.is_empty() {
                return Err(format!("{} is required.", label));
            }
            if value.chars().count() > MAX_FIELD_LEN {
                return Err(format!(
                    "{} must be at most {} characters.",
                    label, MAX_FIELD_LEN
                ));
            }
        }

        NaiveDate::parse_from_str(self.dob.trim(), DATE_FORMAT)
            .map_err(|_| "Enter a valid date of birth (YYYY-MM-DD).".to_string())?;

        Ok(())
    }

    pub fn into_payload(self, user_id: i64) -> MemberPayload {
        MemberPayload {
            first_name: self.first_name,
            last_name: self.last_name,
            vital_status: self.vital_status,
            dob: self.dob,
            relationship: self.relationship,
            user: user_id,
        }
    }
}

impl From<&Member> for MemberForm {
    fn from(member: &Member) -> Self {
        Self {
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
            dob: member.dob.clone().unwrap_or_default(),
            vital_status: member.vital_status.clone().unwrap_or_default(),
            relationship: member.relationship.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub email: String,
}

impl From<&Account> for AccountForm {
    fn from(account: &Account) -> Self {
        let user = account.user.clone().unwrap_or_default();
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            dob: account.dob.clone().unwrap_or_default(),
            email: user.email,
        }
    }
}

// Payloads

#[derive(Debug, Serialize)]
pub struct GetUserPayload<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateUserPayload<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub relationship: &'a str,
    pub vital_status: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateAccountPayload<'a> {
    pub user_id: i64,
    pub dob: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberPayload {
    pub first_name: String,
    pub last_name: String,
    pub vital_status: String,
    pub dob: String,
    pub relationship: String,
    pub user: i64,
}

#[derive(Debug, Serialize)]
pub struct AccountUpdatePayload {
    pub dob: String,
    pub user: AccountUser,
}

impl From<AccountForm> for AccountUpdatePayload {
    fn from(form: AccountForm) -> Self {
        Self {
            dob: form.dob,
            user: AccountUser {
                email: form.email,
                first_name: form.first_name,
                last_name: form.last_name,
            },
        }
    }
}
