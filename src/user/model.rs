use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::utils::helpers::to_chrono;

pub const DEFAULT_PROVIDER: &str = "firebase";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub firebase_uid: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    pub created_at: bson::DateTime,
    pub last_login: bson::DateTime,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

/// Identity claims that already passed token verification.
///
/// Nothing downstream re-derives these fields; they are trusted as given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedIdentity {
    #[serde(rename = "firebaseUid")]
    pub external_id: String,
    pub email: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "image", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub firebase_uid: String,
    pub email: String,
    pub name: String,
    pub image: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_hex(),
            firebase_uid: user.firebase_uid.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            provider: user.provider.clone(),
            created_at: to_chrono(user.created_at),
            last_login: to_chrono(user.last_login),
        }
    }
}
