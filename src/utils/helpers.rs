use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};

use crate::utils::error::CustomError;

/// Reading speed used to estimate read time.
pub const WORDS_PER_MINUTE: usize = 200;

/// Name reported in every response body.
pub fn service_name() -> String {
    std::env::var("SERVICE_NAME").unwrap_or_else(|_| "fpv-blog-backend".to_string())
}

/// Estimated minutes to read `content`, never less than one.
pub fn estimate_read_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Fallback display name: the part of an email before the `@`.
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, CustomError> {
    ObjectId::parse_str(raw)
        .map_err(|_| CustomError::BadRequestError(format!("Invalid {} ID", what)))
}

pub fn to_chrono(value: bson::DateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

pub fn now() -> bson::DateTime {
    bson::DateTime::from_millis(Utc::now().timestamp_millis())
}
