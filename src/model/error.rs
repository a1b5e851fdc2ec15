//! Error objects the API responds with.

use std::fmt;

use serde::{de::Visitor, Deserialize};

/// The body of a failed API request, `{"error": {"status": 401, "message": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ApiError {
    #[allow(dead_code)]
    pub status: u16,
    pub message: ApiErrorMessage,
}

/// The reason the API gave for a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiErrorMessage {
    PermissionsMissing,
    TokenExpired,
    NoActiveDevice,

    Other(String),
}

impl ApiErrorResponse {
    /// Parse an error body. Returns `None` if the body isn't an API error object.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

impl fmt::Display for ApiErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorMessage::PermissionsMissing => f.write_str("permissions missing"),
            ApiErrorMessage::TokenExpired => f.write_str("access token expired"),
            ApiErrorMessage::NoActiveDevice => f.write_str("no active device"),
            ApiErrorMessage::Other(message) => f.write_str(message),
        }
    }
}

impl<'de> Deserialize<'de> for ApiErrorMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ApiErrorMessageVisitor;

        impl<'de> Visitor<'de> for ApiErrorMessageVisitor {
            type Value = ApiErrorMessage;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_string(v.to_owned())
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match v.as_str() {
                    "Permissions missing" => Ok(ApiErrorMessage::PermissionsMissing),
                    "The access token expired" | "Token expired" => Ok(ApiErrorMessage::TokenExpired),
                    "Player command failed: No active device found" => Ok(ApiErrorMessage::NoActiveDevice),

                    _ => Ok(ApiErrorMessage::Other(v)),
                }
            }
        }

        deserializer.deserialize_str(ApiErrorMessageVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_expired_token() {
        let response =
            ApiErrorResponse::parse(r#"{"error": {"status": 401, "message": "The access token expired"}}"#).unwrap();

        assert_eq!(response.error.status, 401);
        assert_eq!(response.error.message, ApiErrorMessage::TokenExpired);
    }

    #[test]
    fn parse_other_message() {
        let response = ApiErrorResponse::parse(r#"{"error": {"status": 401, "message": "Invalid access token"}}"#).unwrap();

        assert_eq!(
            response.error.message,
            ApiErrorMessage::Other(String::from("Invalid access token"))
        );
    }

    #[test]
    fn parse_non_error_body() {
        assert!(ApiErrorResponse::parse("<html>Bad gateway</html>").is_none());
        assert!(ApiErrorResponse::parse("").is_none());
    }
}
