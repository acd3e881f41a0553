//! Error codes for the receipt backend API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the receipt backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication
    /// No bearer credential on a protected route
    UnauthorizedMissingBearer,
    /// Session token failed signature or structure checks
    UnauthorizedInvalidJwt,
    /// Session token is past its expiry
    UnauthorizedExpiredJwt,
    /// Session token decoded but lacks sub or email
    UnauthorizedMalformedJwt,
    /// Google credential rejected
    InvalidGoogleCredential,
    /// Google client id missing from configuration
    GoogleClientIdMissing,

    // Request validation
    /// Caller input matches no supported request shape
    InvalidRequest,
    /// Uploaded file is missing or not a supported image
    InvalidImage,

    // Resource not found
    /// Receipt absent or owned by someone else
    ReceiptNotFound,

    // Upstream collaborators
    /// Document store rejected the call or was unreachable
    StorageError,
    /// Model output failed schema validation or the model call failed
    ExtractionError,
    /// Wallet issuer rejected the object or signing failed
    WalletError,
    /// Wallet issuer not configured for this deployment
    WalletUnavailable,

    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnauthorizedMissingBearer => "UNAUTHORIZED_MISSING_BEARER",
            Self::UnauthorizedInvalidJwt => "UNAUTHORIZED_INVALID_JWT",
            Self::UnauthorizedExpiredJwt => "UNAUTHORIZED_EXPIRED_JWT",
            Self::UnauthorizedMalformedJwt => "UNAUTHORIZED_MALFORMED_JWT",
            Self::InvalidGoogleCredential => "INVALID_GOOGLE_CREDENTIAL",
            Self::GoogleClientIdMissing => "GOOGLE_CLIENT_ID_MISSING",

            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidImage => "INVALID_IMAGE",

            Self::ReceiptNotFound => "RECEIPT_NOT_FOUND",

            Self::StorageError => "STORAGE_ERROR",
            Self::ExtractionError => "EXTRACTION_ERROR",
            Self::WalletError => "WALLET_ERROR",
            Self::WalletUnavailable => "WALLET_UNAVAILABLE",

            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_strings() {
        assert_eq!(
            ErrorCode::UnauthorizedMissingBearer.as_str(),
            "UNAUTHORIZED_MISSING_BEARER"
        );
        assert_eq!(
            ErrorCode::UnauthorizedExpiredJwt.as_str(),
            "UNAUTHORIZED_EXPIRED_JWT"
        );
        assert_eq!(
            ErrorCode::UnauthorizedMalformedJwt.as_str(),
            "UNAUTHORIZED_MALFORMED_JWT"
        );
        assert_eq!(ErrorCode::ReceiptNotFound.as_str(), "RECEIPT_NOT_FOUND");
        assert_eq!(ErrorCode::WalletError.as_str(), "WALLET_ERROR");
        assert_eq!(ErrorCode::ConfigError.as_str(), "CONFIG_ERROR");
    }

    #[test]
    fn test_display_trait() {
        assert_eq!(format!("{}", ErrorCode::InvalidImage), "INVALID_IMAGE");
        assert_eq!(format!("{}", ErrorCode::StorageError), "STORAGE_ERROR");
    }
}
