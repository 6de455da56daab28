//! API result codes and the uniform response envelope.
//!
//! Every entry point answers with `{code, msg, data}`; `data` is only
//! populated when `code` is [`ApiCode::Success`]. State-conflict
//! conditions get distinct codes so clients can branch deterministically;
//! dependency failures are collapsed into [`ApiCode::InternalError`] so
//! storage details never leak.

use serde::Serialize;

/// Closed set of result codes returned by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ApiCode {
    Success = 1000,
    InvalidParam = 1001,

    EmailAlreadyExists = 1010,
    UsernameAlreadyExists = 1011,
    CodeExpired = 1012,
    CodeMismatch = 1013,
    UsernameNotFound = 1014,
    WrongPassword = 1015,
    UserNotFound = 1016,
    InvalidEmailFormat = 1017,

    TestCaseFormatError = 1020,
    ProblemAlreadyExists = 1021,
    ProblemNotFound = 1022,

    Unimplemented = 1030,

    InternalError = 1500,
}

impl ApiCode {
    pub fn value(&self) -> u32 {
        *self as u32
    }

    pub fn msg(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InvalidParam => "invalid parameter",
            Self::EmailAlreadyExists => "email already registered",
            Self::UsernameAlreadyExists => "username already taken",
            Self::CodeExpired => "verification code expired",
            Self::CodeMismatch => "wrong verification code",
            Self::UsernameNotFound => "username does not exist",
            Self::WrongPassword => "wrong password",
            Self::UserNotFound => "user does not exist",
            Self::InvalidEmailFormat => "invalid email format",
            Self::TestCaseFormatError => "malformed test case",
            Self::ProblemAlreadyExists => "problem title already exists",
            Self::ProblemNotFound => "problem does not exist",
            Self::Unimplemented => "operation not supported",
            Self::InternalError => "internal server error",
        }
    }
}

/// Uniform `{code, msg, data}` response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u32,
    pub msg: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success envelope with payload.
    pub fn ok(data: T) -> Self {
        Self {
            code: ApiCode::Success.value(),
            msg: ApiCode::Success.msg(),
            data: Some(data),
        }
    }

    /// Failure envelope; the payload is always absent.
    pub fn err(code: ApiCode) -> Self {
        Self {
            code: code.value(),
            msg: code.msg(),
            data: None,
        }
    }
}

/// Success envelope with no payload.
impl ApiResponse<()> {
    pub fn ok_empty() -> Self {
        Self {
            code: ApiCode::Success.value(),
            msg: ApiCode::Success.msg(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let all = [
            ApiCode::Success,
            ApiCode::InvalidParam,
            ApiCode::EmailAlreadyExists,
            ApiCode::UsernameAlreadyExists,
            ApiCode::CodeExpired,
            ApiCode::CodeMismatch,
            ApiCode::UsernameNotFound,
            ApiCode::WrongPassword,
            ApiCode::UserNotFound,
            ApiCode::InvalidEmailFormat,
            ApiCode::TestCaseFormatError,
            ApiCode::ProblemAlreadyExists,
            ApiCode::ProblemNotFound,
            ApiCode::Unimplemented,
            ApiCode::InternalError,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.value(), b.value());
            }
        }
    }

    #[test]
    fn failure_envelope_has_no_data() {
        let resp: ApiResponse<String> = ApiResponse::err(ApiCode::WrongPassword);
        assert_eq!(resp.code, 1015);
        assert!(resp.data.is_none());
    }
}
