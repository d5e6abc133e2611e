use serde::{Deserialize, Serialize};

/// The response envelope every marketplace endpoint speaks:
/// `{ "success": bool, "message"?: string, "data": T }`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn ok_with(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

/// One entry of an enum option list, e.g. a cuisine or difficulty value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub value: String,
}
