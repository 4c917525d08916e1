use serde::Serialize;
use utoipa::ToSchema;

/// Collection metadata for list envelopes. Listings here are unpaginated,
/// so the only datum is the item count.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub total: Option<i64>,
}

impl Meta {
    pub fn total(total: i64) -> Self {
        Self { total: Some(total) }
    }

    pub fn empty() -> Self {
        Self { total: None }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_meta_carries_the_item_count() {
        let resp = ApiResponse::success("Ok", vec![1, 2, 3], Some(Meta::total(3)));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["meta"]["total"], 3);
        assert_eq!(json["message"], "Ok");
    }

    #[test]
    fn empty_meta_serializes_a_null_total() {
        let json = serde_json::to_value(Meta::empty()).unwrap();
        assert_eq!(json["total"], serde_json::Value::Null);
    }
}
