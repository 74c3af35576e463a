use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{UserError, UserResult};

/// Message returned when a create body carries an unusable `id`
pub const INVALID_BODY_ID: &str = "id must be a valid number";

/// User as exposed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Business identifier, unique across all users
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "ada")]
    pub username: String,
}

impl User {
    pub fn new(id: i64, email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            username: username.into(),
        }
    }

    /// Overwrite the fields present in `input`.
    pub fn apply_update(&mut self, input: UpdateUser) {
        if let Some(email) = input.email {
            self.email = email;
        }
        if let Some(username) = input.username {
            self.username = username;
        }
    }
}

/// `id` as sent in a create body.
///
/// HTML forms submit numbers as strings, so both `7` and `" 7 "` are
/// accepted. Fractions, booleans, null or a missing field are not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = i64, example = 1)]
pub struct UserIdInput(pub Value);

impl UserIdInput {
    pub fn resolve(&self) -> UserResult<i64> {
        let parsed = match &self.0 {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| UserError::InvalidId(INVALID_BODY_ID.to_string()))
    }
}

impl From<i64> for UserIdInput {
    fn from(id: i64) -> Self {
        Self(Value::from(id))
    }
}

/// DTO for creating a new user
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateUser {
    #[serde(default)]
    pub id: UserIdInput,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
}

/// DTO for updating an existing user; omitted fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 1, message = "email cannot be empty"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "username cannot be empty"))]
    pub username: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none()
    }
}

/// Body returned by the delete endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteUserResponse {
    #[schema(example = "User deleted")]
    pub message: String,
    pub user: User,
}

impl DeleteUserResponse {
    pub fn new(user: User) -> Self {
        Self {
            message: "User deleted".to_string(),
            user,
        }
    }
}

/// User as stored in MongoDB
///
/// Timestamps are optional on read so documents written by other clients
/// still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl From<User> for UserDocument {
    fn from(user: User) -> Self {
        let now = Some(DateTime::now());
        Self {
            object_id: None,
            id: user.id,
            email: user.email,
            username: user.username,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id,
            email: doc.email,
            username: doc.username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use serde_json::json;

    fn id_input(value: Value) -> UserIdInput {
        UserIdInput(value)
    }

    #[test]
    fn test_id_input_accepts_integers_and_integer_strings() {
        assert_eq!(id_input(json!(42)).resolve().unwrap(), 42);
        assert_eq!(id_input(json!(-3)).resolve().unwrap(), -3);
        assert_eq!(id_input(json!("17")).resolve().unwrap(), 17);
        assert_eq!(id_input(json!("  8 ")).resolve().unwrap(), 8);
    }

    #[test]
    fn test_id_input_rejects_everything_else() {
        for value in [
            json!("abc"),
            json!("12abc"),
            json!(""),
            json!(1.5),
            json!(true),
            json!(null),
            json!([1]),
        ] {
            let err = id_input(value.clone()).resolve().unwrap_err();
            assert!(
                matches!(err, UserError::InvalidId(ref m) if m == INVALID_BODY_ID),
                "{value}"
            );
        }
    }

    #[test]
    fn test_create_user_missing_id_defaults_to_null() {
        let input: CreateUser =
            serde_json::from_value(json!({"email": "a@x.com", "username": "a"})).unwrap();
        assert!(input.id.resolve().is_err());
    }

    #[test]
    fn test_create_user_validation() {
        let input = CreateUser {
            id: 1.into(),
            email: String::new(),
            username: "a".into(),
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_update_user_validation_skips_missing_fields() {
        assert!(UpdateUser::default().validate().is_ok());

        let input = UpdateUser {
            username: Some(String::new()),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_apply_update_only_touches_provided_fields() {
        let mut user = User::new(1, "a@x.com", "a");
        user.apply_update(UpdateUser {
            username: Some("b".into()),
            ..Default::default()
        });
        assert_eq!(user, User::new(1, "a@x.com", "b"));
    }

    #[test]
    fn test_user_serializes_without_storage_fields() {
        let doc = UserDocument::from(User::new(1, "a@x.com", "a"));
        let user = User::from(doc);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, json!({"id": 1, "email": "a@x.com", "username": "a"}));
    }

    #[test]
    fn test_document_without_timestamps_loads() {
        let raw = doc! {
            "_id": ObjectId::new(),
            "id": 5_i64,
            "email": "legacy@x.com",
            "username": "legacy",
            "__v": 0,
        };

        let document: UserDocument = mongodb::bson::from_document(raw).unwrap();
        assert!(document.created_at.is_none());
        assert_eq!(User::from(document), User::new(5, "legacy@x.com", "legacy"));
    }

    #[test]
    fn test_new_document_carries_timestamps() {
        let document = UserDocument::from(User::new(1, "a@x.com", "a"));
        assert!(document.created_at.is_some());
        assert_eq!(document.created_at, document.updated_at);
    }

    #[test]
    fn test_delete_response_shape() {
        let json = serde_json::to_value(DeleteUserResponse::new(User::new(2, "b@x.com", "b"))).unwrap();
        assert_eq!(json["message"], "User deleted");
        assert_eq!(json["user"]["id"], 2);
    }
}
