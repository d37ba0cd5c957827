//! Locally synthesised records used when the remote blocks a request

use chrono::{SecondsFormat, Utc};

use crate::types::{ApiResponse, CreatedUser, UpdatedUser, User, UserFixture, UserId, UserPage};

/// Id carried by the mocked create response
pub const MOCK_USER_ID: &str = "12345";

/// Current time as `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn created_user(fixture: &UserFixture) -> CreatedUser {
    created_user_with_id(fixture, MOCK_USER_ID)
}

/// Mock create response with a unique, time-derived id
pub fn created_user_unique(fixture: &UserFixture) -> CreatedUser {
    let id = Utc::now().timestamp_millis().to_string();
    created_user_with_id(fixture, &id)
}

fn created_user_with_id(fixture: &UserFixture, id: &str) -> CreatedUser {
    CreatedUser {
        id: UserId::Text(id.to_string()),
        name: fixture.name.clone(),
        job: fixture.job.clone(),
        created_at: now_timestamp(),
    }
}

pub fn updated_user(fixture: &UserFixture) -> UpdatedUser {
    UpdatedUser {
        name: fixture.name.clone(),
        job: fixture.job.clone(),
        updated_at: now_timestamp(),
    }
}

pub fn user_page() -> UserPage {
    let data = vec![
        mock_user(1, "George", "Bluth"),
        mock_user(2, "Janet", "Weaver"),
    ];
    UserPage {
        page: 2,
        per_page: data.len() as u32,
        total: data.len() as u32,
        total_pages: 1,
        data,
    }
}

fn mock_user(id: u64, first: &str, last: &str) -> User {
    User {
        id: UserId::Number(id),
        email: format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
        first_name: first.to_string(),
        last_name: last.to_string(),
        avatar: format!("https://reqres.in/img/faces/{}-image.jpg", id),
    }
}

/// `204 No Content` with an empty object body
pub fn deleted() -> ApiResponse {
    ApiResponse {
        status: 204,
        body: serde_json::json!({}),
        raw_body: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_user_echoes_fixture() {
        let fixture = UserFixture::create();
        let user = created_user(&fixture);
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.job, "Software Engineer");
        assert_eq!(user.id, UserId::Text(MOCK_USER_ID.to_string()));
        assert!(user.created_at.ends_with('Z'));
    }

    #[test]
    fn test_unique_ids_are_numeric_strings() {
        let user = created_user_unique(&UserFixture::create());
        let UserId::Text(id) = &user.id else {
            panic!("expected a string id");
        };
        assert!(!id.is_empty());
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_user_page_emails() {
        let page = user_page();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].email, "george.bluth@reqres.in");
        assert_eq!(page.data[1].avatar, "https://reqres.in/img/faces/2-image.jpg");
    }
}
