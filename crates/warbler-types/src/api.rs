use serde::{Deserialize, Serialize};

use crate::models::{Account, Message, NewAccount, ProfileCounts, ProfileUpdate};

// -- Session --

/// Claims carried in the signed session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i64,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image_url: Option<String>,
}

impl From<SignupForm> for NewAccount {
    fn from(form: SignupForm) -> Self {
        Self {
            username: form.username.filter(|v| !v.trim().is_empty()),
            email: form.email.filter(|v| !v.trim().is_empty()),
            password: form.password.filter(|v| !v.trim().is_empty()),
            image_url: form.image_url.filter(|url| !url.is_empty()),
        }
    }
}

/// Describes a form a client should render, in place of a template.
#[derive(Debug, Serialize, Deserialize)]
pub struct FormResponse {
    pub heading: String,
    pub action: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Profile edit form. `password` re-authenticates the current account.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: String,
}

impl From<ProfileForm> for ProfileUpdate {
    fn from(form: ProfileForm) -> Self {
        Self {
            username: form.username,
            email: form.email,
            image_url: form.image_url,
            header_image_url: form.header_image_url,
            bio: form.bio,
            location: form.location,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: Account,
    pub counts: ProfileCounts,
    pub messages: Vec<Message>,
    pub liked_message_ids: Vec<i64>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComposeResponse {
    pub user: Account,
    pub max_length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: Message,
    pub author: Account,
}

// -- Home --

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeResponse {
    pub user: Option<Account>,
    pub counts: Option<ProfileCounts>,
    pub messages: Vec<Message>,
    pub liked_message_ids: Vec<i64>,
}
