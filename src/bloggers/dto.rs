use serde::{Deserialize, Serialize};

use super::repo_types::{Blogger, BloggerDraft};
use crate::{
    error::AppError,
    notes::{blank_to_none, is_http_url},
    response::Page,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBloggerRequest {
    #[serde(default, alias = "xhsId")]
    pub platform_id: String,
    #[serde(default)]
    pub blogger_name: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub followers_count: i64,
    pub blogger_url: Option<String>,
    pub capture_timestamp: Option<i64>,
}

impl CreateBloggerRequest {
    pub fn into_draft(self) -> Result<BloggerDraft, AppError> {
        let platform_id = self.platform_id.trim().to_string();
        if platform_id.is_empty() {
            return Err(AppError::Validation("platformId is required".into()));
        }
        let capture_timestamp = match self.capture_timestamp {
            Some(ts) if ts > 0 => ts,
            Some(_) => {
                return Err(AppError::Validation("captureTimestamp must be positive".into()))
            }
            None => return Err(AppError::Validation("captureTimestamp is required".into())),
        };
        if self.followers_count < 0 {
            return Err(AppError::Validation("followersCount must be non-negative".into()));
        }
        let blogger_url = blank_to_none(self.blogger_url);
        if let Some(url) = &blogger_url {
            if !is_http_url(url) {
                return Err(AppError::Validation(format!(
                    "bloggerUrl must be an http(s) URL: {url}"
                )));
            }
        }
        Ok(BloggerDraft {
            platform_id,
            blogger_name: self.blogger_name,
            avatar_url: blank_to_none(self.avatar_url),
            description: self.description,
            followers_count: self.followers_count,
            blogger_url,
            capture_timestamp,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBloggerRequest {
    pub blogger_name: Option<String>,
    pub avatar_url: Option<String>,
    pub description: Option<String>,
    pub followers_count: Option<i64>,
    pub blogger_url: Option<String>,
}

impl UpdateBloggerRequest {
    pub fn apply(self, b: &mut Blogger) -> Result<(), AppError> {
        if self.followers_count.is_some_and(|c| c < 0) {
            return Err(AppError::Validation("followersCount must be non-negative".into()));
        }
        if let Some(v) = self.blogger_name {
            b.blogger_name = v;
        }
        if self.avatar_url.is_some() {
            b.avatar_url = blank_to_none(self.avatar_url);
        }
        if let Some(v) = self.description {
            b.description = v;
        }
        if let Some(v) = self.followers_count {
            b.followers_count = v;
        }
        if self.blogger_url.is_some() {
            b.blogger_url = blank_to_none(self.blogger_url);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBloggersQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl ListBloggersQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.size)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBloggersResponse {
    pub bloggers: Vec<Blogger>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub total_pages: i64,
}
