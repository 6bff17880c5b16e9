use serde::{Deserialize, Serialize};
use wikiact_core::{Action, ApiRequest, CoreError, CoreResult, SingleShot, Versioned};

use super::json_request;
use crate::parse::json;

/// The logged-in user (or the anonymous one) as reported by `meta=userinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub id: u64,
    pub rights: Vec<String>,
    pub groups: Vec<String>,
    pub anonymous: bool,
}

impl UserInfo {
    pub fn has_right(&self, right: &str) -> bool {
        self.rights.iter().any(|r| r == right)
    }
}

#[derive(Debug)]
pub struct UserInfoQuery {
    shot: SingleShot,
    info: Option<UserInfo>,
}

impl Versioned for UserInfoQuery {}

impl UserInfoQuery {
    pub fn new() -> Self {
        let request = json_request("query")
            .param("meta", "userinfo")
            .param("uiprop", "rights|groups")
            .build_get();
        Self {
            shot: SingleShot::new(request),
            info: None,
        }
    }

    pub fn info(&self) -> Option<&UserInfo> {
        self.info.as_ref()
    }

    pub fn into_info(self) -> Option<UserInfo> {
        self.info
    }
}

impl Default for UserInfoQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl Action for UserInfoQuery {
    fn name(&self) -> &str {
        "userinfo"
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        let value = json::parse(text)?;
        json::check(&value)?;

        let user = value
            .pointer("/query/userinfo")
            .ok_or_else(|| CoreError::parse("userinfo response has no query.userinfo"))?;

        self.info = Some(UserInfo {
            name: json::str_field(user, "name").unwrap_or_default(),
            id: user.get("id").and_then(|id| id.as_u64()).unwrap_or(0),
            rights: json::string_list(user, "rights"),
            groups: json::string_list(user, "groups"),
            anonymous: json::flag(user, "anon"),
        });
        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_rights() {
        let mut action = UserInfoQuery::new();
        action.build_next_request().unwrap();
        action
            .consume_response(
                r#"{"query":{"userinfo":{"id":7,"name":"CleanupBot","groups":["*","user","bot"],"rights":["read","edit","move"]}}}"#,
            )
            .unwrap();

        let info = action.info().unwrap();
        assert_eq!(info.id, 7);
        assert!(info.has_right("move"));
        assert!(!info.has_right("move-subpages"));
        assert!(!info.anonymous);
    }

    #[test]
    fn test_anonymous_user() {
        let mut action = UserInfoQuery::new();
        action.build_next_request().unwrap();
        action
            .consume_response(r#"{"query":{"userinfo":{"id":0,"name":"127.0.0.1","anon":""}}}"#)
            .unwrap();
        assert!(action.info().unwrap().anonymous);
        assert!(action.info().unwrap().rights.is_empty());
    }
}
