use wikiact_core::{
    Action, ApiRequest, ChainedAction, CoreError, CoreResult, MediaWikiVersion, PrimaryBuilder,
    SingleShot, Versioned,
};

use super::json_request;
use super::token::TokenRequest;
use crate::parse::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub user_id: u64,
    pub username: String,
}

#[derive(Clone)]
pub struct LoginCredentials {
    username: String,
    password: String,
}

#[derive(Debug)]
pub struct LoginSubmit {
    shot: SingleShot,
    result: Option<LoginResult>,
}

impl PrimaryBuilder for LoginCredentials {
    type Action = LoginSubmit;

    fn build(self, token: String) -> CoreResult<LoginSubmit> {
        let request = json_request("login")
            .param("lgname", self.username)
            .param("lgpassword", self.password)
            .param("lgtoken", token)
            .build_post();
        Ok(LoginSubmit {
            shot: SingleShot::new(request),
            result: None,
        })
    }
}

impl Action for LoginSubmit {
    fn name(&self) -> &str {
        "login"
    }

    fn build_next_request(&mut self) -> CoreResult<Option<ApiRequest>> {
        Ok(self.shot.next_request())
    }

    fn consume_response(&mut self, text: &str) -> CoreResult<()> {
        let value = json::parse(text)?;
        json::check(&value)?;

        let login = value
            .get("login")
            .ok_or_else(|| CoreError::parse("unknown reply; not a response to a login"))?;
        let outcome = json::str_field(login, "result").unwrap_or_default();
        if outcome != "Success" {
            let reason = json::str_field(login, "reason").unwrap_or_default();
            return Err(CoreError::api(outcome, reason));
        }

        let result = LoginResult {
            user_id: login.get("lguserid").and_then(|id| id.as_u64()).unwrap_or(0),
            username: json::str_field(login, "lgusername").unwrap_or_default(),
        };
        tracing::info!(user = %result.username, "Logged in");
        self.result = Some(result);
        self.shot.mark_complete();
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.shot.is_complete()
    }
}

/// Logs in with a bot password: fetch a login token, then post the
/// credentials. Works before the server version is known.
pub struct Login {
    chain: ChainedAction<TokenRequest, LoginCredentials>,
}

impl Versioned for Login {}

impl Login {
    pub fn new(username: &str, password: &str, version: MediaWikiVersion) -> CoreResult<Self> {
        if username.trim().is_empty() {
            return Err(CoreError::invalid("username must not be empty"));
        }
        Self::admit(version)?;
        let token = TokenRequest::login(username, version)?;
        let credentials = LoginCredentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        Ok(Self {
            chain: ChainedAction::new("login", token, credentials),
        })
    }

    pub fn result(&self) -> Option<&LoginResult> {
        self.chain.primary().and_then(|submit| submit.result.as_ref())
    }
}

delegate_action!(Login, chain);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wikiact_core::testing::ScriptedTransport;
    use wikiact_core::ActionRunner;

    #[tokio::test]
    async fn test_modern_login() {
        let transport = Arc::new(ScriptedTransport::new([
            r#"{"query":{"tokens":{"logintoken":"9ed1499d99c0c34c73faa07157b3b6075b427365+\\"}}}"#,
            r#"{"login":{"result":"Success","lguserid":42,"lgusername":"CleanupBot"}}"#,
        ]));
        let runner = ActionRunner::new(transport.clone());
        let mut action = Login::new("CleanupBot@job", "s3cret", MediaWikiVersion::MW1_39).unwrap();

        runner.run(&mut action).await.unwrap();

        assert_eq!(action.result().unwrap().user_id, 42);
        let submit = &transport.requests()[1];
        assert_eq!(submit.param("lgpassword"), Some("s3cret"));
        assert!(!submit.sanitized().to_string().contains("s3cret"));
    }

    #[tokio::test]
    async fn test_failed_login_is_api_error() {
        let transport = Arc::new(ScriptedTransport::new([
            r#"{"login":{"result":"NeedToken","token":"abc"}}"#,
            r#"{"login":{"result":"Failed","reason":"Incorrect username or password entered."}}"#,
        ]));
        let runner = ActionRunner::new(transport);
        let mut action = Login::new("CleanupBot@job", "wrong", MediaWikiVersion::Unknown).unwrap();

        match runner.run(&mut action).await.unwrap_err() {
            CoreError::Api { code, info } => {
                assert_eq!(code, "Failed");
                assert!(info.contains("Incorrect"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(action.result().is_none());
    }
}
