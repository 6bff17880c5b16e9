//! High-level facade over one wiki
//!
//! `MediaWikiBot` owns the transport and the negotiated server version.
//! Gated operations negotiate the version on first use; once known, the
//! version never changes for the lifetime of the bot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use wikiact_config::{BotConfig, Credentials};
use wikiact_connectors::HttpTransport;
use wikiact_core::{
    Action, ActionRunner, CoreError, MediaWikiVersion, QueryFactory, QueryStrategy, Transport,
};

use crate::actions::{
    DeletePage, DeleteResult, EditPage, EditResult, GetRevision, ImageInfo, Login, LoginResult,
    MovePage, MoveRequest, MoveResult, SimpleArticle, SiteGeneral, SiteInfo, UserInfo,
    UserInfoQuery,
};
use crate::error::{BotError, BotResult};
use crate::queries::{
    AllPages, Backlinks, CategoryMembers, ImageUsage, LogEvents, RecentChanges, DEFAULT_LIMIT,
};

pub struct MediaWikiBot {
    runner: ActionRunner,
    host_url: String,
    version: OnceLock<MediaWikiVersion>,
    logged_in: AtomicBool,
    default_limit: u32,
}

impl MediaWikiBot {
    /// `host_url` is the wiki's script path, used to resolve relative links.
    pub fn new(transport: Arc<dyn Transport>, host_url: impl Into<String>) -> Self {
        Self {
            runner: ActionRunner::new(transport),
            host_url: host_url.into(),
            version: OnceLock::new(),
            logged_in: AtomicBool::new(false),
            default_limit: DEFAULT_LIMIT,
        }
    }

    /// Build an HTTP-backed bot. Credentials in the config are not used
    /// until [`connect`](Self::connect) or [`login_with`](Self::login_with).
    pub fn from_config(config: &BotConfig) -> BotResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.connection.clone())?;

        let mut bot = Self::new(Arc::new(transport), config.connection.base_url.clone());
        bot.default_limit = config.query.default_limit;
        Ok(bot)
    }

    /// [`from_config`](Self::from_config), then log in when credentials are
    /// configured and negotiate the version.
    pub async fn connect(config: &BotConfig) -> BotResult<Self> {
        let bot = Self::from_config(config)?;
        match &config.credentials {
            Some(credentials) => {
                bot.login_with(credentials).await?;
            }
            None => {
                bot.negotiate_version().await?;
            }
        }
        Ok(bot)
    }

    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// The negotiated version, or `Unknown` before negotiation.
    pub fn version(&self) -> MediaWikiVersion {
        self.version.get().copied().unwrap_or_default()
    }

    /// Ask the server for its version and remember it. A version
    /// negotiated earlier is kept.
    pub async fn negotiate_version(&self) -> BotResult<MediaWikiVersion> {
        if let Some(version) = self.version.get() {
            return Ok(*version);
        }

        let general = self.site_info().await?;
        let version = *self.version.get_or_init(|| general.version);
        tracing::info!(
            sitename = %general.sitename,
            generator = %general.generator,
            version = %version,
            "Negotiated server version"
        );
        Ok(version)
    }

    async fn ensure_version(&self) -> BotResult<MediaWikiVersion> {
        match self.version.get() {
            Some(version) => Ok(*version),
            None => self.negotiate_version().await,
        }
    }

    /// Log in, then negotiate the version if not done yet.
    pub async fn login(&self, username: &str, password: &str) -> BotResult<LoginResult> {
        let mut action = Login::new(username, password, self.version())?;
        self.perform_action(&mut action).await?;
        let result = action.result().cloned().ok_or_else(|| missing_result("login"))?;
        self.logged_in.store(true, Ordering::Release);

        self.negotiate_version().await?;
        Ok(result)
    }

    /// Whether a login on this bot has succeeded.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::Acquire)
    }

    pub async fn login_with(&self, credentials: &Credentials) -> BotResult<LoginResult> {
        self.login(&credentials.username, &credentials.password).await
    }

    /// Run any action to completion. Returns the number of round trips.
    pub async fn perform_action<A: Action + ?Sized>(&self, action: &mut A) -> BotResult<usize> {
        Ok(self.runner.run(action).await?)
    }

    pub async fn site_info(&self) -> BotResult<SiteGeneral> {
        let mut action = SiteInfo::new();
        self.perform_action(&mut action).await?;
        action.into_general().ok_or_else(|| missing_result("siteinfo"))
    }

    pub async fn user_info(&self) -> BotResult<UserInfo> {
        let mut action = UserInfoQuery::new();
        self.perform_action(&mut action).await?;
        action.into_info().ok_or_else(|| missing_result("userinfo"))
    }

    pub async fn read_content(&self, title: &str) -> BotResult<SimpleArticle> {
        let mut action = GetRevision::new(title, self.ensure_version().await?)?;
        self.perform_action(&mut action).await?;
        action.into_article().ok_or_else(|| missing_result("get_revision"))
    }

    /// Save an article. Anonymous edits are refused; log in first.
    pub async fn write_content(&self, article: SimpleArticle) -> BotResult<EditResult> {
        if !self.is_logged_in() {
            return Err(BotError::permission(format!(
                "log in before writing '{}'",
                article.title
            )));
        }
        let mut action = EditPage::new(article, self.ensure_version().await?)?;
        self.perform_action(&mut action).await?;
        action.result().cloned().ok_or_else(|| missing_result("edit_page"))
    }

    /// Save articles one after another, stopping at the first failure.
    pub async fn write_many_content<I>(&self, articles: I) -> BotResult<Vec<EditResult>>
    where
        I: IntoIterator<Item = SimpleArticle>,
    {
        let mut results = Vec::new();
        for article in articles {
            results.push(self.write_content(article).await?);
        }
        Ok(results)
    }

    /// Move a page after checking that the current user holds the `move`
    /// right, and `move-subpages` when subpages go along.
    pub async fn move_page(&self, request: MoveRequest) -> BotResult<MoveResult> {
        let version = self.ensure_version().await?;
        let user = self.user_info().await?;
        if !user.has_right("move") {
            return Err(BotError::permission(format!("user '{}' may not move pages", user.name)));
        }
        if request.move_subpages && !user.has_right("move-subpages") {
            return Err(BotError::permission(format!(
                "user '{}' may not move subpages",
                user.name
            )));
        }

        let mut action = MovePage::new(request, version)?;
        self.perform_action(&mut action).await?;
        action.result().cloned().ok_or_else(|| missing_result("move_page"))
    }

    pub async fn delete_page(&self, title: &str, reason: Option<&str>) -> BotResult<DeleteResult> {
        let mut action = DeletePage::new(title, reason, self.ensure_version().await?)?;
        self.perform_action(&mut action).await?;
        action.result().cloned().ok_or_else(|| missing_result("delete_page"))
    }

    /// Absolute URL of an uploaded file.
    pub async fn image_url(&self, name: &str) -> BotResult<String> {
        let mut action = ImageInfo::new(name, Some(&self.host_url), self.ensure_version().await?)?;
        self.perform_action(&mut action).await?;
        Ok(action.url()?)
    }

    /// A factory for any query strategy, gated against the negotiated version.
    pub async fn query<S: QueryStrategy>(&self, strategy: S) -> BotResult<QueryFactory<S>> {
        let version = self.ensure_version().await?;
        Ok(QueryFactory::new(strategy, self.runner.clone(), version)?)
    }

    pub async fn recent_changes(&self, namespaces: &[i32]) -> BotResult<QueryFactory<RecentChanges>> {
        self.query(RecentChanges::new(namespaces, self.default_limit)?).await
    }

    pub async fn image_usage(&self, image: &str, namespaces: &[i32]) -> BotResult<QueryFactory<ImageUsage>> {
        self.query(ImageUsage::new(image, namespaces, self.default_limit)?).await
    }

    pub async fn log_events(&self, log_type: Option<&str>) -> BotResult<QueryFactory<LogEvents>> {
        self.query(LogEvents::new(log_type, self.default_limit)?).await
    }

    pub async fn all_pages(&self, namespace: i32, prefix: Option<&str>) -> BotResult<QueryFactory<AllPages>> {
        let mut strategy = AllPages::new(namespace, self.default_limit)?;
        if let Some(prefix) = prefix {
            strategy = strategy.with_prefix(prefix);
        }
        self.query(strategy).await
    }

    pub async fn category_members(
        &self,
        category: &str,
        namespaces: &[i32],
    ) -> BotResult<QueryFactory<CategoryMembers>> {
        self.query(CategoryMembers::new(category, namespaces, self.default_limit)?).await
    }

    pub async fn backlinks(&self, title: &str, namespaces: &[i32]) -> BotResult<QueryFactory<Backlinks>> {
        self.query(Backlinks::new(title, namespaces, self.default_limit)?).await
    }
}

fn missing_result(action: &str) -> BotError {
    CoreError::ContractViolation(format!("action '{}' completed without a result", action)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use wikiact_connectors::{RetryPolicy, WikiConnection};
    use wikiact_core::testing::ScriptedTransport;

    const SITEINFO_139: &str = r#"{"batchcomplete":"","query":{"general":{"mainpage":"Main Page","base":"https://wiki.example.org/wiki/Main_Page","sitename":"Example Wiki","generator":"MediaWiki 1.39.3","server":"https://wiki.example.org","lang":"en"}}}"#;
    const SITEINFO_115: &str = r#"{"query":{"general":{"sitename":"Old Wiki","generator":"MediaWiki 1.15.1"}}}"#;

    fn config(server: &MockServer) -> BotConfig {
        BotConfig::new(WikiConnection::new(server.url("/w/")).with_retry_policy(RetryPolicy::disabled()))
    }

    fn siteinfo_mock<'a>(server: &'a MockServer, body: &str) -> httpmock::Mock<'a> {
        server.mock(|when, then| {
            when.method(GET).path("/w/api.php").query_param("meta", "siteinfo");
            then.status(200).body(body);
        })
    }

    #[tokio::test]
    async fn test_version_negotiated_once() {
        let server = MockServer::start();
        let siteinfo = siteinfo_mock(&server, SITEINFO_139);

        let bot = MediaWikiBot::from_config(&config(&server)).unwrap();
        assert_eq!(bot.version(), MediaWikiVersion::Unknown);

        assert_eq!(bot.negotiate_version().await.unwrap(), MediaWikiVersion::MW1_39);
        assert_eq!(bot.negotiate_version().await.unwrap(), MediaWikiVersion::MW1_39);
        assert_eq!(bot.version(), MediaWikiVersion::MW1_39);
        siteinfo.assert_hits(1);
    }

    #[tokio::test]
    async fn test_login_then_negotiation() {
        let server = MockServer::start();
        let handshake = server.mock(|when, then| {
            when.method(POST)
                .path("/w/api.php")
                .body("action=login&format=json&lgname=Bot");
            then.status(200)
                .header("Set-Cookie", "wikisession=s1; Path=/")
                .body(r#"{"login":{"result":"NeedToken","token":"lt+\\"}}"#);
        });
        let submit = server.mock(|when, then| {
            when.method(POST)
                .path("/w/api.php")
                .body_contains("lgpassword=s3cret")
                .body_contains("lgtoken=lt%2B%5C");
            then.status(200)
                .body(r#"{"login":{"result":"Success","lguserid":7,"lgusername":"Bot"}}"#);
        });
        let siteinfo = server.mock(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("meta", "siteinfo")
                .header("cookie", "wikisession=s1");
            then.status(200).body(SITEINFO_139);
        });

        let mut config = config(&server);
        config.credentials = Some(Credentials::new("Bot", "s3cret"));
        let bot = MediaWikiBot::connect(&config).await.unwrap();

        assert_eq!(bot.version(), MediaWikiVersion::MW1_39);
        handshake.assert();
        submit.assert();
        siteinfo.assert();
    }

    #[tokio::test]
    async fn test_read_content_negotiates_first() {
        let server = MockServer::start();
        let siteinfo = siteinfo_mock(&server, SITEINFO_139);
        let revision = server.mock(|when, then| {
            when.method(GET)
                .path("/w/api.php")
                .query_param("prop", "revisions")
                .query_param("titles", "Main Page")
                .query_param("rvslots", "main");
            then.status(200).body(
                r#"{"query":{"pages":{"1":{"title":"Main Page","revisions":[{"revid":5,"user":"Admin","comment":"","slots":{"main":{"*":"Welcome"}}}]}}}}"#,
            );
        });

        let bot = MediaWikiBot::from_config(&config(&server)).unwrap();
        let article = bot.read_content("Main Page").await.unwrap();

        assert_eq!(article.text, "Welcome");
        assert_eq!(article.revision_id, Some(5));
        siteinfo.assert();
        revision.assert();
    }

    #[tokio::test]
    async fn test_move_page_requires_right() {
        let transport = Arc::new(ScriptedTransport::new([
            SITEINFO_139,
            r#"{"query":{"userinfo":{"id":0,"name":"127.0.0.1","anon":"","rights":["read","edit"],"groups":["*"]}}}"#,
        ]));
        let bot = MediaWikiBot::new(transport.clone(), "https://wiki.example.org/w/");

        let err = bot.move_page(MoveRequest::new("A", "B")).await.unwrap_err();
        assert!(matches!(err, BotError::Permission(_)));
        // no token request was sent
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_move_subpages_requires_right() {
        let transport = Arc::new(ScriptedTransport::new([
            SITEINFO_139,
            r#"{"query":{"userinfo":{"id":3,"name":"Bot","rights":["read","move"],"groups":["user"]}}}"#,
        ]));
        let bot = MediaWikiBot::new(transport, "https://wiki.example.org/w/");

        let err = bot
            .move_page(MoveRequest::new("A", "B").with_subpages(true))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Permission(ref msg) if msg.contains("subpages")));
    }

    #[tokio::test]
    async fn test_move_page_legacy_token() {
        let transport = Arc::new(ScriptedTransport::new([
            SITEINFO_115,
            r#"{"query":{"userinfo":{"id":3,"name":"Bot","rights":["move"],"groups":["user"]}}}"#,
            r#"{"query":{"pages":{"4":{"title":"A","movetoken":"m1+\\"}}}}"#,
            r#"{"move":{"from":"A","to":"B","reason":"rename"}}"#,
        ]));
        let bot = MediaWikiBot::new(transport.clone(), "https://wiki.example.org/w/");

        let result = bot
            .move_page(MoveRequest::new("A", "B").with_reason("rename"))
            .await
            .unwrap();

        assert_eq!(result.to, "B");
        let requests = transport.requests();
        assert_eq!(requests[2].param("intoken"), Some("move"));
        assert_eq!(requests[3].param("token"), Some("m1+\\"));
    }

    #[tokio::test]
    async fn test_gated_operation_on_old_server() {
        let transport = Arc::new(ScriptedTransport::new([
            r#"{"query":{"general":{"sitename":"Ancient","generator":"MediaWiki 1.10.0"}}}"#,
        ]));
        let bot = MediaWikiBot::new(transport.clone(), "https://wiki.example.org/w/");

        let err = bot.image_usage("Example.jpg", &[]).await.unwrap_err();
        assert!(matches!(err.as_core(), Some(CoreError::UnsupportedVersion { .. })));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_image_url_relative() {
        let server = MockServer::start();
        siteinfo_mock(&server, SITEINFO_139);
        server.mock(|when, then| {
            when.method(GET).path("/w/api.php").query_param("prop", "imageinfo");
            then.status(200).body(
                r#"{"query":{"pages":{"9":{"title":"File:Example.jpg","imageinfo":[{"url":"/w/images/a/ab/Example.jpg"}]}}}}"#,
            );
        });

        let bot = MediaWikiBot::from_config(&config(&server)).unwrap();
        let url = bot.image_url("Example.jpg").await.unwrap();
        assert_eq!(url, server.url("/w/images/a/ab/Example.jpg"));
    }

    #[tokio::test]
    async fn test_query_factory_uses_default_limit() {
        let transport = Arc::new(ScriptedTransport::new([
            SITEINFO_139,
            r#"{"batchcomplete":"","query":{"recentchanges":[{"title":"A"},{"title":"B"}]}}"#,
        ]));
        let bot = MediaWikiBot::new(transport.clone(), "https://wiki.example.org/w/").with_default_limit(7);

        let factory = bot.recent_changes(&[0]).await.unwrap();
        assert_eq!(factory.collect_all().await.unwrap(), vec!["A", "B"]);
        assert_eq!(transport.requests()[1].param("rclimit"), Some("7"));
    }

    #[tokio::test]
    async fn test_write_requires_login() {
        let transport = Arc::new(ScriptedTransport::new(Vec::<String>::new()));
        let bot = MediaWikiBot::new(transport.clone(), "https://wiki.example.org/w/");

        let err = bot
            .write_content(SimpleArticle::new("Sandbox", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Permission(ref msg) if msg.contains("Sandbox")));
        assert!(!bot.is_logged_in());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_write_many_after_login() {
        let transport = Arc::new(ScriptedTransport::new([
            r#"{"login":{"result":"NeedToken","token":"lt"}}"#,
            r#"{"login":{"result":"Success","lguserid":7,"lgusername":"Bot"}}"#,
            SITEINFO_139,
            r#"{"query":{"tokens":{"csrftoken":"e1+\\"}}}"#,
            r#"{"edit":{"result":"Success","title":"One","newrevid":11}}"#,
            r#"{"query":{"tokens":{"csrftoken":"e2+\\"}}}"#,
            r#"{"edit":{"result":"Success","title":"Two","newrevid":12}}"#,
        ]));
        let bot = MediaWikiBot::new(transport.clone(), "https://wiki.example.org/w/");
        bot.login("Bot", "s3cret").await.unwrap();
        assert!(bot.is_logged_in());

        let results = bot
            .write_many_content([
                SimpleArticle::new("One", "first"),
                SimpleArticle::new("Two", "second").with_summary("batch"),
            ])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].new_revid, Some(11));
        assert_eq!(results[1].title, "Two");
        let requests = transport.requests();
        assert_eq!(requests.len(), 7);
        assert_eq!(requests[4].param("title"), Some("One"));
        assert_eq!(requests[6].param("summary"), Some("batch"));
        assert_eq!(requests[6].param("token"), Some("e2+\\"));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = BotConfig::new(WikiConnection::new("https://wiki.example.org/w/"));
        config.query.default_limit = 0;
        assert!(matches!(MediaWikiBot::from_config(&config), Err(BotError::Config(_))));
    }
}
