//! MediaWiki actions, paginated queries and the [`MediaWikiBot`] facade.
//!
//! Everything here is built on the engine in `wikiact-core`: actions
//! implement [`wikiact_core::Action`], listings implement
//! [`wikiact_core::QueryStrategy`], and the bot drives both through an
//! [`wikiact_core::ActionRunner`] over an HTTP transport.

pub mod actions;
pub mod bot;
pub mod error;
pub mod observability;
pub mod parse;
pub mod queries;

pub use actions::{
    DeletePage, DeleteResult, EditPage, EditResult, GetRevision, ImageInfo, Login, LoginResult,
    MovePage, MoveRequest, MoveResult, RawRequest, SimpleArticle, SiteGeneral, SiteInfo,
    TokenRequest, TokenType, UserInfo, UserInfoQuery,
};
pub use bot::MediaWikiBot;
pub use error::{BotError, BotResult};
pub use observability::init_tracing;
pub use queries::{
    AllPages, Backlinks, CategoryMembers, ImageUsage, LogEvents, LogItem, RecentChanges,
    RedirectFilter,
};
