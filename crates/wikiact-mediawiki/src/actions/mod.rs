//! Concrete MediaWiki API actions

/// Implement [`Action`](wikiact_core::Action) for a wrapper by forwarding to
/// one of its fields.
macro_rules! delegate_action {
    ($ty:ty, $field:ident) => {
        impl wikiact_core::Action for $ty {
            fn name(&self) -> &str {
                wikiact_core::Action::name(&self.$field)
            }

            fn build_next_request(&mut self) -> wikiact_core::CoreResult<Option<wikiact_core::ApiRequest>> {
                wikiact_core::Action::build_next_request(&mut self.$field)
            }

            fn consume_response(&mut self, text: &str) -> wikiact_core::CoreResult<()> {
                wikiact_core::Action::consume_response(&mut self.$field, text)
            }

            fn is_complete(&self) -> bool {
                wikiact_core::Action::is_complete(&self.$field)
            }
        }
    };
}

mod delete;
mod edit;
mod imageinfo;
mod login;
mod move_page;
mod raw;
mod revision;
mod siteinfo;
mod token;
mod userinfo;

pub use delete::{DeletePage, DeleteResult};
pub use edit::{EditPage, EditResult};
pub use imageinfo::ImageInfo;
pub use login::{Login, LoginResult};
pub use move_page::{MovePage, MoveRequest, MoveResult};
pub use raw::RawRequest;
pub use revision::{GetRevision, SimpleArticle};
pub use siteinfo::{SiteGeneral, SiteInfo};
pub use token::{TokenRequest, TokenType};
pub use userinfo::{UserInfo, UserInfoQuery};

use wikiact_core::{ApiRequestBuilder, ResponseFormat};

/// `action=<action>&format=json`
pub(crate) fn json_request(action: &str) -> ApiRequestBuilder {
    ApiRequestBuilder::new()
        .action(action)
        .format(ResponseFormat::Json)
}

/// Prefix `title` with `namespace:` unless it already carries one of the
/// accepted prefixes.
pub(crate) fn with_namespace(title: &str, namespace: &str, aliases: &[&str]) -> String {
    let has_prefix = std::iter::once(namespace)
        .chain(aliases.iter().copied())
        .any(|ns| {
            title
                .split_once(':')
                .is_some_and(|(prefix, _)| prefix.trim().eq_ignore_ascii_case(ns))
        });
    if has_prefix {
        title.to_string()
    } else {
        format!("{}:{}", namespace, title)
    }
}
