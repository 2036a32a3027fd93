//! Request matching model: value matchers, URL matchers and the request
//! pattern that groups them.

mod credentials;
mod custom;
mod multipart;
mod request;
mod url;
mod value;

pub use credentials::BasicCredentials;
pub use custom::CustomMatcherDefinition;
pub use multipart::{MultipartMatchingType, MultipartValuePattern, MultipartValuePatternBuilder};
pub use request::{RequestPattern, RequestPatternBuilder};
pub use url::{UrlMatchingStrategy, UrlMatchingType};
pub use value::{MatchOptions, Matcher, MatchingType, PathExpression, ValueMatchingStrategy};
