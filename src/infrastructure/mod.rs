pub mod authorized_http;
pub mod identifier_store;
pub mod token_provider;

pub use authorized_http::AuthorizedHttp;
pub use identifier_store::{
    clear_all, clear_flow, CacheKey, CookieStore, IdentifierStore, MemoryStore, SessionCache,
};
pub use token_provider::TokenProvider;
