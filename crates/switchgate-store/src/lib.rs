// ABOUTME: Persistence layer for switchgate, holding the administrative credential on disk.
// ABOUTME: Loads or generates the admin token and derives the read-only guest token from it.

pub mod token;

pub use token::{
    Credentials, GUEST_TOKEN_LEN, TOKEN_LEN, TokenError, TokenStore, derive_guest_token,
    generate_token,
};
