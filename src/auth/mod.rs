pub mod keys;

pub use keys::{bearer_token, generate_api_key, hash_api_key};
