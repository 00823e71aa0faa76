//! Token value types: redacted secrets, bearer/refresh credentials, partition tokens, and
//! the response envelope that carries fresh ones.

pub mod collection;
pub mod credential;
pub mod partition;
pub mod secret;
