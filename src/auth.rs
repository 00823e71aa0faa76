//! Session credentials, partition identifiers, and the token shapes carried by responses.

pub mod id;
pub mod token;

pub use id::*;
pub use token::{collection::*, credential::*, partition::*, secret::*};
