//! Wire formats spoken on either side of the proxy

pub mod messages;
pub mod openai;
