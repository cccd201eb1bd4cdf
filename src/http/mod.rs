//! Concrete HTTP adapter (C3) backed by `reqwest`.

mod client;
mod user_agent;

pub use client::ReqwestHttpClient;
pub use user_agent::{resolve_user_agent, USER_AGENT};
