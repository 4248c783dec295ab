pub mod auth;
pub mod error;
pub mod extract;
pub mod invite;
pub mod middleware;
pub mod notices;
pub mod push;
pub mod reset;
pub mod upload;
pub mod users;

#[cfg(test)]
pub(crate) mod testutil;
