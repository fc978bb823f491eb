//! Passwordless authentication.
//!
//! A login is two requests apart: [`Authenticator::request_login`] stores a
//! single-use token and mails a link containing it, and
//! [`Authenticator::complete_login`] consumes that token and returns a signed
//! session credential. Sessions are stateless; only magic-link tokens and
//! users are persisted.

mod authenticator;
mod email;
pub mod error;
pub mod magic;
pub mod mailer;
pub mod session;
mod token;

pub use crate::authenticator::{Authenticator, Login};
pub use crate::email::Email;
pub use crate::magic::{IssuedToken, MagicLinks};
pub use crate::mailer::{ConsoleMailer, Mailer, ResendMailer};
pub use crate::session::{Session, Sessions};
pub use crate::token::generate_token;
