//! Credential handling.
//!
//! Passwords live only in [`Credentials`], which zeroes its memory on drop
//! and never prints the password in debug output.

mod credentials;

pub use credentials::Credentials;
