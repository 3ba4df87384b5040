//! Admission core: turns an untrusted request into a hardened manifest.
//!
//! Flow: [`validator::Validator`] → [`quota::QuotaGate`] → [`manifest::ManifestBuilder`].

pub mod error;
pub mod manifest;
pub mod policy;
pub mod quota;
pub mod validator;
