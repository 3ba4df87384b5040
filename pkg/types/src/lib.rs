pub mod config;
pub mod deployment;
pub mod object;
pub mod pod;
pub mod principal;
pub mod request;
pub mod secret;
pub mod service;
pub mod validate;
pub mod volume;
