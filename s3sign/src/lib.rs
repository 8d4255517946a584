#![doc = include_str!("../README.md")]

pub mod s3;

/// Credentials used to sign requests
pub mod credentials;
