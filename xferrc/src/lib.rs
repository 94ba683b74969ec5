pub mod error;

pub mod client;
pub use client::*;

pub mod sftp;

pub use error::*;
