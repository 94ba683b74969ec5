//! Capability interface for a remote file-transfer session.
//!
//! `Config` knows how to establish an authenticated session; `Session` is
//! the live connection the client drives. Implementations live behind
//! these traits so the session-management layer can be exercised against
//! test doubles.

/// A live, authenticated connection to a remote file-transfer server.
///
/// All paths are interpreted relative to the session's current remote
/// directory unless absolute. Listing lines always carry the entry name as
/// their last whitespace-separated token.
#[trait_variant::make(Send)]
pub trait Session {
    /// Tear the connection down. The session must not be used afterwards.
    async fn disconnect(&mut self) -> crate::Result<()>;

    /// Change the remote working directory. `"~"` selects the login home.
    async fn change_dir(&mut self, path: &str) -> crate::Result<()>;

    /// The remote working directory, as last resolved by the server.
    async fn current_dir(&self) -> crate::Result<String>;

    /// List a directory, a single file, or a glob pattern. One line per
    /// matched entry, without line terminators.
    async fn list(&self, path: &str) -> crate::Result<Vec<String>>;

    /// Upload `contents` to the remote under `remote_name`.
    async fn store(&self, remote_name: &str, contents: Vec<u8>) -> crate::Result<()>;

    /// Download the remote file `remote_name`.
    async fn retrieve(&self, remote_name: &str) -> crate::Result<Vec<u8>>;
}

/// Configuration for establishing a [`Session`].
#[trait_variant::make(Send)]
pub trait Config {
    type SessionType: Session;

    /// Connect and authenticate, returning a ready session.
    async fn create_session(&self) -> crate::Result<Self::SessionType>;
}
