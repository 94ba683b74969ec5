use crate::client::{Config, Session};

use async_trait::async_trait;
use glob::Pattern;
use russh::client;
use russh_keys::ssh_key::public::PublicKey;
use russh_sftp::client::fs::Metadata;
use russh_sftp::protocol::OpenFlags;
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::lookup_host,
    time::Duration,
};

/// Configuration for an SFTP session authenticated with a password.
#[derive(Debug, Clone)]
pub struct SftpConfig {
    username: String,
    password: String,
    socket: SocketAddr,
    verbose: bool,
    inactivity_timeout: Duration,
}

impl SftpConfig {
    /// Resolve `addr` (a `host` or `host:port` string, port 22 when
    /// omitted) and build a password-authenticated config.
    pub async fn password<U: Into<String>, P: Into<String>>(
        username: U,
        password: P,
        addr: &str,
        verbose: bool,
        inactivity_timeout: Duration,
    ) -> crate::Result<Self> {
        let target = if addr.contains(':') {
            addr.to_string()
        } else {
            format!("{}:22", addr)
        };

        let socket = lookup_host(&target)
            .await?
            .next()
            .ok_or_else(|| crate::Error::ConnectionError("Error Parsing Socket".to_string()))?;

        Ok(SftpConfig {
            username: username.into(),
            password: password.into(),
            socket,
            verbose,
            inactivity_timeout,
        })
    }
}

pub struct SftpSession {
    handle: client::Handle<Handler>,
    sftp: russh_sftp::client::SftpSession,
    home: String,
    cwd: String,
}

impl Config for SftpConfig {
    type SessionType = SftpSession;

    /// Connect, authenticate and open the SFTP subsystem.
    async fn create_session(&self) -> crate::Result<Self::SessionType> {
        let mut handle = get_handle(self.socket, self.verbose, self.inactivity_timeout).await?;

        let auth_res = handle
            .authenticate_password(&self.username, &self.password)
            .await?;

        if !auth_res {
            return Err(crate::Error::AuthenticationError(
                "Failed to authenticate with password".to_string(),
            ));
        }

        let channel = handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;

        let sftp = russh_sftp::client::SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| {
                crate::Error::TransferError(format!("Failed to create SFTP session: {}", e))
            })?;

        let home = sftp.canonicalize(".").await?;
        log::debug!("sftp subsystem ready, home is {}", home);

        Ok(SftpSession {
            handle,
            sftp,
            cwd: home.clone(),
            home,
        })
    }
}

impl Session for SftpSession {
    async fn disconnect(&mut self) -> crate::Result<()> {
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "English")
            .await?;
        Ok(())
    }

    async fn change_dir(&mut self, path: &str) -> crate::Result<()> {
        let target = if path == "~" {
            self.home.clone()
        } else {
            resolve(&self.cwd, path)
        };

        let resolved = self.sftp.canonicalize(&target).await?;
        let attrs = self.sftp.metadata(&resolved).await?;
        if !attrs.is_dir() {
            return Err(crate::Error::NotADirectory(resolved));
        }

        self.cwd = resolved;
        Ok(())
    }

    async fn current_dir(&self) -> crate::Result<String> {
        Ok(self.cwd.clone())
    }

    /// List a directory, a single file, or a trailing glob pattern.
    ///
    /// SFTP has no server-side LIST globbing, so a pattern in the final
    /// path component is matched client-side against its parent directory.
    async fn list(&self, path: &str) -> crate::Result<Vec<String>> {
        let resolved = resolve(&self.cwd, path);

        if let Some((dir, pattern)) = split_glob(&resolved) {
            let pattern =
                Pattern::new(&pattern).map_err(|e| crate::Error::ParseError(e.to_string()))?;

            let mut lines = Vec::new();
            for entry in self.sftp.read_dir(dir).await? {
                let name = entry.file_name();
                if pattern.matches(&name) {
                    lines.push(format_entry(&name, &entry.metadata()));
                }
            }
            return Ok(lines);
        }

        let attrs = self.sftp.metadata(&resolved).await?;
        if attrs.is_dir() {
            let mut lines = Vec::new();
            for entry in self.sftp.read_dir(&resolved).await? {
                lines.push(format_entry(&entry.file_name(), &entry.metadata()));
            }
            Ok(lines)
        } else {
            let name = match resolved.rsplit('/').next() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => resolved.clone(),
            };
            Ok(vec![format_entry(&name, &attrs)])
        }
    }

    async fn store(&self, remote_name: &str, contents: Vec<u8>) -> crate::Result<()> {
        let resolved = resolve(&self.cwd, remote_name);

        let mut remote_file = self.sftp.create(&resolved).await?;

        remote_file.write_all(&contents).await.map_err(|e| {
            crate::Error::TransferError(format!("Failed to write to remote file: {}", e))
        })?;

        remote_file.shutdown().await.map_err(|e| {
            crate::Error::TransferError(format!("Failed to close remote file: {}", e))
        })?;

        Ok(())
    }

    async fn retrieve(&self, remote_name: &str) -> crate::Result<Vec<u8>> {
        let resolved = resolve(&self.cwd, remote_name);

        let mut remote_file = self
            .sftp
            .open_with_flags(&resolved, OpenFlags::READ)
            .await?;

        let mut contents = Vec::new();
        remote_file.read_to_end(&mut contents).await.map_err(|e| {
            crate::Error::TransferError(format!("Failed to read remote file: {}", e))
        })?;

        Ok(contents)
    }
}

/// Resolve `path` against the current remote directory.
fn resolve(cwd: &str, path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else if path == "." || path.is_empty() {
        cwd.to_string()
    } else if cwd == "/" {
        format!("/{}", path)
    } else {
        format!("{}/{}", cwd, path)
    }
}

/// Split off a glob pattern in the final path component, if any.
fn split_glob(path: &str) -> Option<(String, String)> {
    let (dir, name) = match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    };

    if name.contains(['*', '?', '[']) {
        let dir = if dir.is_empty() {
            "/".to_string()
        } else {
            dir.to_string()
        };
        Some((dir, name.to_string()))
    } else {
        None
    }
}

/// One listing line. The entry name is always the last token.
fn format_entry(name: &str, attrs: &Metadata) -> String {
    let kind = if attrs.is_dir() { 'd' } else { '-' };
    let size = attrs.size.unwrap_or(0);
    format!("{}{:>12} {}", kind, size, name)
}

/// Get a handle to the SSH session
async fn get_handle(
    socket: SocketAddr,
    verbose: bool,
    timeout: Duration,
) -> crate::Result<client::Handle<Handler>> {
    let config = client::Config {
        inactivity_timeout: Some(timeout),
        ..Default::default()
    };

    let config = Arc::new(config);

    let sh = Handler { verbose };

    let handle = client::connect(config, socket, sh).await?;

    Ok(handle)
}

struct Handler {
    verbose: bool,
}

#[async_trait]
impl client::Handler for Handler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, key: &PublicKey) -> Result<bool, Self::Error> {
        if self.verbose {
            log::debug!("accepting server key ({})", key.algorithm());
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_keeps_absolute_paths() {
        assert_eq!(resolve("/home/u", "/pub/data"), "/pub/data");
    }

    #[test]
    fn resolve_joins_relative_paths() {
        assert_eq!(resolve("/home/u", "docs"), "/home/u/docs");
        assert_eq!(resolve("/", "docs"), "/docs");
    }

    #[test]
    fn resolve_dot_is_current_dir() {
        assert_eq!(resolve("/home/u", "."), "/home/u");
        assert_eq!(resolve("/home/u", ""), "/home/u");
    }

    #[test]
    fn split_glob_detects_trailing_pattern() {
        assert_eq!(
            split_glob("/pub/*.txt"),
            Some(("/pub".to_string(), "*.txt".to_string()))
        );
        assert_eq!(
            split_glob("/r?port"),
            Some(("/".to_string(), "r?port".to_string()))
        );
    }

    #[test]
    fn split_glob_ignores_plain_paths() {
        assert_eq!(split_glob("/pub/report.txt"), None);
        assert_eq!(split_glob("/pub"), None);
    }

    #[test]
    fn format_entry_puts_name_last() {
        let attrs = Metadata {
            size: Some(42),
            uid: None,
            user: None,
            gid: None,
            group: None,
            permissions: None,
            atime: None,
            mtime: None,
        };
        let line = format_entry("report.txt", &attrs);
        assert_eq!(line.split_whitespace().last(), Some("report.txt"));
    }
}
