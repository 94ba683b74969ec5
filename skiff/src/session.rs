//! Session context: owns the live transfer session, the cached remote
//! working directory and the idle timer, and dispatches parsed commands.
//!
//! Remote failures after the session is established never propagate out of
//! `execute`; they come back as user-facing text and the session carries
//! on. Only connect/authenticate failures bubble up as errors.

use crate::command::Verb;
use crate::timer::IdleTimer;
use tokio::time::Duration;
use xferrc::client::{Config, Session};

pub struct SessionContext<C: Config> {
    config: C,
    session: Option<C::SessionType>,
    last_dir: String,
    pub timer: IdleTimer,
}

impl<C: Config> SessionContext<C> {
    pub fn new(config: C, idle_timeout: Duration) -> Self {
        SessionContext {
            config,
            session: None,
            last_dir: String::new(),
            timer: IdleTimer::new(idle_timeout),
        }
    }

    /// The cached remote working directory, used for the prompt.
    pub fn current_dir(&self) -> &str {
        &self.last_dir
    }

    /// Establish a fresh session, replacing any previous handle.
    ///
    /// When a working directory is already cached the new session is moved
    /// there best-effort; the directory may have vanished while we were
    /// away, and the user will notice via `pwd`/`ls` if it did.
    pub async fn connect(&mut self) -> xferrc::Result<()> {
        let mut session = self.config.create_session().await?;

        if self.last_dir.is_empty() {
            self.last_dir = session.current_dir().await?;
        } else {
            let _ = session.change_dir(&self.last_dir).await;
        }

        self.session = Some(session);
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.disconnect().await {
                log::debug!("disconnect: {}", e);
            }
        }
    }

    /// Transparent-reconnect contract: an idle-expired session is assumed
    /// to have been dropped by the remote and is silently re-established.
    pub async fn ensure_live(&mut self) -> xferrc::Result<()> {
        if !self.timer.is_active() {
            self.disconnect().await;
            self.connect().await?;
        }
        Ok(())
    }

    pub async fn execute(&mut self, verb: Verb, arg: &str) -> String {
        match verb {
            Verb::Unknown => "Don't know that!".to_string(),
            Verb::Pwd => self.last_dir.clone(),
            Verb::Cd => self.do_cd(arg).await,
            Verb::Ls => self.do_ls(arg).await,
            Verb::Put => self.do_put(arg).await,
            Verb::Get => self.do_get(arg).await,
        }
    }

    async fn do_cd(&mut self, arg: &str) -> String {
        let target = if arg.is_empty() { "~" } else { arg };

        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return "Not connected".to_string(),
        };

        match session.change_dir(target).await {
            Ok(()) => match session.current_dir().await {
                Ok(dir) => {
                    self.last_dir = dir;
                    String::new()
                }
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        }
    }

    async fn do_ls(&mut self, arg: &str) -> String {
        let path = if arg.is_empty() { "." } else { arg };

        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return "Not connected".to_string(),
        };

        match session.list(path).await {
            Ok(lines) => lines.join("\n"),
            Err(e) => e.to_string(),
        }
    }

    /// Upload every local file matching the whitespace-separated glob
    /// patterns in `arg`. The first error aborts the rest of the command;
    /// files already uploaded stay uploaded.
    async fn do_put(&mut self, arg: &str) -> String {
        if arg.is_empty() {
            return "No arguments".to_string();
        }

        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return "Not connected".to_string(),
        };

        for pattern in arg.split_whitespace() {
            let paths = match glob::glob(pattern) {
                Ok(paths) => paths,
                Err(e) => return e.to_string(),
            };

            for entry in paths {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => return e.to_string(),
                };

                let contents = match tokio::fs::read(&path).await {
                    Ok(contents) => contents,
                    Err(e) => return e.to_string(),
                };

                log::info!("putting {}", path.display());

                let name = path.to_string_lossy();
                if let Err(e) = session.store(name.as_ref(), contents).await {
                    return e.to_string();
                }
            }
        }

        String::new()
    }

    /// Download every remote file matching the whitespace-separated
    /// patterns in `arg`, overwriting local files of the same name. The
    /// filename is taken as the last whitespace token of each listing
    /// line, which is what the capability's listing format guarantees.
    async fn do_get(&mut self, arg: &str) -> String {
        if arg.is_empty() {
            return "No arguments".to_string();
        }

        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return "Not connected".to_string(),
        };

        for pattern in arg.split_whitespace() {
            let lines = match session.list(pattern).await {
                Ok(lines) => lines,
                Err(e) => return e.to_string(),
            };

            for line in lines {
                let name = match line.trim_end_matches(['\n', '\r']).split_whitespace().last() {
                    Some(name) => name.to_string(),
                    None => continue,
                };

                log::info!("getting {}", name);

                let contents = match session.retrieve(&name).await {
                    Ok(contents) => contents,
                    Err(e) => return e.to_string(),
                };

                if let Err(e) = tokio::fs::write(&name, contents).await {
                    return e.to_string();
                }
            }
        }

        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    const TIMEOUT: Duration = Duration::from_secs(300);

    /// Shared fake remote: records every capability call.
    struct Remote {
        calls: Mutex<Vec<String>>,
        cwd: Mutex<String>,
        fail_cd: AtomicBool,
        listing: Mutex<Vec<String>>,
        contents: Mutex<Vec<u8>>,
    }

    impl Remote {
        fn new() -> Arc<Self> {
            Arc::new(Remote {
                calls: Mutex::new(Vec::new()),
                cwd: Mutex::new("/home/u".to_string()),
                fail_cd: AtomicBool::new(false),
                listing: Mutex::new(Vec::new()),
                contents: Mutex::new(Vec::new()),
            })
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, call: &str) -> usize {
            self.calls().iter().filter(|c| *c == call).count()
        }
    }

    #[derive(Clone)]
    struct MockConfig {
        remote: Arc<Remote>,
    }

    struct MockSession {
        remote: Arc<Remote>,
    }

    impl Config for MockConfig {
        type SessionType = MockSession;

        async fn create_session(&self) -> xferrc::Result<MockSession> {
            self.remote.record("connect");
            Ok(MockSession {
                remote: Arc::clone(&self.remote),
            })
        }
    }

    impl Session for MockSession {
        async fn disconnect(&mut self) -> xferrc::Result<()> {
            self.remote.record("disconnect");
            Ok(())
        }

        async fn change_dir(&mut self, path: &str) -> xferrc::Result<()> {
            self.remote.record(format!("cd {}", path));
            if self.remote.fail_cd.load(Ordering::SeqCst) {
                return Err(xferrc::Error::TransferError(
                    "550 Failed to change directory".to_string(),
                ));
            }
            *self.remote.cwd.lock().unwrap() = path.to_string();
            Ok(())
        }

        async fn current_dir(&self) -> xferrc::Result<String> {
            self.remote.record("current_dir");
            Ok(self.remote.cwd.lock().unwrap().clone())
        }

        async fn list(&self, path: &str) -> xferrc::Result<Vec<String>> {
            self.remote.record(format!("ls {}", path));
            Ok(self.remote.listing.lock().unwrap().clone())
        }

        async fn store(&self, remote_name: &str, _contents: Vec<u8>) -> xferrc::Result<()> {
            self.remote.record(format!("store {}", remote_name));
            Ok(())
        }

        async fn retrieve(&self, remote_name: &str) -> xferrc::Result<Vec<u8>> {
            self.remote.record(format!("retr {}", remote_name));
            Ok(self.remote.contents.lock().unwrap().clone())
        }
    }

    fn context(remote: &Arc<Remote>) -> SessionContext<MockConfig> {
        SessionContext::new(
            MockConfig {
                remote: Arc::clone(remote),
            },
            TIMEOUT,
        )
    }

    #[tokio::test]
    async fn pwd_returns_cache_without_touching_the_remote() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();

        let before = remote.calls();
        let out = ctx.execute(Verb::Pwd, "").await;

        assert_eq!(out, "/home/u");
        assert_eq!(remote.calls(), before);
    }

    #[tokio::test]
    async fn unknown_verb_is_advisory_only() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();

        let before = remote.calls();
        assert_eq!(ctx.execute(Verb::Unknown, "").await, "Don't know that!");
        assert_eq!(remote.calls(), before);
    }

    #[tokio::test]
    async fn cd_failure_leaves_cached_directory_unchanged() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();

        remote.fail_cd.store(true, Ordering::SeqCst);
        let out = ctx.execute(Verb::Cd, "/nope").await;

        assert!(out.contains("550"));
        assert_eq!(ctx.current_dir(), "/home/u");
    }

    #[tokio::test]
    async fn cd_success_updates_the_cache_from_the_remote() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();

        let out = ctx.execute(Verb::Cd, "/pub").await;

        assert_eq!(out, "");
        assert_eq!(ctx.current_dir(), "/pub");
    }

    #[tokio::test]
    async fn cd_without_argument_goes_home() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();

        ctx.execute(Verb::Cd, "").await;
        assert_eq!(remote.count("cd ~"), 1);
    }

    #[tokio::test]
    async fn put_with_empty_argument_is_rejected_locally() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();

        let before = remote.calls();
        assert_eq!(ctx.execute(Verb::Put, "").await, "No arguments");
        assert_eq!(remote.calls(), before);
    }

    #[tokio::test]
    async fn put_with_unmatched_glob_uploads_nothing() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();

        let out = ctx
            .execute(Verb::Put, "definitely_no_such_*_local_file")
            .await;

        assert_eq!(out, "");
        assert!(!remote.calls().iter().any(|c| c.starts_with("store")));
    }

    #[tokio::test]
    async fn get_with_empty_argument_is_rejected_locally() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();

        assert_eq!(ctx.execute(Verb::Get, "").await, "No arguments");
    }

    #[tokio::test]
    async fn idle_session_reconnects_exactly_once() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();

        // timer was never armed, so the session counts as idle
        ctx.ensure_live().await.unwrap();

        assert_eq!(remote.count("disconnect"), 1);
        assert_eq!(remote.count("connect"), 2);
    }

    #[tokio::test]
    async fn live_session_is_not_reconnected() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();
        ctx.timer.reset();

        ctx.ensure_live().await.unwrap();

        assert_eq!(remote.count("disconnect"), 0);
        assert_eq!(remote.count("connect"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_expiry_reconnect_restores_the_working_directory() {
        let remote = Remote::new();
        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();
        ctx.timer.reset();

        assert_eq!(ctx.execute(Verb::Cd, "/pub").await, "");
        assert_eq!(ctx.execute(Verb::Pwd, "").await, "/pub");

        tokio::time::sleep(TIMEOUT + Duration::from_secs(1)).await;
        assert!(!ctx.timer.is_active());

        ctx.ensure_live().await.unwrap();
        let out = ctx.execute(Verb::Ls, "").await;

        assert_eq!(out, "");
        assert_eq!(remote.count("connect"), 2);
        assert_eq!(remote.count("disconnect"), 1);
        assert_eq!(ctx.current_dir(), "/pub");

        let calls = remote.calls();
        let tail: Vec<&str> = calls[calls.len() - 4..].iter().map(|c| c.as_str()).collect();
        assert_eq!(tail, vec!["disconnect", "connect", "cd /pub", "ls ."]);
    }

    #[tokio::test]
    async fn get_retrieves_the_listed_file_and_writes_it_locally() {
        let remote = Remote::new();
        *remote.listing.lock().unwrap() =
            vec!["-         42 report.txt".to_string()];
        *remote.contents.lock().unwrap() = b"retrieved bytes".to_vec();

        let dir = tempfile::tempdir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();

        let mut ctx = context(&remote);
        ctx.connect().await.unwrap();

        let out = ctx.execute(Verb::Get, "report.txt").await;

        assert_eq!(out, "");
        assert_eq!(remote.count("retr report.txt"), 1);
        let written = std::fs::read(dir.path().join("report.txt")).unwrap();
        assert_eq!(written, b"retrieved bytes");
    }
}
