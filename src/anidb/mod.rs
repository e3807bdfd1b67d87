mod session;
mod wire;

pub use session::{SessionState, SessionStore};
pub use wire::{Reply, Request, code};

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, warn};

use crate::config::{ClientConfig, Credentials};
use crate::domain::{FieldSet, FieldValue, HashedFile, MylistUpdate};
use crate::error::{AnicatError, Result};
use crate::ports::{AddOutcome, Catalog, DelOutcome, LogoutOutcome};

const CLIENT_NAME: &str = "anicat";
const CLIENT_VERSION: u16 = 2;
const PROTOCOL_VERSION: u16 = 3;

/// Each command is sent at most this many times before giving up.
const SEND_ATTEMPTS: usize = 2;

const RECV_BUF_SIZE: usize = 8192;

/// The catalog service over its UDP API. One datagram per command, one
/// command in flight at a time, with the mandated pause between sends.
pub struct UdpCatalog {
    config: ClientConfig,
    credentials: Option<Credentials>,
    store: SessionStore,
    state: Mutex<ClientState>,
}

#[derive(Default)]
struct ClientState {
    socket: Option<UdpSocket>,
    session: Option<String>,
    last_send: Option<Instant>,
}

impl UdpCatalog {
    pub fn new(
        config: ClientConfig,
        credentials: Option<Credentials>,
        store: SessionStore,
    ) -> Self {
        Self {
            config,
            credentials,
            store,
            state: Mutex::new(ClientState::default()),
        }
    }

    async fn bind(&self, port: u16) -> Result<UdpSocket> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        socket
            .connect((self.config.server.as_str(), self.config.port))
            .await?;
        Ok(socket)
    }

    async fn exchange(&self, state: &mut ClientState, request: &Request) -> Result<Reply> {
        let socket = state
            .socket
            .as_ref()
            .ok_or_else(|| AnicatError::Config("client has no socket".to_string()))?;
        let payload = request.encode();
        let recv_timeout = Duration::from_secs(self.config.timeout_secs);
        let delay = Duration::from_millis(self.config.command_delay_ms);

        for attempt in 1..=SEND_ATTEMPTS {
            if let Some(last) = state.last_send {
                let elapsed = last.elapsed();
                if elapsed < delay {
                    sleep(delay - elapsed).await;
                }
            }

            // Payloads carry credentials, so only the command name is logged.
            debug!(command = request.command(), attempt, "sending command");
            socket.send(payload.as_bytes()).await?;
            state.last_send = Some(Instant::now());

            let mut buf = [0u8; RECV_BUF_SIZE];
            match timeout(recv_timeout, socket.recv(&mut buf)).await {
                Ok(Ok(n)) => {
                    let text = String::from_utf8_lossy(&buf[..n]);
                    let reply = Reply::parse(&text)?;
                    debug!(code = reply.code, "received reply");
                    return Ok(reply);
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    warn!(command = request.command(), attempt, "no reply within timeout");
                }
            }
        }
        Err(AnicatError::Timeout(SEND_ATTEMPTS))
    }

    /// Returns the active session key, resuming the cached session or
    /// logging in as needed.
    async fn ensure_session(&self, state: &mut ClientState) -> Result<String> {
        if let Some(key) = &state.session {
            return Ok(key.clone());
        }

        if let Some(saved) = self.store.load()? {
            match self.bind(saved.local_port).await {
                Ok(socket) => {
                    debug!(port = saved.local_port, "resuming cached session");
                    state.socket = Some(socket);
                    state.session = Some(saved.key.clone());
                    return Ok(saved.key);
                }
                Err(e) => {
                    debug!("cannot rebind cached session port: {e}");
                    self.store.clear()?;
                }
            }
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or(AnicatError::MissingCredentials)?;
        if state.socket.is_none() {
            state.socket = Some(self.bind(0).await?);
        }

        let request = Request::new("AUTH")
            .param("user", credentials.username.as_str())
            .param("pass", credentials.password.as_str())
            .param("protover", PROTOCOL_VERSION.to_string())
            .param("client", CLIENT_NAME)
            .param("clientver", CLIENT_VERSION.to_string())
            .param("nat", "1")
            .param("enc", "UTF8");
        let reply = self.exchange(state, &request).await?;
        match reply.code {
            code::LOGIN_ACCEPTED | code::LOGIN_ACCEPTED_NEW_VERSION => {
                if reply.code == code::LOGIN_ACCEPTED_NEW_VERSION {
                    debug!("service reports a newer client version");
                }
                let key = reply.session_key()?.to_string();
                state.session = Some(key.clone());
                self.persist(state)?;
                Ok(key)
            }
            code::LOGIN_FAILED => Err(AnicatError::LoginFailed(reply.message)),
            _ => Err(service_error(reply)),
        }
    }

    /// Runs a session-keyed command, re-authenticating once when the
    /// service no longer recognizes the session.
    async fn session_command<F>(&self, build: F) -> Result<Reply>
    where
        F: Fn(&str) -> Request,
    {
        let mut state = self.state.lock().await;
        let key = self.ensure_session(&mut state).await?;
        let mut reply = self.exchange(&mut state, &build(&key)).await?;

        if matches!(reply.code, code::LOGIN_FIRST | code::INVALID_SESSION) {
            debug!("session rejected, re-authenticating");
            state.session = None;
            self.store.clear()?;
            let key = self.ensure_session(&mut state).await?;
            reply = self.exchange(&mut state, &build(&key)).await?;
        }

        self.persist(&state)?;
        Ok(reply)
    }

    fn persist(&self, state: &ClientState) -> Result<()> {
        if let (Some(key), Some(socket)) = (&state.session, &state.socket) {
            self.store.save(&SessionState {
                key: key.clone(),
                local_port: socket.local_addr()?.port(),
                last_used: Utc::now(),
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for UdpCatalog {
    async fn mylist_add(&self, file: &HashedFile, update: &MylistUpdate) -> Result<AddOutcome> {
        let base = |edit: bool, session: &str| {
            let mut request = Request::new("MYLISTADD")
                .param("size", file.size.to_string())
                .param("ed2k", file.ed2k.as_str())
                .param("state", update.state.wire_value().to_string());
            if let Some(viewed) = update.viewed {
                request = request.param("viewed", if viewed { "1" } else { "0" });
            }
            if let Some(viewdate) = update.viewdate {
                request = request.param("viewdate", viewdate.timestamp().to_string());
            }
            request = request
                .opt_param("source", update.source.as_deref())
                .opt_param("storage", update.storage.as_deref())
                .opt_param("other", update.other.as_deref());
            if edit {
                request = request.param("edit", "1");
            }
            request.param("s", session)
        };

        let reply = self.session_command(|s| base(false, s)).await?;
        match reply.code {
            code::MYLIST_ENTRY_ADDED => Ok(AddOutcome::Added),
            code::FILE_ALREADY_IN_MYLIST => {
                let reply = self.session_command(|s| base(true, s)).await?;
                match reply.code {
                    code::MYLIST_ENTRY_EDITED => Ok(AddOutcome::Updated),
                    _ => Err(service_error(reply)),
                }
            }
            _ => Err(service_error(reply)),
        }
    }

    async fn mylist_del(&self, file: &HashedFile) -> Result<DelOutcome> {
        let reply = self
            .session_command(|s| {
                Request::new("MYLISTDEL")
                    .param("size", file.size.to_string())
                    .param("ed2k", file.ed2k.as_str())
                    .param("s", s)
            })
            .await?;
        match reply.code {
            code::MYLIST_ENTRY_DELETED => Ok(DelOutcome::Deleted),
            code::NO_SUCH_MYLIST_ENTRY => Ok(DelOutcome::NotListed),
            _ => Err(service_error(reply)),
        }
    }

    async fn file_fields(&self, file: &HashedFile, fields: &FieldSet) -> Result<Vec<FieldValue>> {
        let reply = self
            .session_command(|s| {
                Request::new("FILE")
                    .param("size", file.size.to_string())
                    .param("ed2k", file.ed2k.as_str())
                    .param("fmask", fields.file_mask_hex())
                    .param("amask", fields.anime_mask_hex())
                    .param("s", s)
            })
            .await?;
        if reply.code != code::FILE {
            return Err(service_error(reply));
        }
        let line = reply.data.first().ok_or_else(|| {
            AnicatError::MalformedReply("FILE reply without a data line".to_string())
        })?;
        fields.zip_values(line)
    }

    async fn logout(&self) -> Result<LogoutOutcome> {
        let mut state = self.state.lock().await;

        // Never log in just to log out; only an existing session is ended.
        let key = match &state.session {
            Some(key) => key.clone(),
            None => match self.store.load()? {
                None => return Ok(LogoutOutcome::NoSession),
                Some(saved) => match self.bind(saved.local_port).await {
                    Ok(socket) => {
                        state.socket = Some(socket);
                        state.session = Some(saved.key.clone());
                        saved.key
                    }
                    Err(e) => {
                        debug!("cannot rebind cached session port: {e}");
                        self.store.clear()?;
                        return Ok(LogoutOutcome::NoSession);
                    }
                },
            },
        };

        let reply = self
            .exchange(&mut state, &Request::new("LOGOUT").param("s", key))
            .await;
        state.session = None;
        self.store.clear()?;

        let reply = reply?;
        if reply.code == code::NOT_LOGGED_IN {
            debug!("service had already dropped the session");
        }
        Ok(LogoutOutcome::LoggedOut)
    }
}

fn service_error(reply: Reply) -> AnicatError {
    match reply.code {
        code::CLIENT_BANNED | code::BANNED => AnicatError::Banned(reply.message),
        code::LOGIN_FAILED => AnicatError::LoginFailed(reply.message),
        _ => AnicatError::Service {
            code: reply.code,
            message: reply.message,
        },
    }
}
