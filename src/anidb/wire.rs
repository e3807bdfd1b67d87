use crate::error::{AnicatError, Result};

/// Reply codes the client branches on.
pub mod code {
    pub const LOGIN_ACCEPTED: u16 = 200;
    pub const LOGIN_ACCEPTED_NEW_VERSION: u16 = 201;
    pub const LOGGED_OUT: u16 = 203;
    pub const MYLIST_ENTRY_ADDED: u16 = 210;
    pub const MYLIST_ENTRY_DELETED: u16 = 211;
    pub const FILE: u16 = 220;
    pub const FILE_ALREADY_IN_MYLIST: u16 = 310;
    pub const MYLIST_ENTRY_EDITED: u16 = 311;
    pub const NOT_LOGGED_IN: u16 = 403;
    pub const NO_SUCH_MYLIST_ENTRY: u16 = 411;
    pub const LOGIN_FAILED: u16 = 500;
    pub const LOGIN_FIRST: u16 = 501;
    pub const CLIENT_BANNED: u16 = 504;
    pub const INVALID_SESSION: u16 = 506;
    pub const BANNED: u16 = 555;
}

/// One outbound command. Parameter values are escaped on encode; parameter
/// order is preserved.
#[derive(Debug, Clone)]
pub struct Request {
    command: &'static str,
    params: Vec<(&'static str, String)>,
}

impl Request {
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    #[must_use]
    pub fn opt_param(self, key: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    pub const fn command(&self) -> &'static str {
        self.command
    }

    pub fn encode(&self) -> String {
        if self.params.is_empty() {
            return self.command.to_string();
        }
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={}", escape(v)))
            .collect();
        format!("{} {}", self.command, params.join("&"))
    }
}

/// The service treats `&` as a parameter separator and newlines as record
/// separators, so both are escaped in values.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('\r', "")
        .replace('\n', "<br />")
}

/// One inbound datagram: a status line, then zero or more data lines.
#[derive(Debug, Clone)]
pub struct Reply {
    pub code: u16,
    pub message: String,
    pub data: Vec<String>,
}

impl Reply {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut lines = raw.lines();
        let status = lines
            .next()
            .ok_or_else(|| AnicatError::MalformedReply("empty datagram".to_string()))?;
        let (code, message) = status.split_once(' ').unwrap_or((status, ""));
        let code = code
            .parse()
            .map_err(|_| AnicatError::MalformedReply(format!("bad status line {status:?}")))?;
        Ok(Self {
            code,
            message: message.to_string(),
            data: lines.map(String::from).collect(),
        })
    }

    /// The session key leading a 200/201 message.
    pub fn session_key(&self) -> Result<&str> {
        self.message
            .split_whitespace()
            .next()
            .ok_or_else(|| AnicatError::MalformedReply("login reply without session key".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn encodes_command_and_parameters_in_order() {
        let req = Request::new("MYLISTADD")
            .param("size", "312")
            .param("ed2k", "abcd")
            .param("state", "1");
        assert_eq!(req.encode(), "MYLISTADD size=312&ed2k=abcd&state=1");
    }

    #[test]
    fn bare_commands_encode_without_a_space() {
        assert_eq!(Request::new("PING").encode(), "PING");
    }

    #[test]
    fn values_are_escaped() {
        let req = Request::new("MYLISTADD").param("other", "tom & jerry\nseason 1");
        assert_eq!(
            req.encode(),
            "MYLISTADD other=tom &amp; jerry<br />season 1"
        );
    }

    #[test]
    fn opt_param_skips_none() {
        let req = Request::new("MYLISTADD")
            .opt_param("source", Some("dvd"))
            .opt_param("storage", None);
        assert_eq!(req.encode(), "MYLISTADD source=dvd");
    }

    #[test]
    fn parses_status_only_replies() {
        let reply = Reply::parse("203 LOGGED OUT").unwrap();
        assert_eq!(reply.code, 203);
        assert_eq!(reply.message, "LOGGED OUT");
        assert!(reply.data.is_empty());
    }

    #[test]
    fn parses_data_lines() {
        let reply = Reply::parse("220 FILE\n912|4242|05").unwrap();
        assert_eq!(reply.code, code::FILE);
        assert_eq!(reply.data, vec!["912|4242|05".to_string()]);
    }

    #[test]
    fn login_replies_carry_the_session_key() {
        let reply = Reply::parse("200 hS2mK LOGIN ACCEPTED").unwrap();
        assert_eq!(reply.session_key().unwrap(), "hS2mK");

        let reply = Reply::parse("201 hS2mK 1.2.3.4:9000 LOGIN ACCEPTED - NEW VERSION AVAILABLE")
            .unwrap();
        assert_eq!(reply.session_key().unwrap(), "hS2mK");
    }

    #[test]
    fn garbage_status_lines_are_malformed() {
        assert!(matches!(
            Reply::parse("LOGIN ACCEPTED"),
            Err(AnicatError::MalformedReply(_))
        ));
        assert!(matches!(
            Reply::parse(""),
            Err(AnicatError::MalformedReply(_))
        ));
    }
}
