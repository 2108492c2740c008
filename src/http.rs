//! Requesting time-stamps over HTTP.
//!
//! This module provides [`HttpTimestamper`], a [`Timestamper`] that posts
//! requests to a TSA using the HTTP transport of section 3.4 of
//! [RFC 3161].
//!
//! [RFC 3161]: https://tools.ietf.org/html/rfc3161

use std::{error, fmt};
use std::convert::Infallible;
use bcder::decode::DecodeError;
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use crate::tsp::{TimeStampReq, TimeStampResp, Timestamper};


//------------ Constants -----------------------------------------------------

/// The media type of a time-stamp request.
pub const HTTP_CONTENT_TYPE_REQUEST: &str = "application/timestamp-query";

/// The media type of a time-stamp response.
pub const HTTP_CONTENT_TYPE_RESPONSE: &str = "application/timestamp-reply";


//------------ HttpTimestamper -----------------------------------------------

/// A time-stamper talking to a TSA via HTTP.
#[derive(Clone, Debug)]
pub struct HttpTimestamper {
    url: String,
    client: Client,
}

impl HttpTimestamper {
    /// Creates a time-stamper for the given URL with a default client.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, Client::new())
    }

    /// Creates a time-stamper using the given client.
    ///
    /// Use this to configure timeouts, proxies, or TLS settings.
    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        HttpTimestamper { url: url.into(), client }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Timestamper for HttpTimestamper {
    type Error = HttpError;

    fn timestamp(
        &self, req: &TimeStampReq
    ) -> Result<TimeStampResp, Self::Error> {
        debug!("Requesting time-stamp from {}.", self.url);
        let response = self.client.post(&self.url)
            .header(CONTENT_TYPE, HTTP_CONTENT_TYPE_REQUEST)
            .body(req.to_vec())
            .send()?;
        if response.status() != StatusCode::OK {
            return Err(HttpError::Status(response.status()))
        }
        let content_type = response.headers().get(CONTENT_TYPE).map(|value| {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        });
        if content_type.as_deref() != Some(HTTP_CONTENT_TYPE_RESPONSE) {
            return Err(HttpError::ContentType(content_type))
        }
        let body = response.bytes()?;
        TimeStampResp::decode(body).map_err(Into::into)
    }
}


//------------ HttpError -----------------------------------------------------

/// Requesting a time-stamp over HTTP failed.
#[derive(Debug)]
pub enum HttpError {
    /// The HTTP request itself failed.
    Transport(reqwest::Error),

    /// The server responded with a status other than 200.
    Status(StatusCode),

    /// The response had the wrong or no content type.
    ContentType(Option<String>),

    /// The response body was not a time-stamp response.
    Decode(DecodeError<Infallible>),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        HttpError::Transport(err)
    }
}

impl From<DecodeError<Infallible>> for HttpError {
    fn from(err: DecodeError<Infallible>) -> Self {
        HttpError::Decode(err)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            HttpError::Transport(ref err) => write!(f, "{}", err),
            HttpError::Status(status) => {
                write!(f, "unexpected HTTP status {}", status)
            }
            HttpError::ContentType(Some(ref content_type)) => {
                write!(f, "unexpected content type '{}'", content_type)
            }
            HttpError::ContentType(None) => {
                f.write_str("missing content type")
            }
            HttpError::Decode(ref err) => {
                write!(f, "invalid time-stamp response: {}", err)
            }
        }
    }
}

impl error::Error for HttpError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            HttpError::Transport(ref err) => Some(err),
            _ => None
        }
    }
}
