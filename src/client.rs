//! The API client and its request pipeline.
//!
//! Every call goes through the same steps: the [Client] builds a [Request], the [Transport] sends it, unsuccessful
//! statuses are classified into [TransportErrors](transport::TransportError), and the response body is coerced into
//! the typed result. Request bodies are dumped from typed models the same way.
//!
//! ```no_run
//! # fn main() -> spotwire::Result<()> {
//! use spotwire::client::{http::HttpTransport, Client};
//!
//! let client = Client::new(HttpTransport::new("access token")?);
//! let track = client.track("0U0ldCRmgCqhVvD6ksG63j")?;
//!
//! for saved in client.saved_tracks(Some(50))?.paging_each_item() {
//!     println!("{}", saved?.track().name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
#[cfg(feature = "sync")]
pub mod http;
pub mod library;
pub mod player;
pub mod transport;

use const_format::concatcp;
use log::{debug, trace};
use serde_json::Value;

pub use self::{
    catalog::SearchBuilder,
    transport::{Method, RawResponse, Request, RequestOptions, Transport},
};
use crate::{
    coerce::{coerce_with, CoercionOptions, IntegerStrictness},
    dump,
    error::{Error, Result, TransportError},
    model::page::{Page, Pagination},
    value::Typed,
};

// catalog endpoints
const API_TRACKS_ENDPOINT: &str = "tracks";
const API_ALBUMS_ENDPOINT: &str = "albums";
const API_SEARCH_ENDPOINT: &str = "search";

// user endpoints
const API_ME: &str = "me/";
const API_SAVED_TRACKS_ENDPOINT: &str = concatcp!(API_ME, "tracks");
const API_PLAYER_ENDPOINT: &str = concatcp!(API_ME, "player");
const API_RECENTLY_PLAYED_ENDPOINT: &str = concatcp!(API_PLAYER_ENDPOINT, "/recently-played");
const API_CURRENTLY_PLAYING_ENDPOINT: &str = concatcp!(API_PLAYER_ENDPOINT, "/currently-playing");
const API_DEVICES_ENDPOINT: &str = concatcp!(API_PLAYER_ENDPOINT, "/devices");
const API_PLAY_ENDPOINT: &str = concatcp!(API_PLAYER_ENDPOINT, "/play");
const API_PAUSE_ENDPOINT: &str = concatcp!(API_PLAYER_ENDPOINT, "/pause");

/// A client for the API over some [Transport].
#[derive(Debug)]
pub struct Client<Tr> {
    transport: Tr,
    coercion_options: CoercionOptions,
    request_options: RequestOptions,
}

/// Builder for a [Client].
#[derive(Debug)]
pub struct ClientBuilder<Tr> {
    transport: Tr,
    coercion_options: CoercionOptions,
    request_options: RequestOptions,
}

impl<Tr> ClientBuilder<Tr>
where
    Tr: Transport,
{
    pub fn new(transport: Tr) -> Self {
        Self {
            transport,
            coercion_options: CoercionOptions::default(),
            request_options: RequestOptions::default(),
        }
    }

    pub fn coercion_options(self, coercion_options: CoercionOptions) -> Self {
        Self {
            coercion_options,
            ..self
        }
    }

    /// Set how floats are treated where integers are expected. Defaults to accepting floats with no fractional part.
    pub fn integer_strictness(mut self, integer_strictness: IntegerStrictness) -> Self {
        self.coercion_options.integer_strictness = integer_strictness;
        self
    }

    /// Set the options every request made by the client starts with.
    pub fn request_options(self, request_options: RequestOptions) -> Self {
        Self {
            request_options,
            ..self
        }
    }

    pub fn build(self) -> Client<Tr> {
        Client {
            transport: self.transport,
            coercion_options: self.coercion_options,
            request_options: self.request_options,
        }
    }
}

impl<Tr> Client<Tr>
where
    Tr: Transport,
{
    pub fn new(transport: Tr) -> Self {
        ClientBuilder::new(transport).build()
    }

    pub fn builder(transport: Tr) -> ClientBuilder<Tr> {
        ClientBuilder::new(transport)
    }

    pub fn transport(&self) -> &Tr {
        &self.transport
    }

    pub fn coercion_options(&self) -> &CoercionOptions {
        &self.coercion_options
    }

    pub fn request_options(&self) -> &RequestOptions {
        &self.request_options
    }

    /// Returns a new request starting with the client's request options.
    pub fn new_request<S>(&self, method: Method, path: S) -> Request
    where
        S: Into<String>,
    {
        Request::new(method, path).with_options(self.request_options.clone())
    }

    /// Returns a new request with the given typed value dumped as its JSON body.
    pub fn new_request_with_body<S, B>(&self, method: Method, path: S, body: &B) -> Result<Request>
    where
        S: Into<String>,
        B: Typed,
    {
        Ok(self.new_request(method, path).with_body(dump::dump(body)?))
    }

    /// Send a request and coerce its response into `R`. Fails with [Error::EmptyResponse] if the response has no body.
    pub fn request<R>(&self, request: Request) -> Result<R>
    where
        R: Typed,
    {
        self.request_optional(request)?.ok_or(Error::EmptyResponse)
    }

    /// Send a request and coerce its response into `R`, or return `None` if the response has no body.
    pub fn request_optional<R>(&self, request: Request) -> Result<Option<R>>
    where
        R: Typed,
    {
        let response = self.send(&request)?;

        if response.is_empty() {
            debug!("Got empty {} response", response.status);
            return Ok(None);
        }

        let body = parse_body(&response)?;
        Ok(Some(coerce_with(&body, &self.coercion_options)?))
    }

    /// Send a request whose response carries nothing of interest.
    pub fn execute(&self, request: Request) -> Result<()> {
        self.send(&request)?;
        Ok(())
    }

    /// Send a request whose response is a page of `T`.
    pub fn paginate<T>(&self, request: Request, pagination: Pagination) -> Result<Page<'_, T, Tr>>
    where
        T: Typed,
    {
        let response = self.send(&request)?;

        if response.is_empty() {
            return Err(Error::EmptyResponse);
        }

        let body = parse_body(&response)?;
        Page::from_raw(self, request, pagination, &body)
    }

    /// Send a request and return its JSON body, or `None` if the response has no body.
    pub(crate) fn send_for_json(&self, request: &Request) -> Result<Option<Value>> {
        let response = self.send(request)?;

        if response.is_empty() {
            Ok(None)
        } else {
            parse_body(&response).map(Some)
        }
    }

    fn send(&self, request: &Request) -> Result<RawResponse> {
        debug!("{} {} {:?}", request.method, request.path, request.query);

        if let Some(body) = &request.body {
            trace!("Request body: {body}");
        }

        let response = self.transport.send(request)?;
        trace!("Response {}: {}", response.status, response.body);

        Ok(TransportError::from_response(response)?)
    }
}

fn parse_body(response: &RawResponse) -> Result<Value> {
    Ok(serde_json::from_str(&response.body)?)
}
