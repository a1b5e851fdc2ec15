//! A blocking [Transport] over HTTPS, built on [reqwest].

use std::{collections::BTreeMap, thread, time::Duration};

use log::{debug, warn};
use reqwest::header;

use super::transport::{Method, RawResponse, Request, Transport, TransportError};

const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1/";

/// Sends requests to the API with a bearer access token.
///
/// When the API answers with a rate-limit response and the request allows it, the transport waits the time the API
/// asks for and sends the request again. Otherwise the response is returned as is.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    base_url: String,
    access_token: String,
}

impl HttpTransport {
    pub fn new<S>(access_token: S) -> Result<Self, TransportError>
    where
        S: Into<String>,
    {
        Ok(Self {
            http: reqwest::blocking::Client::builder().build()?,
            base_url: DEFAULT_BASE_URL.to_owned(),
            access_token: access_token.into(),
        })
    }

    /// Send requests relative to another base URL. A trailing slash is added if it's missing.
    pub fn with_base_url<S>(self, base_url: S) -> Self
    where
        S: Into<String>,
    {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self { base_url, ..self }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_http_request(&self, request: &Request) -> reqwest::blocking::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, request.path))
            .bearer_auth(&self.access_token)
            .query(&request.query);

        if let Some(timeout) = request.options.timeout {
            builder = builder.timeout(timeout);
        }

        for (name, value) in &request.options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        match &request.body {
            Some(body) => builder.json(body),
            // the API wants a content length even with no body
            None if request.method.has_body() => builder.header(header::CONTENT_LENGTH, 0),
            None => builder,
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        loop {
            let response = self.build_http_request(request).send()?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_ascii_lowercase(), value.to_owned()))
                })
                .collect::<BTreeMap<_, _>>();

            let response = RawResponse {
                status,
                headers,
                body: response.text()?,
            };

            if status == 429 && request.options.react_to_rate_limit {
                if let Some(wait_time) = response.retry_after() {
                    warn!("Got 429 rate-limit response with Retry-After: {wait_time}, retrying after waiting");
                    thread::sleep(Duration::from_secs(wait_time));
                    continue;
                }

                warn!("Invalid rate-limit response");
            }

            debug!("{} {} -> {status}", request.method, request.path);

            // all other responses, even erroneous ones, are returned to the client
            return Ok(response);
        }
    }
}
