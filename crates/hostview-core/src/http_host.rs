//! Building an [`Environment`] from an `http::Request`
//!
//! Lets a hyper-based server hand its requests to [`ServerRequest`](crate::ServerRequest)
//! without writing its own environment mapping.

use crate::body::HttpBody;
use crate::environment::{Environment, RawHeaders};
use crate::error::BoxError;
use hyper::body::Body;
use std::net::SocketAddr;

impl Environment {
    /// Map an `http::Request` onto the well-known environment keys.
    ///
    /// Header values that are not valid UTF-8 are kept lossily. The body is
    /// installed as an [`HttpBody`], so it is only collected if the form view
    /// asks for it. Request extensions are dropped; hosts that need them
    /// (for upgrades, say) must take them out first.
    ///
    /// ```rust
    /// use hostview_core::{Environment, ServerRequest};
    /// use http_body_util::Empty;
    /// use bytes::Bytes;
    ///
    /// let req = http::Request::get("http://example.com:8080/items?page=2")
    ///     .header("X-Trace", "abc")
    ///     .body(Empty::<Bytes>::new())
    ///     .unwrap();
    ///
    /// let view = ServerRequest::new(Environment::from_http_request(req, None));
    /// assert_eq!(view.url().unwrap().as_str(), "http://example.com:8080/items?page=2");
    /// assert_eq!(view.header("x-trace"), Some("abc"));
    /// ```
    pub fn from_http_request<B>(req: http::Request<B>, remote: Option<SocketAddr>) -> Self
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let uri = &parts.uri;

        let mut headers = RawHeaders::new();
        for name in parts.headers.keys() {
            for value in parts.headers.get_all(name) {
                headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
            }
        }

        let mut builder = Environment::builder()
            .scheme(uri.scheme_str().unwrap_or("http"))
            .method(parts.method.as_str())
            .protocol(format!("{:?}", parts.version))
            .path(uri.path())
            .query_string(uri.query().unwrap_or_default())
            .headers(headers)
            .body(HttpBody::new(body));

        if let Some(host) = uri.host() {
            builder = builder.host(host.trim_start_matches('[').trim_end_matches(']'));
        }
        if let Some(port) = uri.port_u16() {
            builder = builder.port(port);
        }
        if let Some(remote) = remote {
            builder = builder
                .remote_address(remote.ip().to_string())
                .remote_port(remote.port().to_string());
        }

        crate::log_debug!(
            method = %parts.method,
            path = uri.path(),
            "environment built from http request"
        );
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServerRequest;
    use bytes::Bytes;
    use http_body_util::Full;

    fn post(body: &'static str) -> http::Request<Full<Bytes>> {
        http::Request::post("/login?next=%2Fhome")
            .header("Host", "app.local:3000")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Cookie", "sid=42")
            .header("Accept", "text/html")
            .header("Accept", "application/json")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    #[tokio::test]
    async fn maps_request_parts() {
        let remote: SocketAddr = "192.168.1.5:50000".parse().unwrap();
        let env = Environment::from_http_request(post("user=ada&pass=x"), Some(remote));
        let view = ServerRequest::new(env);

        assert_eq!(view.method(), "POST");
        assert_eq!(view.url().unwrap().as_str(), "http://app.local:3000/login?next=%2Fhome");
        assert_eq!(view.query_params().get("next"), Some("/home"));
        assert_eq!(view.headers().get_all("accept"), ["text/html", "application/json"]);
        assert_eq!(view.cookie("sid").map(|c| c.value.as_str()), Some("42"));
        assert_eq!(view.server_variables().get("REMOTE_ADDR"), Some("192.168.1.5"));
        assert_eq!(view.server_variables().get("SERVER_PROTOCOL"), Some("HTTP/1.1"));
        assert_eq!(view.form().await.unwrap().get("user"), Some("ada"));
    }

    #[test]
    fn absolute_uri_supplies_host_and_port() {
        let req = http::Request::get("https://[::1]:8443/")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let view = ServerRequest::new(Environment::from_http_request(req, None));
        assert_eq!(view.url().unwrap().as_str(), "https://[::1]:8443/");
    }
}
