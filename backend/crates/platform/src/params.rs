//! Login parameter extraction
//!
//! Reads request parameters the way a form login sees them: query string
//! first, then an `application/x-www-form-urlencoded` body. The body is
//! buffered and handed back so downstream handlers can still read it.

use axum::body::Body;
use axum::extract::{FromRequest, Query};
use axum::http::{HeaderMap, Method, Request, header};
use axum::Form;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Request parameters in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginParameters {
    pairs: Vec<(String, String)>,
}

impl LoginParameters {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First value for `name`; query parameters win over body parameters.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Error when reading request parameters
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParameterError {
    #[error("Request body could not be read: {0}")]
    UnreadableBody(String),

    #[error("Malformed request parameters: {0}")]
    Malformed(String),
}

/// Extract parameters and return the request with its body restored
///
/// ## Arguments
/// * `req` - the incoming request
/// * `body_limit` - maximum number of body bytes to buffer
pub async fn extract_login_parameters(
    req: Request<Body>,
    body_limit: usize,
) -> Result<(LoginParameters, Request<Body>), ParameterError> {
    let (parts, body) = req.into_parts();

    let Query(mut pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
        .map_err(|e| ParameterError::Malformed(e.body_text()))?;

    let bytes = axum::body::to_bytes(body, body_limit)
        .await
        .map_err(|e| ParameterError::UnreadableBody(e.to_string()))?;

    if is_form_urlencoded(&parts.headers) && !bytes.is_empty() {
        let form_req = Request::builder()
            .method(Method::POST)
            .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(Body::from(bytes.clone()))
            .map_err(|e| ParameterError::Malformed(e.to_string()))?;

        let Form(form_pairs) = Form::<Vec<(String, String)>>::from_request(form_req, &())
            .await
            .map_err(|e| ParameterError::Malformed(e.body_text()))?;
        pairs.extend(form_pairs);
    }

    tracing::trace!(count = pairs.len(), "Extracted login parameters");

    Ok((
        LoginParameters { pairs },
        Request::from_parts(parts, Body::from(bytes)),
    ))
}

fn is_form_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}
