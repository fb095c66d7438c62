//! Request methods as the pipeline names them.

use std::fmt;

use http::Method;

use crate::protocol::TransportError;

/// The verbs the pipeline layer can ask for.
///
/// The pipeline's vocabulary is wider than what this transport speaks on the
/// wire: only `GET`, `POST`, `PUT` and `DELETE` have a mapping, every other
/// verb fails with [`TransportError::UnsupportedMethod`] before any I/O.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
}

impl RequestMethod {
    /// Maps the pipeline verb to its wire-level method.
    pub fn to_http(self) -> Result<Method, TransportError> {
        match self {
            RequestMethod::Get => Ok(Method::GET),
            RequestMethod::Post => Ok(Method::POST),
            RequestMethod::Put => Ok(Method::PUT),
            RequestMethod::Delete => Ok(Method::DELETE),
            RequestMethod::Head | RequestMethod::Patch => {
                Err(TransportError::UnsupportedMethod { method: self.as_str().to_string() })
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Head => "HEAD",
            RequestMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
