use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// An http request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Method {
    /// The CONNECT method, rfc 7231 §4.3.6.
    Connect,
    /// The DELETE method, rfc 7231 §4.3.5.
    Delete,
    /// The GET method, rfc 7231 §4.3.1.
    #[default]
    Get,
    /// The HEAD method, rfc 7231 §4.3.2.
    Head,
    /// The LOCK method, rfc 4918 §9.10.
    Lock,
    /// The MKCOL method, rfc 4918 §9.3.
    Mkcol,
    /// The MOVE method, rfc 4918 §9.9.
    Move,
    /// The OPTIONS method, rfc 7231 §4.3.7.
    Options,
    /// The PATCH method, rfc 5789.
    Patch,
    /// The POST method, rfc 7231 §4.3.3.
    Post,
    /// The PROPFIND method, rfc 4918 §9.1.
    Propfind,
    /// The PROPPATCH method, rfc 4918 §9.2.
    Proppatch,
    /// The PUT method, rfc 7231 §4.3.4.
    Put,
    /// The QUERY method, draft-ietf-httpbis-safe-method-w-body.
    Query,
    /// The REPORT method, rfc 3253 §3.6.
    Report,
    /// The TRACE method, rfc 7231 §4.3.8.
    Trace,
}

impl Method {
    /// The wire spelling of this method.
    pub fn as_str(&self) -> &'static str {
        use Method::*;
        match self {
            Connect => "CONNECT",
            Delete => "DELETE",
            Get => "GET",
            Head => "HEAD",
            Lock => "LOCK",
            Mkcol => "MKCOL",
            Move => "MOVE",
            Options => "OPTIONS",
            Patch => "PATCH",
            Post => "POST",
            Propfind => "PROPFIND",
            Proppatch => "PROPPATCH",
            Put => "PUT",
            Query => "QUERY",
            Report => "REPORT",
            Trace => "TRACE",
        }
    }

    /// Methods that make no sense without a request body.
    pub fn requires_request_body(&self) -> bool {
        use Method::*;
        matches!(self, Post | Put | Patch | Proppatch | Query | Report)
    }

    /// Methods that must not carry a request body.
    pub fn forbids_request_body(&self) -> bool {
        use Method::*;
        matches!(self, Get | Head)
    }

    /// Whether a 301, 302 or 303 redirect of this method retries as a GET.
    /// PROPFIND is the one body-capable method that redirects as itself.
    pub fn redirects_to_get(&self) -> bool {
        !matches!(self, Method::Propfind)
    }

    /// Whether this method permits a request body at all.
    pub fn permits_request_body(&self) -> bool {
        !self.forbids_request_body()
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Method::*;
        match s {
            "CONNECT" => Ok(Connect),
            "DELETE" => Ok(Delete),
            "GET" => Ok(Get),
            "HEAD" => Ok(Head),
            "LOCK" => Ok(Lock),
            "MKCOL" => Ok(Mkcol),
            "MOVE" => Ok(Move),
            "OPTIONS" => Ok(Options),
            "PATCH" => Ok(Patch),
            "POST" => Ok(Post),
            "PROPFIND" => Ok(Propfind),
            "PROPPATCH" => Ok(Proppatch),
            "PUT" => Ok(Put),
            "QUERY" => Ok(Query),
            "REPORT" => Ok(Report),
            "TRACE" => Ok(Trace),
            _ => Err(crate::Error::UnrecognizedMethod(s.to_string())),
        }
    }
}
