use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// The protocol a response was carried over, identified by its wire label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Protocol {
    /// `http/1.0`
    Http10,
    /// `http/1.1`
    #[default]
    Http11,
    /// `h2`
    H2,
    /// `h2_prior_knowledge`: cleartext http/2 with no upgrade round trip.
    H2PriorKnowledge,
    /// `quic`: the historical label for http/3's transport.
    Quic,
    /// `h3`, including draft versions.
    H3,
}

impl Protocol {
    /// The wire label.
    pub fn as_str(&self) -> &'static str {
        use Protocol::*;
        match self {
            Http10 => "http/1.0",
            Http11 => "http/1.1",
            H2 => "h2",
            H2PriorKnowledge => "h2_prior_knowledge",
            Quic => "quic",
            H3 => "h3",
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Protocol::*;
        match s {
            "http/1.0" => Ok(Http10),
            "http/1.1" => Ok(Http11),
            "h2" => Ok(H2),
            "h2_prior_knowledge" => Ok(H2PriorKnowledge),
            "quic" => Ok(Quic),
            // h3 drafts identify as h3-29 and the like
            _ if s == "h3" || s.starts_with("h3-") => Ok(H3),
            _ => Err(crate::Error::UnexpectedProtocol(s.to_string())),
        }
    }
}
