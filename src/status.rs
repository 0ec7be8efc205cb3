//! HTTP status codes as a typed enum.
//!
//! Anything that takes a status accepts `impl Into<u16>`, so a bare `500`
//! works as well as `Status::InternalServerError`.
//!
//! ```rust
//! use parapet::{Response, Status};
//!
//! Response::status(Status::NoContent);
//! Response::builder().status(Status::Created).no_body();
//! ```

macro_rules! statuses {
    ($($(#[$doc:meta])* $name:ident = $code:literal,)*) => {
        /// The status codes parapet names. Other codes go through `u16`.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Status {
            $($(#[$doc])* $name,)*
        }

        impl Status {
            /// Numeric code, e.g. `404`.
            pub const fn code(self) -> u16 {
                match self {
                    $(Self::$name => $code,)*
                }
            }

            /// Looks up a named status by code.
            pub const fn from_code(code: u16) -> Option<Self> {
                match code {
                    $($code => Some(Self::$name),)*
                    _ => None,
                }
            }
        }
    };
}

statuses! {
    Continue                      = 100,
    SwitchingProtocols            = 101,
    Ok                            = 200,
    Created                       = 201,
    Accepted                      = 202,
    NoContent                     = 204,
    MovedPermanently              = 301,
    Found                         = 302,
    SeeOther                      = 303,
    NotModified                   = 304,
    TemporaryRedirect             = 307,
    PermanentRedirect             = 308,
    BadRequest                    = 400,
    Unauthorized                  = 401,
    Forbidden                     = 403,
    NotFound                      = 404,
    MethodNotAllowed              = 405,
    NotAcceptable                 = 406,
    RequestTimeout                = 408,
    Conflict                      = 409,
    Gone                          = 410,
    ContentTooLarge               = 413,
    UnsupportedMediaType          = 415,
    UnprocessableContent          = 422,
    TooManyRequests               = 429,
    /// The generic server-fault status. Recovered panics default to it.
    InternalServerError           = 500,
    NotImplemented                = 501,
    BadGateway                    = 502,
    ServiceUnavailable            = 503,
    GatewayTimeout                = 504,
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}
