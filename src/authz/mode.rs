//! Authorization mode selection.
//!
//! The five modes have a defined precedence; keeping selection as a pure
//! function over the request shape makes that precedence auditable in
//! isolation from the handler bodies.

/// The authorization mode applied to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Basic auth only: resolve the caller's own claim.
    Basic,

    /// Basic auth acting on a child tenant identified by `client_id`.
    DelegatedBasic,

    /// `client_id` plus a separate on-behalf-of user token.
    DelegatedOnBehalf,

    /// `client_id` with the primary credential itself being a user token.
    DelegatedUserToken,

    /// The primary credential is treated as a user token.
    UserToken,
}

/// Select the mode for a request shape.
///
/// Deterministic over all eight combinations of the three predicates.
#[must_use]
pub const fn select_mode(
    client_id_present: bool,
    user_token_present: bool,
    primary_is_jwt: bool,
) -> AuthMode {
    match (client_id_present, user_token_present, primary_is_jwt) {
        (false, false, false) => AuthMode::Basic,
        (true, false, false) => AuthMode::DelegatedBasic,
        (true, true, _) => AuthMode::DelegatedOnBehalf,
        (true, false, true) => AuthMode::DelegatedUserToken,
        (false, false, true) | (false, true, _) => AuthMode::UserToken,
    }
}
