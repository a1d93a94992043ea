// Routes module - expands targets, resolves routes and checks expectations

pub mod expect;
pub mod range;
pub mod system;
pub mod verify;

use std::fmt;
use std::net::Ipv4Addr;

use crate::error::AppResult;

/// What the host's network stack would pick for one destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    pub interface: String,
    /// None for on-link destinations
    pub gateway: Option<Ipv4Addr>,
    pub source: Ipv4Addr,
}

impl RouteOutcome {
    /// Textual gateway as compared against expectations
    pub fn gateway_text(&self) -> String {
        match self.gateway {
            Some(gateway) => gateway.to_string(),
            None => "none".to_string(),
        }
    }
}

impl fmt::Display for RouteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dev {} via {} src {}",
            self.interface,
            self.gateway_text(),
            self.source
        )
    }
}

/// Host routing capabilities the verifier depends on
pub trait RouteResolver {
    /// Ask the host which route it would use for `dest` right now
    fn resolve(&self, dest: Ipv4Addr) -> AppResult<RouteOutcome>;

    /// Whether a network interface with this name exists on the host
    fn interface_exists(&self, name: &str) -> bool;
}

impl<R: RouteResolver + ?Sized> RouteResolver for &R {
    fn resolve(&self, dest: Ipv4Addr) -> AppResult<RouteOutcome> {
        (**self).resolve(dest)
    }

    fn interface_exists(&self, name: &str) -> bool {
        (**self).interface_exists(name)
    }
}
