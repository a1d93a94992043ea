// Route verification driver

use std::fmt;
use std::net::Ipv4Addr;

use super::expect::{self, Mismatch};
use super::range::parse_target;
use super::RouteResolver;
use crate::config::VerificationConfig;
use crate::error::AppResult;

/// A failed expectation for one probed address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchRecord {
    pub route_name: String,
    /// Normalized target of the route (`a.b.c.d/len`)
    pub target: String,
    pub address: Ipv4Addr,
    pub mismatch: Mismatch,
}

impl fmt::Display for MismatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name=\"{}\" ip=\"{}\" {}",
            self.route_name, self.target, self.mismatch
        )
    }
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct VerificationReport {
    pub routes_checked: usize,
    pub addresses_checked: u64,
    pub mismatches: Vec<MismatchRecord>,
}

impl VerificationReport {
    pub fn is_success(&self) -> bool {
        self.mismatches.is_empty()
    }
}

pub struct RouteVerifier<R> {
    resolver: R,
}

impl<R: RouteResolver> RouteVerifier<R> {
    pub fn new(resolver: R) -> Self {
        RouteVerifier { resolver }
    }

    /// Probe every address of every route in order.
    ///
    /// Invalid targets and failed lookups abort the run with an error.
    /// Mismatches are collected in the report; with `fail_fast` the run
    /// stops at the first one.
    pub fn run(&self, config: &VerificationConfig) -> AppResult<VerificationReport> {
        let mut report = VerificationReport::default();

        for route in &config.routes {
            let range = parse_target(&route.target)?;
            let target = range.to_string();

            tracing::info!(
                name = %route.name,
                ip = %target,
                num_ips = range.len(),
                expects = route.expectations.len(),
                "checking route"
            );
            report.routes_checked += 1;

            for address in range.iter() {
                let outcome = self.resolver.resolve(address)?;
                report.addresses_checked += 1;
                tracing::debug!("{} -> {}", address, outcome);

                if let Err(mismatch) = expect::evaluate(&outcome, route.clauses(), &self.resolver) {
                    let record = MismatchRecord {
                        route_name: route.name.clone(),
                        target: target.clone(),
                        address,
                        mismatch,
                    };
                    tracing::debug!(%address, "{}", record);
                    report.mismatches.push(record);

                    if config.fail_fast {
                        return Ok(report);
                    }
                }
            }
        }

        Ok(report)
    }
}
