// Expectation matching against an observed route
//
// Clauses are tried in order. A clause whose expected device is missing from
// the host falls through to the next clause; every other failure is final.

use thiserror::Error;

use super::{RouteOutcome, RouteResolver};
use crate::config::ExpectationClause;

/// Why the observed interface did not satisfy a device condition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceMismatch {
    /// The expected interface does not exist on this host
    #[error("interface not exist expect=\"{expected}\"")]
    Absent { expected: String },

    /// The expected interface exists but the route uses another one
    #[error("mismatch device current=\"{current}\" expect=\"{expected}\"")]
    NotInUse { current: String, expected: String },
}

/// A route outcome that failed its expectations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    #[error(transparent)]
    Device(DeviceMismatch),

    #[error("mismatch gateway current=\"{current}\" expect=\"{expected}\"")]
    Gateway { current: String, expected: String },

    #[error("mismatch source current=\"{current}\" expect=\"{expected}\"")]
    Source { current: String, expected: String },

    #[error("checked all devices, not matching any current=\"{current}\" expect={checked:?}")]
    AllDevicesChecked { current: String, checked: Vec<String> },
}

fn check_device<R: RouteResolver + ?Sized>(
    current: &str,
    expected: &str,
    resolver: &R,
) -> Result<(), DeviceMismatch> {
    if current == expected {
        return Ok(());
    }
    if resolver.interface_exists(expected) {
        Err(DeviceMismatch::NotInUse {
            current: current.to_string(),
            expected: expected.to_string(),
        })
    } else {
        Err(DeviceMismatch::Absent {
            expected: expected.to_string(),
        })
    }
}

/// Check `outcome` against `clauses`; the first clause that gets past its
/// device condition decides the result.
pub fn evaluate<'a, I, R>(outcome: &RouteOutcome, clauses: I, resolver: &R) -> Result<(), Mismatch>
where
    I: IntoIterator<Item = &'a ExpectationClause>,
    I::IntoIter: ExactSizeIterator,
    R: RouteResolver + ?Sized,
{
    let clauses = clauses.into_iter();
    let count = clauses.len();
    let mut checked_devices = Vec::new();

    for (i, clause) in clauses.enumerate() {
        if let Some(expected) = &clause.device {
            checked_devices.push(expected.clone());

            if let Err(mismatch) = check_device(&outcome.interface, expected, resolver) {
                let is_last = i + 1 == count;
                if matches!(mismatch, DeviceMismatch::Absent { .. }) && !is_last {
                    tracing::debug!("Interface {} not present, trying next expectation", expected);
                    continue;
                }
                if count > 1 {
                    return Err(Mismatch::AllDevicesChecked {
                        current: outcome.interface.clone(),
                        checked: checked_devices,
                    });
                }
                return Err(Mismatch::Device(mismatch));
            }
        }

        if let Some(expected) = &clause.gateway {
            let current = outcome.gateway_text();
            if &current != expected {
                return Err(Mismatch::Gateway {
                    current,
                    expected: expected.clone(),
                });
            }
        }

        if let Some(expected) = &clause.source {
            let current = outcome.source.to_string();
            if &current != expected {
                return Err(Mismatch::Source {
                    current,
                    expected: expected.clone(),
                });
            }
        }

        return Ok(());
    }

    Ok(())
}
