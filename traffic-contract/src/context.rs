//! Per-invocation caller context
//!
//! Constructed once per invocation from the substrate-verified caller
//! credential and the transient field set, then passed immutably to every
//! operation. Nothing here changes mid-invocation.

use crate::transient::TransientInputs;
use crate::types::OrgId;

/// Immutable invocation context
#[derive(Debug, Clone)]
pub struct InvocationContext {
    caller: OrgId,
    transient: TransientInputs,
}

impl InvocationContext {
    /// Context with transient input (private-asset creates)
    pub fn new(caller: OrgId, transient: TransientInputs) -> Self {
        Self { caller, transient }
    }

    /// Context for operations that carry no transient input
    pub fn without_transient(caller: OrgId) -> Self {
        Self {
            caller,
            transient: TransientInputs::new(),
        }
    }

    /// The invoking organization, as verified by the substrate
    pub fn caller_org(&self) -> &OrgId {
        &self.caller
    }

    /// The invocation's transient field set
    pub fn transient(&self) -> &TransientInputs {
        &self.transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_exposes_caller() {
        let ctx = InvocationContext::without_transient(OrgId::new("MVDMSP"));
        assert_eq!(ctx.caller_org().as_str(), "MVDMSP");
        assert!(ctx.transient().is_empty());
    }
}
