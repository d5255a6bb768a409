//! Provisioning port — network association and interactive setup.
//!
//! The captive setup surface is an external collaborator. Its only contract
//! with the core is to hand back the settings the operator entered.

use std::future::Future;

use dhtnode_domain::error::NodeError;
use dhtnode_domain::settings::Settings;

/// Result of a provisioning round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    /// The network is joined and the settings were left as they were.
    Unchanged,
    /// The operator entered new settings; they must be persisted.
    Changed(Settings),
}

/// Joins the network, optionally collecting new settings on the way.
pub trait Provisioner {
    /// Run provisioning with the currently persisted settings.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Provisioning`] when the node cannot join the
    /// network. The documented recovery is a full restart.
    fn provision(
        &mut self,
        current: &Settings,
    ) -> impl Future<Output = Result<ProvisioningOutcome, NodeError>> + Send;
}
