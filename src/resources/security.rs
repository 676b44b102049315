//! Security resources: key pairs and security groups.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use super::Identified;
use crate::backend::{ComputeBackend, RawKeyPair, RawSecurityGroup, RawSecurityGroupRule, RuleCreate};
use crate::error::{CloudError, idempotent_delete};

/// SSH key pair.
///
/// The private key material is only available on the value returned by
/// `create`; the provider never exposes it again. It is redacted from the
/// `Debug` output.
#[derive(Clone)]
pub struct KeyPair {
    raw: RawKeyPair,
    compute: Arc<dyn ComputeBackend>,
}

impl KeyPair {
    /// Wraps a freshly generated key pair, keeping its private key.
    pub(crate) fn created(raw: RawKeyPair, compute: Arc<dyn ComputeBackend>) -> Self {
        Self { raw, compute }
    }

    /// Wraps a listed or looked-up key pair; any material is discarded.
    pub(crate) fn listed(mut raw: RawKeyPair, compute: Arc<dyn ComputeBackend>) -> Self {
        raw.private_key = None;
        Self { raw, compute }
    }

    /// Key pair name, which is also its identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    /// Public key fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.raw.fingerprint
    }

    /// OpenSSH public key.
    #[must_use]
    pub fn public_key(&self) -> &str {
        &self.raw.public_key
    }

    /// Private key material; `Some` only on the value returned by `create`.
    #[must_use]
    pub fn material(&self) -> Option<&str> {
        self.raw.private_key.as_deref()
    }

    /// Deletes the key pair.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when the backend rejects the request
    /// for any reason other than the key pair already being gone.
    pub async fn delete(&self) -> Result<bool, CloudError> {
        info!(key_pair = %self.raw.name, "deleting key pair");
        idempotent_delete(self.compute.delete_keypair(&self.raw.name).await)
    }
}

impl Identified for KeyPair {
    fn id(&self) -> &str {
        &self.raw.name
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").field("raw", &self.raw).finish()
    }
}

/// Ingress rule of a security group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SecurityGroupRule {
    raw: RawSecurityGroupRule,
}

impl SecurityGroupRule {
    pub(crate) const fn new(raw: RawSecurityGroupRule) -> Self {
        Self { raw }
    }

    /// Rule identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.raw.id
    }

    /// Protocol, absent when the rule matches every protocol.
    #[must_use]
    pub fn ip_protocol(&self) -> Option<&str> {
        self.raw.ip_protocol.as_deref()
    }

    /// First port of the range.
    #[must_use]
    pub const fn from_port(&self) -> Option<i32> {
        self.raw.from_port
    }

    /// Last port of the range.
    #[must_use]
    pub const fn to_port(&self) -> Option<i32> {
        self.raw.to_port
    }

    /// Source CIDR, absent for group-sourced rules.
    #[must_use]
    pub fn cidr(&self) -> Option<&str> {
        self.raw.ip_range.cidr.as_deref()
    }

    /// Source group name, for group-to-group rules.
    #[must_use]
    pub fn source_group(&self) -> Option<&str> {
        self.raw.group.as_ref().map(|group| group.name.as_str())
    }
}

/// Named set of ingress rules.
#[derive(Clone)]
pub struct SecurityGroup {
    raw: RawSecurityGroup,
    compute: Arc<dyn ComputeBackend>,
}

impl SecurityGroup {
    pub(crate) fn new(raw: RawSecurityGroup, compute: Arc<dyn ComputeBackend>) -> Self {
        Self { raw, compute }
    }

    /// Group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    /// Free-form description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.raw.description
    }

    /// Rules at the time the record was fetched.
    #[must_use]
    pub fn rules(&self) -> Vec<SecurityGroupRule> {
        self.raw
            .rules
            .iter()
            .cloned()
            .map(SecurityGroupRule::new)
            .collect()
    }

    /// Adds an ingress rule allowing `ip_protocol` traffic on
    /// `from_port..=to_port` from `cidr`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for an inverted port range, or the
    /// backend failure otherwise.
    pub async fn add_rule(
        &self,
        ip_protocol: &str,
        from_port: i32,
        to_port: i32,
        cidr: &str,
    ) -> Result<SecurityGroupRule, CloudError> {
        if from_port > to_port {
            return Err(CloudError::Validation(format!(
                "port range {from_port}-{to_port} is inverted"
            )));
        }
        let request = RuleCreate {
            group_id: self.raw.id.clone(),
            ip_protocol: ip_protocol.to_owned(),
            from_port,
            to_port,
            cidr: cidr.to_owned(),
        };
        info!(group_id = %self.raw.id, ip_protocol, from_port, to_port, cidr, "adding rule");
        let raw = self.compute.create_security_group_rule(&request).await?;
        Ok(SecurityGroupRule::new(raw))
    }

    /// Deletes the group.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Compute`] when the backend rejects the request
    /// for any reason other than the group already being gone.
    pub async fn delete(&self) -> Result<bool, CloudError> {
        info!(group_id = %self.raw.id, "deleting security group");
        idempotent_delete(self.compute.delete_security_group(&self.raw.id).await)
    }
}

impl Identified for SecurityGroup {
    fn id(&self) -> &str {
        &self.raw.id
    }
}

impl fmt::Debug for SecurityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityGroup").field("raw", &self.raw).finish()
    }
}
