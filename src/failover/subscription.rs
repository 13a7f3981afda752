//! The subscription this process keeps alive.

use crate::failover::host::HostId;

/// Channel and owning host. Built once at startup; every resubscription
/// targets the same pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDescriptor {
    channel: String,
    host: HostId,
}

impl SubscriptionDescriptor {
    pub fn new(channel: impl Into<String>, host: HostId) -> Self {
        Self {
            channel: channel.into(),
            host,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn host(&self) -> &HostId {
        &self.host
    }
}
