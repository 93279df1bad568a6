//! Desired-state types and lifecycle configuration.

use crate::error::{Error, Result};
use crate::perm::Permissions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Declared desired state of a VM.
///
/// `template_id` and `network` are the only required attributes; everything
/// else is optional and, when left unset, computed by the remote side.
/// CPU, vCPU, memory and the static address are immutable after creation
/// (changing them means replacing the VM); name, permissions and disk size
/// can be changed in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSpec {
    /// VM name. If unset, the remote-assigned instance name is accepted.
    pub name: Option<String>,
    /// Id of the VM template to instantiate. Creation-time selector only.
    pub template_id: i64,
    /// CPU count. Immutable after creation.
    pub cpu: Option<i64>,
    /// Virtual CPU count. Immutable after creation.
    pub vcpu: Option<i64>,
    /// Memory in MB. Immutable after creation.
    pub memory: Option<i64>,
    /// Disk descriptor.
    pub disk: DiskSpec,
    /// Network interface descriptor.
    pub nic: NicSpec,
    /// Permission triple ("640" style). Defaults to the configured value
    /// if still unset after creation.
    pub permissions: Option<String>,
}

/// Declared disk attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpec {
    /// Image name
    pub image: Option<String>,
    /// Image owner
    pub image_uname: Option<String>,
    /// Image driver
    pub driver: Option<String>,
    /// Disk size in MB. Mutable in place.
    pub size: Option<i64>,
}

/// Declared network interface attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicSpec {
    /// Network name (required)
    pub network: String,
    /// Network owner
    pub network_uname: Option<String>,
    /// Search domain
    pub search_domain: Option<String>,
    /// Security group id
    pub security_group_id: Option<i64>,
    /// Static address in dotted-quad form. Immutable after creation.
    pub ip: Option<String>,
}

impl VmSpec {
    /// Create a spec with the two required attributes.
    pub fn new(template_id: i64, network: impl Into<String>) -> Self {
        Self {
            template_id,
            nic: NicSpec {
                network: network.into(),
                ..NicSpec::default()
            },
            ..Self::default()
        }
    }

    /// Set the VM name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the CPU count.
    pub fn with_cpu(mut self, cpu: i64) -> Self {
        self.cpu = Some(cpu);
        self
    }

    /// Set the virtual CPU count.
    pub fn with_vcpu(mut self, vcpu: i64) -> Self {
        self.vcpu = Some(vcpu);
        self
    }

    /// Set the memory size in MB.
    pub fn with_memory(mut self, memory: i64) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Set the disk size in MB.
    pub fn with_size(mut self, size: i64) -> Self {
        self.disk.size = Some(size);
        self
    }

    /// Set the disk image name.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.disk.image = Some(image.into());
        self
    }

    /// Set the static network address.
    pub fn with_address(mut self, ip: impl Into<String>) -> Self {
        self.nic.ip = Some(ip.into());
        self
    }

    /// Set the permission triple.
    pub fn with_permissions(mut self, permissions: impl Into<String>) -> Self {
        self.permissions = Some(permissions.into());
        self
    }

    /// Validate every declared value that has a shape requirement.
    ///
    /// Runs before any remote call: a malformed permission string or
    /// address never reaches the wire. String values headed for the
    /// instantiation payload are interpolated verbatim inside double
    /// quotes, so an embedded quote is rejected here as well.
    pub fn validate(&self) -> Result<()> {
        if let Some(permissions) = &self.permissions {
            Permissions::from_octal_str(permissions)?;
        }
        if let Some(ip) = &self.nic.ip {
            validate_address(ip)?;
        }

        let payload_fields = [
            ("name", self.name.as_deref()),
            ("network", Some(self.nic.network.as_str())),
            ("network_uname", self.nic.network_uname.as_deref()),
            ("search_domain", self.nic.search_domain.as_deref()),
            ("ip", self.nic.ip.as_deref()),
            ("image", self.disk.image.as_deref()),
            ("image_uname", self.disk.image_uname.as_deref()),
            ("driver", self.disk.driver.as_deref()),
        ];
        for (field, value) in payload_fields {
            if let Some(value) = value {
                if value.contains('"') {
                    return Err(Error::validation(format!(
                        "{field} value {value:?} contains a quote character"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Validate a dotted-quad address: exactly four period-separated
/// components, each an integer in `[0, 255]`.
pub fn validate_address(addr: &str) -> Result<()> {
    let octets: Vec<&str> = addr.split('.').collect();
    if octets.len() != 4 {
        return Err(Error::validation(format!(
            "address {addr:?} does not consist of four octets"
        )));
    }
    for octet in octets {
        let value: i64 = octet.parse().map_err(|_| {
            Error::validation(format!("address {addr:?} has non-numeric octet {octet:?}"))
        })?;
        if !(0..=255).contains(&value) {
            return Err(Error::validation(format!(
                "address {addr:?} has octet {octet} outside 0-255"
            )));
        }
    }
    Ok(())
}

/// Timing bounds for one polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Total time allowed; exceeding it is a fatal timeout
    pub timeout: Duration,
    /// Fixed delay between refresh attempts
    pub interval: Duration,
    /// Delay before the first refresh attempt
    pub initial_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            interval: Duration::from_secs(10),
            initial_delay: Duration::ZERO,
        }
    }
}

impl PollConfig {
    /// Create a poll config with custom bounds and no initial delay.
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            initial_delay: Duration::ZERO,
        }
    }
}

/// Configuration for the lifecycle controller.
///
/// These were package-level constants in earlier designs; they are explicit
/// values here so tests and deployments can override them per client.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Permission triple applied when the spec declares none
    pub default_permissions: String,
    /// Poll bounds for the create and delete state waits
    pub poll: PollConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            default_permissions: "640".to_string(),
            poll: PollConfig::default(),
        }
    }
}
