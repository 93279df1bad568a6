//! Typed decode of the provider's VM records.
//!
//! The remote side reports a VM's lifecycle as a pair of numeric codes
//! (`STATE`, `LCM_STATE`). All transition logic in this crate runs against
//! the named [`LifecycleState`] derived from that pair, never against the
//! raw integers.

use crate::error::Result;
use crate::perm::Permissions;
use serde::Deserialize;
use std::fmt;

/// `STATE` code for an active VM.
pub const STATE_ACTIVE: i64 = 3;
/// `LCM_STATE` code for a running VM.
pub const LCM_STATE_RUNNING: i64 = 3;
/// `STATE` code for a terminated VM. A record in this state may still be
/// transiently readable, but the VM no longer exists.
pub const STATE_DONE: i64 = 6;

/// Named lifecycle state of a VM, derived from the `(STATE, LCM_STATE)`
/// code pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Any code pair that is neither running nor done. Provisioning,
    /// shutdown and every intermediate phase land here; none of them is an
    /// error, they just mean "keep waiting".
    Pending,
    /// Fully usable: `STATE` is active and `LCM_STATE` is running. A match
    /// on only one of the two codes is still [`LifecycleState::Pending`].
    Running,
    /// Terminated.
    Done,
}

impl LifecycleState {
    /// Map the numeric code pair to a named state.
    pub fn from_codes(state: i64, lcm_state: i64) -> Self {
        if state == STATE_DONE {
            LifecycleState::Done
        } else if state == STATE_ACTIVE && lcm_state == LCM_STATE_RUNNING {
            LifecycleState::Running
        } else {
            LifecycleState::Pending
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Running => "running",
            LifecycleState::Done => "done",
        };
        write!(f, "{name}")
    }
}

/// A VM record as returned by `one.vm.info` and `one.vmpool.info`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VmInfo {
    /// Remote-assigned identity. Immutable once set; the sole lookup key.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Instance name
    #[serde(rename = "NAME")]
    pub name: String,
    /// Owning user id
    #[serde(rename = "UID")]
    pub uid: i64,
    /// Owning group id
    #[serde(rename = "GID")]
    pub gid: i64,
    /// Owning user name
    #[serde(rename = "UNAME")]
    pub uname: String,
    /// Owning group name
    #[serde(rename = "GNAME")]
    pub gname: String,
    /// Permission bits
    #[serde(rename = "PERMISSIONS")]
    pub permissions: Option<Permissions>,
    /// Primary lifecycle state code
    #[serde(rename = "STATE")]
    pub state: i64,
    /// Secondary (detailed) lifecycle state code
    #[serde(rename = "LCM_STATE")]
    pub lcm_state: i64,
    /// Embedded resource attributes
    #[serde(rename = "TEMPLATE")]
    pub template: VmTemplate,
}

impl VmInfo {
    /// The named lifecycle state of this record.
    pub fn lifecycle_state(&self) -> LifecycleState {
        LifecycleState::from_codes(self.state, self.lcm_state)
    }

    /// Whether this record describes a VM that no longer exists. A
    /// terminated VM counts as nonexistent even while its record can
    /// still be read.
    pub fn nonexistent(&self) -> bool {
        self.lifecycle_state() == LifecycleState::Done
    }
}

/// The `<TEMPLATE>` block of a VM record.
///
/// Every nested block is optional in the decode: a record with no NIC or
/// DISK still reads cleanly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VmTemplate {
    /// CPU count
    #[serde(rename = "CPU")]
    pub cpu: i64,
    /// Virtual CPU count
    #[serde(rename = "VCPU")]
    pub vcpu: i64,
    /// Memory in MB
    #[serde(rename = "MEMORY")]
    pub memory: i64,
    /// Network interface
    #[serde(rename = "NIC")]
    pub nic: NicInfo,
    /// Disk
    #[serde(rename = "DISK")]
    pub disk: DiskInfo,
    /// Contextualization block carrying the assigned address
    #[serde(rename = "CONTEXT")]
    pub context: ContextInfo,
}

/// The `<NIC>` block of a VM record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NicInfo {
    /// Network name
    #[serde(rename = "NETWORK")]
    pub network: String,
    /// Network owner
    #[serde(rename = "NETWORK_UNAME")]
    pub network_uname: String,
    /// Search domain
    #[serde(rename = "SEARCH_DOMAIN")]
    pub search_domain: String,
    /// Security group id
    #[serde(rename = "SECURITY_GROUPS")]
    pub security_group_id: i64,
}

/// The `<DISK>` block of a VM record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiskInfo {
    /// Image name
    #[serde(rename = "IMAGE")]
    pub image: String,
    /// Disk size in MB
    #[serde(rename = "SIZE")]
    pub size: i64,
    /// Image driver
    #[serde(rename = "DRIVER")]
    pub driver: String,
    /// Image owner
    #[serde(rename = "IMAGE_UNAME")]
    pub image_uname: String,
}

/// The `<CONTEXT>` block of a VM record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContextInfo {
    /// Network-assigned address of the first interface
    #[serde(rename = "ETH0_IP")]
    pub ip: String,
}

/// A `<VM_POOL>` listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VmPool {
    /// All VM records in the listing
    #[serde(rename = "VM")]
    pub vms: Vec<VmInfo>,
}

/// Decode a single VM record.
pub fn parse_vm(xml: &str) -> Result<VmInfo> {
    Ok(quick_xml::de::from_str(xml)?)
}

/// Decode a pool listing.
pub fn parse_vm_pool(xml: &str) -> Result<VmPool> {
    Ok(quick_xml::de::from_str(xml)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING_VM: &str = r#"
        <VM>
          <ID>345</ID>
          <NAME>vm1</NAME>
          <UID>2</UID>
          <GID>100</GID>
          <UNAME>oneadmin</UNAME>
          <GNAME>users</GNAME>
          <PERMISSIONS>
            <OWNER_U>1</OWNER_U><OWNER_M>1</OWNER_M><OWNER_A>0</OWNER_A>
            <GROUP_U>1</GROUP_U><GROUP_M>0</GROUP_M><GROUP_A>0</GROUP_A>
            <OTHER_U>0</OTHER_U><OTHER_M>0</OTHER_M><OTHER_A>0</OTHER_A>
          </PERMISSIONS>
          <STATE>3</STATE>
          <LCM_STATE>3</LCM_STATE>
          <TEMPLATE>
            <CPU>2</CPU>
            <VCPU>4</VCPU>
            <MEMORY>2048</MEMORY>
            <NIC>
              <NETWORK>net0</NETWORK>
              <NETWORK_UNAME>oneadmin</NETWORK_UNAME>
              <SEARCH_DOMAIN>example.test</SEARCH_DOMAIN>
              <SECURITY_GROUPS>101</SECURITY_GROUPS>
            </NIC>
            <DISK>
              <IMAGE>debian-12</IMAGE>
              <SIZE>20480</SIZE>
              <DRIVER>qcow2</DRIVER>
              <IMAGE_UNAME>oneadmin</IMAGE_UNAME>
            </DISK>
            <CONTEXT>
              <ETH0_IP>10.0.0.5</ETH0_IP>
            </CONTEXT>
          </TEMPLATE>
        </VM>"#;

    #[test]
    fn test_state_mapping() {
        assert_eq!(LifecycleState::from_codes(3, 3), LifecycleState::Running);
        assert_eq!(LifecycleState::from_codes(6, 0), LifecycleState::Done);
        assert_eq!(LifecycleState::from_codes(6, 3), LifecycleState::Done);
        // A match on only one of the two codes is not running.
        assert_eq!(LifecycleState::from_codes(3, 2), LifecycleState::Pending);
        assert_eq!(LifecycleState::from_codes(1, 3), LifecycleState::Pending);
        assert_eq!(LifecycleState::from_codes(1, 0), LifecycleState::Pending);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(LifecycleState::Running.to_string(), "running");
        assert_eq!(LifecycleState::Done.to_string(), "done");
        assert_eq!(LifecycleState::Pending.to_string(), "pending");
    }

    #[test]
    fn test_parse_full_record() {
        let vm = parse_vm(RUNNING_VM).unwrap();
        assert_eq!(vm.id, 345);
        assert_eq!(vm.name, "vm1");
        assert_eq!(vm.uid, 2);
        assert_eq!(vm.gname, "users");
        assert_eq!(vm.lifecycle_state(), LifecycleState::Running);
        assert_eq!(vm.template.cpu, 2);
        assert_eq!(vm.template.memory, 2048);
        assert_eq!(vm.template.nic.network, "net0");
        assert_eq!(vm.template.nic.security_group_id, 101);
        assert_eq!(vm.template.disk.size, 20480);
        assert_eq!(vm.template.context.ip, "10.0.0.5");
        assert_eq!(vm.permissions.unwrap().to_octal_string(), "640");
    }

    #[test]
    fn test_parse_sparse_record() {
        // No NIC, DISK, CONTEXT or PERMISSIONS: everything defaults.
        let xml = r"
            <VM>
              <ID>12</ID>
              <NAME>bare</NAME>
              <STATE>1</STATE>
              <LCM_STATE>0</LCM_STATE>
              <TEMPLATE></TEMPLATE>
            </VM>";
        let vm = parse_vm(xml).unwrap();
        assert_eq!(vm.id, 12);
        assert!(vm.permissions.is_none());
        assert_eq!(vm.template.nic.network, "");
        assert_eq!(vm.lifecycle_state(), LifecycleState::Pending);
    }

    #[test]
    fn test_parse_pool() {
        let xml = r"
            <VM_POOL>
              <VM><ID>1</ID><NAME>a</NAME></VM>
              <VM><ID>2</ID><NAME>b</NAME></VM>
            </VM_POOL>";
        let pool = parse_vm_pool(xml).unwrap();
        assert_eq!(pool.vms.len(), 2);
        assert_eq!(pool.vms[1].name, "b");
    }

    #[test]
    fn test_parse_empty_pool() {
        let pool = parse_vm_pool("<VM_POOL></VM_POOL>").unwrap();
        assert!(pool.vms.is_empty());
    }

    #[test]
    fn test_nonexistent_when_done() {
        let mut vm = parse_vm(RUNNING_VM).unwrap();
        assert!(!vm.nonexistent());
        vm.state = STATE_DONE;
        assert!(vm.nonexistent());
    }
}
