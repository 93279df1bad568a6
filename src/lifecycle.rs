//! Lifecycle controller: drives a VM from declared to observed state.
//!
//! The five operations here — create, read, exists, update, delete — are
//! the contract this crate exposes to the surrounding orchestration layer.
//! Each takes a mutable [`VmHandle`] and runs synchronously; the only
//! suspension point is the state poll during create and delete. Handles
//! are independent, so separate VMs can be driven concurrently as long as
//! each uses its own handle.

use crate::backend::{Arg, Remote};
use crate::error::{Error, Result};
use crate::model::{self, LifecycleState, VmInfo};
use crate::perm::Permissions;
use crate::poll;
use crate::template;
use crate::types::{LifecycleConfig, VmSpec};

/// Observed attributes of a VM.
///
/// Fully overwritten from the authoritative remote record on every
/// successful read; never partially merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VmObserved {
    /// Final instance name assigned by the remote side
    pub instance: String,
    /// Owning user id
    pub uid: i64,
    /// Owning group id
    pub gid: i64,
    /// Owning user name
    pub uname: String,
    /// Owning group name
    pub gname: String,
    /// Primary lifecycle state code
    pub state: i64,
    /// Secondary lifecycle state code
    pub lcm_state: i64,
    /// CPU count
    pub cpu: i64,
    /// Virtual CPU count
    pub vcpu: i64,
    /// Memory in MB
    pub memory: i64,
    /// Disk image name
    pub image: String,
    /// Disk size in MB
    pub size: i64,
    /// Disk image driver
    pub image_driver: String,
    /// Disk image owner
    pub image_uname: String,
    /// Network name
    pub network: String,
    /// Network owner
    pub network_uname: String,
    /// Search domain
    pub network_search_domain: String,
    /// Security group id
    pub security_group_id: i64,
    /// Network-assigned address
    pub ip: String,
    /// Permission triple, re-derived from the remote bits
    pub permissions: String,
}

/// Mutable desired/observed handle for one VM.
#[derive(Debug, Clone, Default)]
pub struct VmHandle {
    /// Remote-assigned identity. `None` means the VM is not known to
    /// exist; a read that cannot locate the VM clears this, which is how
    /// out-of-band deletion is detected.
    pub id: Option<i64>,
    /// Declared desired state
    pub spec: VmSpec,
    /// Last observed state, if any
    pub observed: Option<VmObserved>,
}

impl VmHandle {
    /// Create a handle for a VM that does not exist yet.
    pub fn new(spec: VmSpec) -> Self {
        Self {
            id: None,
            spec,
            observed: None,
        }
    }

    /// Whether this handle describes a VM that does not exist: no
    /// recorded identity, or a last observed state of done. Read,
    /// [`Client::exists`] and the delete pre-check all share this
    /// predicate.
    pub fn nonexistent(&self) -> bool {
        if self.id.is_none() {
            return true;
        }
        self.observed.as_ref().is_some_and(|observed| {
            LifecycleState::from_codes(observed.state, observed.lcm_state) == LifecycleState::Done
        })
    }

    /// The name used to locate this VM in a pool listing: the declared
    /// name, falling back to the last observed instance name.
    fn match_name(&self) -> &str {
        match &self.spec.name {
            Some(name) => name,
            None => self
                .observed
                .as_ref()
                .map_or("", |observed| observed.instance.as_str()),
        }
    }
}

/// High-level client for VM lifecycle operations.
///
/// Wraps a [`Remote`] session and drives single VMs through create, read,
/// update and delete, keeping the local handle convergent with the remote
/// record.
pub struct Client {
    backend: Box<dyn Remote>,
    config: LifecycleConfig,
}

impl Client {
    /// Create a client with the default configuration.
    pub fn new(backend: Box<dyn Remote>) -> Self {
        Self::with_config(backend, LifecycleConfig::default())
    }

    /// Create a client with custom configuration.
    pub fn with_config(backend: Box<dyn Remote>, config: LifecycleConfig) -> Self {
        Self { backend, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Create the VM described by the handle's spec.
    ///
    /// Instantiates the template, records the returned identity
    /// immediately, waits for the running state, applies the declared (or
    /// default) permissions, and finishes with a full read so every
    /// computed attribute comes from the authoritative record.
    ///
    /// A failure at any step surfaces as-is and nothing is rolled back: an
    /// instantiated VM keeps its recorded identity so a later
    /// reconciliation pass can pick it up.
    pub fn create(&self, vm: &mut VmHandle) -> Result<()> {
        vm.spec.validate()?;

        let payload = template::build_instantiate_template(&vm.spec);
        let response = self.backend.call(
            "one.template.instantiate",
            &[
                Arg::Int(vm.spec.template_id),
                Arg::Str(vm.spec.name.clone().unwrap_or_default()),
                Arg::Bool(false),
                Arg::Str(payload),
                Arg::Bool(false),
            ],
        )?;
        let id = parse_identity("one.template.instantiate", &response)?;

        // Recorded before the wait: a crash mid-provisioning must leave a
        // recoverable reference.
        vm.id = Some(id);
        log::debug!("instantiated VM {id}, waiting for it to run");

        self.wait_for_state(vm, LifecycleState::Running)?;

        if vm.spec.permissions.is_none() {
            vm.spec.permissions = Some(self.config.default_permissions.clone());
        }
        if let Some(triple) = &vm.spec.permissions {
            self.chmod(id, triple)?;
        }

        self.read(vm)
    }

    /// Refresh the handle from the remote record.
    ///
    /// Looks the VM up by identity when one is recorded, falling back to a
    /// full pool listing filtered by exact name — identity may not be
    /// known yet, or the direct lookup may transiently fail. When neither
    /// path locates the VM this clears the recorded identity and returns
    /// `Ok`: "not found" is a documented non-error outcome, it is the
    /// signal for out-of-band deletion. A hit overwrites every observed
    /// attribute from the remote record.
    pub fn read(&self, vm: &mut VmHandle) -> Result<()> {
        let mut entity: Option<VmInfo> = None;

        if let Some(id) = vm.id {
            match self.backend.call("one.vm.info", &[Arg::Int(id)]) {
                Ok(response) => entity = Some(model::parse_vm(&response)?),
                Err(err) => log::debug!("could not find VM by id {id}: {err}"),
            }
        }

        let entity = match entity {
            Some(entity) => entity,
            None => {
                let name = vm.match_name().to_string();
                let response = self.backend.call(
                    "one.vmpool.info",
                    &[Arg::Int(-3), Arg::Int(-1), Arg::Int(-1)],
                )?;
                let pool = model::parse_vm_pool(&response)?;
                match pool.vms.into_iter().find(|entity| entity.name == name) {
                    Some(entity) => entity,
                    None => {
                        log::debug!("could not find VM named {name:?}, clearing local identity");
                        vm.id = None;
                        vm.observed = None;
                        return Ok(());
                    }
                }
            }
        };

        vm.id = Some(entity.id);
        vm.observed = Some(observe(&entity));
        Ok(())
    }

    /// Whether the VM exists.
    ///
    /// A VM whose record reports the done state is nonexistent even while
    /// the record itself can still be read.
    pub fn exists(&self, vm: &mut VmHandle) -> Result<bool> {
        self.read(vm)?;
        Ok(!vm.nonexistent())
    }

    /// Apply in-place changes to the mutable attributes: permissions, disk
    /// size (disk index 0), and name.
    ///
    /// Each changed field is one remote call; the first failure aborts the
    /// remaining changes and already-applied ones are not rolled back.
    /// The resize and rename calls complete asynchronously on the remote
    /// side and are not polled here — a follow-up read reconciles the
    /// observed attributes.
    pub fn update(&self, vm: &mut VmHandle) -> Result<()> {
        vm.spec.validate()?;
        let id = vm
            .id
            .ok_or_else(|| Error::Other("cannot update a VM with no recorded identity".into()))?;
        let observed = vm.observed.clone().unwrap_or_default();

        if let Some(triple) = &vm.spec.permissions {
            if *triple != observed.permissions {
                self.chmod(id, triple)?;
                log::info!("updated permissions of VM {id} to {triple}");
            }
        }

        if let Some(size) = vm.spec.disk.size {
            if size != observed.size {
                self.backend.call(
                    "one.vm.diskresize",
                    &[Arg::Int(id), Arg::Int(0), Arg::Str(size.to_string())],
                )?;
                log::info!("resized disk 0 of VM {id} to {size} MB");
            }
        }

        if let Some(name) = &vm.spec.name {
            if *name != observed.instance {
                self.backend
                    .call("one.vm.rename", &[Arg::Int(id), Arg::Str(name.clone())])?;
                log::info!("renamed VM {id} to {name:?}");
            }
        }

        Ok(())
    }

    /// Terminate the VM and wait for the done state.
    ///
    /// Reads first; a VM that is already absent makes delete a successful
    /// no-op with no terminate call issued. Failing to reach done within
    /// the poll bound is fatal.
    pub fn delete(&self, vm: &mut VmHandle) -> Result<()> {
        self.read(vm)?;
        if vm.nonexistent() {
            log::debug!("VM already absent, nothing to terminate");
            return Ok(());
        }
        let Some(id) = vm.id else {
            return Ok(());
        };

        self.backend.call(
            "one.vm.action",
            &[Arg::Str("terminate-hard".to_string()), Arg::Int(id)],
        )?;
        self.wait_for_state(vm, LifecycleState::Done)?;
        log::info!("terminated VM {id}");
        Ok(())
    }

    fn wait_for_state(&self, vm: &VmHandle, target: LifecycleState) -> Result<VmInfo> {
        let id = vm
            .id
            .ok_or_else(|| Error::Other("cannot poll a VM with no recorded identity".into()))?;

        poll::wait_for(
            || {
                log::debug!("refreshing state of VM {id}");
                let response = self.backend.call("one.vm.info", &[Arg::Int(id)])?;
                let entity = model::parse_vm(&response)?;
                let state = entity.lifecycle_state();
                Ok((Some(entity), state))
            },
            target,
            &self.config.poll,
        )
    }

    fn chmod(&self, id: i64, triple: &str) -> Result<()> {
        let permissions = Permissions::from_octal_str(triple)?;
        let mut args = vec![Arg::Int(id)];
        args.extend(permissions.chmod_args().iter().copied().map(Arg::Int));
        self.backend.call("one.vm.chmod", &args)?;
        Ok(())
    }
}

fn parse_identity(method: &str, response: &str) -> Result<i64> {
    response.trim().parse().map_err(|_| {
        Error::remote(
            method,
            format!("expected a numeric identity in response, got {response:?}"),
        )
    })
}

fn observe(entity: &VmInfo) -> VmObserved {
    VmObserved {
        instance: entity.name.clone(),
        uid: entity.uid,
        gid: entity.gid,
        uname: entity.uname.clone(),
        gname: entity.gname.clone(),
        state: entity.state,
        lcm_state: entity.lcm_state,
        cpu: entity.template.cpu,
        vcpu: entity.template.vcpu,
        memory: entity.template.memory,
        image: entity.template.disk.image.clone(),
        size: entity.template.disk.size,
        image_driver: entity.template.disk.driver.clone(),
        image_uname: entity.template.disk.image_uname.clone(),
        network: entity.template.nic.network.clone(),
        network_uname: entity.template.nic.network_uname.clone(),
        network_search_domain: entity.template.nic.search_domain.clone(),
        security_group_id: entity.template.nic.security_group_id,
        ip: entity.template.context.ip.clone(),
        permissions: entity
            .permissions
            .map(|p| p.to_octal_string())
            .unwrap_or_default(),
    }
}
