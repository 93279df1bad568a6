//! Instantiation payload builder.
//!
//! Maps a [`VmSpec`] into the provider's structured text template: a NIC
//! block, a DISK block, and optional scalar assignment lines. Presence of a
//! field in the spec decides inclusion, not its value, so an explicit zero
//! is still emitted. Values are interpolated verbatim inside double quotes;
//! [`VmSpec::validate`] rejects embedded quotes before this runs.

use crate::types::VmSpec;

/// Build the instantiation template for a desired-state spec.
///
/// Deterministic: the same spec always yields the same payload, with
/// attributes in a fixed order.
pub fn build_instantiate_template(spec: &VmSpec) -> String {
    let mut nic = vec![format!("NETWORK=\"{}\"", spec.nic.network)];
    if let Some(value) = &spec.nic.network_uname {
        nic.push(format!("NETWORK_UNAME=\"{value}\""));
    }
    if let Some(value) = &spec.nic.search_domain {
        nic.push(format!("SEARCH_DOMAIN=\"{value}\""));
    }
    if let Some(value) = spec.nic.security_group_id {
        nic.push(format!("SECURITY_GROUP=\"{value}\""));
    }
    if let Some(value) = &spec.nic.ip {
        nic.push(format!("IP=\"{value}\""));
    }

    let mut template = format!("NIC = [\n {} ]\n", nic.join(",\n "));

    // SIZE is always present; the provider computes the real size when the
    // spec leaves it out.
    let mut disk = vec![format!("SIZE=\"{}\"", spec.disk.size.unwrap_or(0))];
    if let Some(value) = &spec.disk.image {
        disk.push(format!("IMAGE=\"{value}\""));
    }
    if let Some(value) = &spec.disk.image_uname {
        disk.push(format!("IMAGE_UNAME=\"{value}\""));
    }
    if let Some(value) = &spec.disk.driver {
        disk.push(format!("IMAGE_DRIVER=\"{value}\""));
    }

    template.push_str(&format!("DISK = [\n {} ]\n", disk.join(",\n ")));

    if let Some(value) = spec.cpu {
        template.push_str(&format!("CPU = \"{value}\"\n"));
    }
    if let Some(value) = spec.vcpu {
        template.push_str(&format!("VCPU = \"{value}\"\n"));
    }
    if let Some(value) = spec.memory {
        template.push_str(&format!("MEMORY = \"{value}\"\n"));
    }

    template
}
