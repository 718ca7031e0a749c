use std::fmt;

use prism_http::BasicAuth;
use serde::{Deserialize, Serialize};

pub const DEFAULT_POWER_STATE: &str = "ON";
pub const DEFAULT_NUM_SOCKETS: i64 = 1;
pub const DEFAULT_NUM_VCPUS_PER_SOCKET: i64 = 1;
pub const DEFAULT_NUM_THREADS_PER_CORE: i64 = 1;
pub const DEFAULT_MEMORY_SIZE_MIB: i64 = 1024;

/// Everything needed to ask Prism for one new VM.
///
/// Numeric fields are not range-checked; the API decides what it accepts.
#[derive(Clone, PartialEq, Deserialize)]
pub struct VmCreateRequest {
    pub nutanix_api_url: String,
    pub username: String,
    pub password: String,
    pub vm_name: String,
    pub power_state: String,
    pub num_sockets: i64,
    pub num_vcpus_per_socket: i64,
    pub num_threads_per_core: i64,
    pub memory_size_mib: i64,
}

impl fmt::Debug for VmCreateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VmCreateRequest")
            .field("nutanix_api_url", &self.nutanix_api_url)
            .field("username", &self.username)
            .field("password", &"********")
            .field("vm_name", &self.vm_name)
            .field("power_state", &self.power_state)
            .field("num_sockets", &self.num_sockets)
            .field("num_vcpus_per_socket", &self.num_vcpus_per_socket)
            .field("num_threads_per_core", &self.num_threads_per_core)
            .field("memory_size_mib", &self.memory_size_mib)
            .finish()
    }
}

impl VmCreateRequest {
    pub fn new(
        nutanix_api_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        vm_name: impl Into<String>,
    ) -> Self {
        Self {
            nutanix_api_url: nutanix_api_url.into(),
            username: username.into(),
            password: password.into(),
            vm_name: vm_name.into(),
            power_state: DEFAULT_POWER_STATE.to_string(),
            num_sockets: DEFAULT_NUM_SOCKETS,
            num_vcpus_per_socket: DEFAULT_NUM_VCPUS_PER_SOCKET,
            num_threads_per_core: DEFAULT_NUM_THREADS_PER_CORE,
            memory_size_mib: DEFAULT_MEMORY_SIZE_MIB,
        }
    }

    pub fn credentials(&self) -> BasicAuth {
        BasicAuth::new(&self.username, &self.password)
    }

    pub fn body(&self) -> VmCreateBody<'_> {
        VmCreateBody {
            spec: VmSpec {
                name: &self.vm_name,
                resources: VmResources {
                    num_sockets: self.num_sockets,
                    num_vcpus_per_socket: self.num_vcpus_per_socket,
                    num_threads_per_core: self.num_threads_per_core,
                    memory_size_mib: self.memory_size_mib,
                    power_state: &self.power_state,
                },
            },
            metadata: VmMetadata { kind: "vm" },
        }
    }
}

/// Body of `POST /api/nutanix/v3/vms`.
#[derive(Debug, Clone, Serialize)]
pub struct VmCreateBody<'a> {
    pub spec: VmSpec<'a>,
    pub metadata: VmMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct VmSpec<'a> {
    pub name: &'a str,
    pub resources: VmResources<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VmResources<'a> {
    pub num_sockets: i64,
    pub num_vcpus_per_socket: i64,
    pub num_threads_per_core: i64,
    pub memory_size_mib: i64,
    pub power_state: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VmMetadata {
    pub kind: &'static str,
}
