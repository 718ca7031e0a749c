//! Create a virtual machine through the Nutanix Prism v3 API.

mod create;
mod request;

pub use crate::create::{
    FAILURE_MESSAGE, FAILURE_MSG, NutanixVmCreate, SUCCESS_MESSAGE, VMS_PATH, VmCreateResults,
    create_vm,
};
pub use crate::request::{
    DEFAULT_MEMORY_SIZE_MIB, DEFAULT_NUM_SOCKETS, DEFAULT_NUM_THREADS_PER_CORE,
    DEFAULT_NUM_VCPUS_PER_SOCKET, DEFAULT_POWER_STATE, VmCreateBody, VmCreateRequest,
    VmMetadata, VmResources, VmSpec,
};
