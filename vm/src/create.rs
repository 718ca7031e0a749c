use async_trait::async_trait;
use prism_http::{HttpClient, HttpError, endpoint_url};
use prism_module::{Module, ModuleOutput};
use prism_params::{ParamField, ParamType, ParamTypes};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::request::{
    DEFAULT_MEMORY_SIZE_MIB, DEFAULT_NUM_SOCKETS, DEFAULT_NUM_THREADS_PER_CORE,
    DEFAULT_NUM_VCPUS_PER_SOCKET, DEFAULT_POWER_STATE, VmCreateRequest,
};

pub const VMS_PATH: &str = "/api/nutanix/v3/vms";

pub const SUCCESS_MESSAGE: &str = "Successfully executed vm creation API";
pub const FAILURE_MESSAGE: &str = "Failed while executing vm creation API";
pub const FAILURE_MSG: &str = "Failed to execute task";

/// POST the request to `{nutanix_api_url}/api/nutanix/v3/vms`.
pub async fn create_vm(
    client: &HttpClient,
    request: &VmCreateRequest,
) -> Result<Value, HttpError> {
    let url = endpoint_url(&request.nutanix_api_url, VMS_PATH)?;
    info!(url = %url, vm_name = %request.vm_name, "creating vm");
    client
        .post_json(&url, &request.credentials(), &request.body())
        .await
}

async fn create(request: &VmCreateRequest) -> Result<Value, HttpError> {
    let client = HttpClient::new()?;
    create_vm(&client, request).await
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmCreateResults {
    pub virtual_machine_information: Value,
    pub message: String,
}

impl VmCreateResults {
    fn empty(message: &str) -> Self {
        Self {
            virtual_machine_information: Value::Object(Map::new()),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NutanixVmCreate;

#[async_trait]
impl Module for NutanixVmCreate {
    fn name() -> &'static str {
        "nutanix_vm_create"
    }

    fn param_types() -> ParamTypes {
        ParamTypes::new()
            .field("username", ParamField::new(ParamType::String).required())
            .field("password", ParamField::new(ParamType::String).required())
            .field(
                "nutanix_api_url",
                ParamField::new(ParamType::String).required(),
            )
            .field("vm_name", ParamField::new(ParamType::String).required())
            .field(
                "power_state",
                ParamField::new(ParamType::String).default_value(DEFAULT_POWER_STATE),
            )
            .field(
                "num_sockets",
                ParamField::new(ParamType::Integer).default_value(DEFAULT_NUM_SOCKETS),
            )
            .field(
                "num_vcpus_per_socket",
                ParamField::new(ParamType::Integer).default_value(DEFAULT_NUM_VCPUS_PER_SOCKET),
            )
            .field(
                "num_threads_per_core",
                ParamField::new(ParamType::Integer).default_value(DEFAULT_NUM_THREADS_PER_CORE),
            )
            .field(
                "memory_size_mib",
                ParamField::new(ParamType::Integer).default_value(DEFAULT_MEMORY_SIZE_MIB),
            )
    }

    type Params = VmCreateRequest;
    type Results = VmCreateResults;

    fn check(params: &Self::Params) -> ModuleOutput<Self::Results> {
        debug!(vm_name = %params.vm_name, "check mode, not creating vm");
        ModuleOutput::unchanged(VmCreateResults::empty(""))
    }

    async fn run(params: Self::Params) -> ModuleOutput<Self::Results> {
        debug!(request = ?params, "running");

        match create(&params).await {
            Ok(information) => ModuleOutput::changed(VmCreateResults {
                virtual_machine_information: information,
                message: SUCCESS_MESSAGE.to_string(),
            }),
            // Every failure is reported the same way; the cause only reaches the log.
            Err(error) => {
                debug!(%error, "vm creation failed");
                ModuleOutput::failed(FAILURE_MSG, Some(VmCreateResults::empty(FAILURE_MESSAGE)))
            }
        }
    }
}
