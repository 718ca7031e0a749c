mod args;
mod output;

pub use crate::args::{ModuleArgs, ModuleArgsError};
pub use crate::output::{ModuleOutput, ModuleOutputError};

use async_trait::async_trait;
use prism_params::{ParamTypes, validate};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

/// A module must describe:
/// - its name
/// - the schema for its parameters
/// - what it reports in check mode, without touching anything
/// - how to run for real
#[async_trait]
pub trait Module {
    fn name() -> &'static str;
    fn param_types() -> ParamTypes;

    type Params: DeserializeOwned + Send;
    type Results: Serialize + Send;

    fn check(params: &Self::Params) -> ModuleOutput<Self::Results>;

    async fn run(params: Self::Params) -> ModuleOutput<Self::Results>;
}

/// Validate arguments against the module's schema, then check or run it.
pub async fn run_module<M: Module>(args: ModuleArgs) -> ModuleOutput<M::Results> {
    let ModuleArgs { params, check_mode } = args;
    info!(module = M::name(), check_mode, "starting");

    let params = match validate(&M::param_types(), params) {
        Ok(params) => params,
        Err(errors) => {
            warn!(module = M::name(), errors = ?errors.errors, "invalid parameters");
            return ModuleOutput::failed(errors.to_string(), None);
        }
    };

    let params: M::Params = match params.into_type() {
        Ok(params) => params,
        Err(error) => {
            warn!(module = M::name(), %error, "failed to read parameters");
            return ModuleOutput::failed(format!("invalid parameters: {error}"), None);
        }
    };

    if check_mode {
        debug!(module = M::name(), "check mode, skipping run");
        return M::check(&params);
    }

    let output = M::run(params).await;
    info!(
        module = M::name(),
        changed = output.changed,
        failed = output.failed,
        "completed"
    );
    output
}
