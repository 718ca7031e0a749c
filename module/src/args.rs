use std::str::FromStr;

use prism_params::{ParamType, ParamValues, ParamValuesFromJsonError, coerce};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

const ANSIBLE_MODULE_ARGS: &str = "ANSIBLE_MODULE_ARGS";
const INTERNAL_PREFIX: &str = "_ansible_";
const CHECK_MODE: &str = "_ansible_check_mode";

#[derive(Error, Debug)]
pub enum ModuleArgsError {
    #[error("failed to parse module arguments as JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("module arguments must be a JSON object")]
    NotAnObject(#[source] ParamValuesFromJsonError),

    #[error("internal argument {key} must be a boolean")]
    InvalidInternal { key: String },
}

/// Arguments handed to a module: its parameters plus the caller's flags.
#[derive(Debug, Clone, Default)]
pub struct ModuleArgs {
    pub params: ParamValues,
    pub check_mode: bool,
}

impl FromStr for ModuleArgs {
    type Err = ModuleArgsError;

    fn from_str(json: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(json).map_err(ModuleArgsError::Json)?;
        Self::from_json(value)
    }
}

impl ModuleArgs {
    /// Accepts a flat object of parameters, or one wrapped in
    /// `ANSIBLE_MODULE_ARGS`. Keys prefixed `_ansible_` are stripped;
    /// `_ansible_check_mode` sets check mode.
    pub fn from_json(value: Value) -> Result<Self, ModuleArgsError> {
        let value = match value {
            Value::Object(mut object)
                if object.len() == 1 && object.contains_key(ANSIBLE_MODULE_ARGS) =>
            {
                object.remove(ANSIBLE_MODULE_ARGS).unwrap_or_default()
            }
            other => other,
        };

        let mut params = ParamValues::from_json(value).map_err(ModuleArgsError::NotAnObject)?;

        let mut check_mode = false;
        for (key, value) in params.extract_if(|key| key.starts_with(INTERNAL_PREFIX)) {
            if key == CHECK_MODE {
                check_mode = coerce(ParamType::Boolean, &value)
                    .ok()
                    .and_then(|value| value.as_bool())
                    .ok_or(ModuleArgsError::InvalidInternal { key })?;
            } else {
                trace!(key = %key, "ignoring internal argument");
            }
        }

        Ok(ModuleArgs { params, check_mode })
    }

    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode |= check_mode;
        self
    }
}
