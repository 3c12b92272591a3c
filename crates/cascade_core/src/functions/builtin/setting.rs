use cascade_error::{FunctionError, Result};

use crate::engine::scope::Scope;
use crate::functions::{Function, check_arity};
use crate::value::Value;

/// `setting(name)`: current value of a session setting as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FnSetting;

impl Function for FnSetting {
    fn name(&self) -> &'static str {
        "setting"
    }

    fn apply(&self, scope: &Scope, args: &[Value]) -> Result<Value> {
        check_arity(self.name(), args, 1)?;
        let name = args[0].as_text().ok_or_else(|| {
            FunctionError::type_error(
                0,
                format!(
                    "'setting' expects a setting name, got {}",
                    args[0].value_type()
                ),
            )
        })?;

        let value = scope.config().get_as_string(name)?;
        Ok(Value::Text(value))
    }
}
