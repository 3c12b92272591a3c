use std::collections::HashMap;
use std::sync::LazyLock;

use cascade_error::{FunctionError, Result};

/// Default number of rows per partition when loading data.
pub const DEFAULT_CHUNK_ROWS: usize = 4096;

/// Configuration for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Number of threads used for partition execution.
    pub threads: usize,
    /// Rows per partition for ingested data and for frames that don't read
    /// any stored columns.
    pub chunk_rows: usize,
    /// Fail materialization if a frame doesn't consume exactly the chunks it
    /// declared as inputs. Always checked in debug builds.
    pub verify_inputs: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            threads: num_cpus::get(),
            chunk_rows: DEFAULT_CHUNK_ROWS,
            verify_inputs: true,
        }
    }
}

impl SessionConfig {
    /// Current value of a setting, formatted as text.
    ///
    /// `name` is expected to be the first argument of the function call
    /// asking for the setting.
    pub fn get_as_string(&self, name: &str) -> Result<String> {
        let func = GET_FUNCTIONS
            .get(name)
            .ok_or_else(|| FunctionError::value_error(0, format!("Missing setting for '{name}'")))?;

        Ok((func.get)(self))
    }
}

struct SettingFunctions {
    get: fn(conf: &SessionConfig) -> String,
}

impl SettingFunctions {
    const fn new<S: SessionSetting>() -> Self {
        SettingFunctions {
            get: S::get_as_string as _,
        }
    }
}

fn insert_setting<S: SessionSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<Threads>(&mut map);
    insert_setting::<ChunkRows>(&mut map);
    insert_setting::<VerifyInputs>(&mut map);

    map
});

pub trait SessionSetting: Sync + Send + 'static {
    const NAME: &'static str;

    fn get_as_string(conf: &SessionConfig) -> String;
}

pub struct Threads;

impl SessionSetting for Threads {
    const NAME: &'static str = "threads";

    fn get_as_string(conf: &SessionConfig) -> String {
        conf.threads.to_string()
    }
}

pub struct ChunkRows;

impl SessionSetting for ChunkRows {
    const NAME: &'static str = "chunk_rows";

    fn get_as_string(conf: &SessionConfig) -> String {
        conf.chunk_rows.to_string()
    }
}

pub struct VerifyInputs;

impl SessionSetting for VerifyInputs {
    const NAME: &'static str = "verify_inputs";

    fn get_as_string(conf: &SessionConfig) -> String {
        conf.verify_inputs.to_string()
    }
}
