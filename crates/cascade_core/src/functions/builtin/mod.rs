pub mod clone;
pub mod cols;
pub mod setting;

use std::sync::Arc;

use super::Function;

/// All builtin functions.
pub fn builtin_functions() -> Vec<Arc<dyn Function>> {
    vec![
        Arc::new(clone::FnClone),
        Arc::new(cols::FnCols),
        Arc::new(setting::FnSetting),
    ]
}

/// Find a builtin function by name.
pub fn find_builtin(name: &str) -> Option<Arc<dyn Function>> {
    builtin_functions().into_iter().find(|f| f.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!("clone", find_builtin("clone").unwrap().name());
        assert_eq!("cols", find_builtin("cols").unwrap().name());
        assert_eq!("setting", find_builtin("setting").unwrap().name());
        assert!(find_builtin("nope").is_none());
    }
}
