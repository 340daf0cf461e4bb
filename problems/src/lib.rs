//! Defines the set of problems (diagnostics) that the compiler can detect.
//!
//! Each problem has a stable user-facing code, an internal name, and a
//! constant message. The definitions live in `resources/problem-codes.csv`
//! and are converted into the `Problem` enumeration by the build script.

include!(concat!(env!("OUT_DIR"), "/problems.rs"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_when_variable_undeclared_then_returns_stable_code() {
        assert_eq!(Problem::VariableUndeclared.code(), "P3003");
    }

    #[test]
    fn message_when_variable_undeclared_then_returns_message() {
        assert_eq!(
            Problem::VariableUndeclared.message(),
            "Variable not declared in this scope"
        );
    }
}
