//! Resolution of type names written in source into type symbols.
//!
//! The elementary types are defined by the language; everything else is
//! a derived type whose declaration lives elsewhere (for our purposes,
//! function block types).
use oxplc_dsl::common::TypeName;
use oxplc_dsl::core::Id;
use phf::{phf_set, Set};

static ELEMENTARY_TYPES_LOWER_CASE: Set<&'static str> = phf_set! {
    // signed_integer_type_name
    "sint",
    "int",
    "dint",
    "lint",
    // unsigned_integer_type_name
    "usint",
    "uint",
    "udint",
    "ulint",
    // real_type_name
    "real",
    "lreal",
    // date_type_name
    "date",
    "time_of_day",
    "tod",
    "date_and_time",
    "dt",
    // bit_string_type_name
    "bool",
    "byte",
    "word",
    "dword",
    "lword",
    // remaining elementary_type_name
    "string",
    "wstring",
    "time",
};

pub fn is_elementary_type_name(name: &Id) -> bool {
    ELEMENTARY_TYPES_LOWER_CASE.contains(name.lower_case().as_str())
}

/// Resolves a type name written in source to a type symbol: one of the
/// elementary types, or a derived type.
pub fn resolve_type_name(name: &Id) -> TypeName {
    match name.lower_case().as_str() {
        "bool" => TypeName::Bool,
        "byte" => TypeName::Byte,
        "word" => TypeName::Word,
        "dword" => TypeName::Dword,
        "lword" => TypeName::Lword,
        "sint" => TypeName::Sint,
        "int" => TypeName::Int,
        "dint" => TypeName::Dint,
        "lint" => TypeName::Lint,
        "usint" => TypeName::Usint,
        "uint" => TypeName::Uint,
        "udint" => TypeName::Udint,
        "ulint" => TypeName::Ulint,
        "real" => TypeName::Real,
        "lreal" => TypeName::Lreal,
        "time" => TypeName::Time,
        "date" => TypeName::Date,
        "time_of_day" | "tod" => TypeName::TimeOfDay,
        "date_and_time" | "dt" => TypeName::DateAndTime,
        "string" => TypeName::String,
        "wstring" => TypeName::WString,
        _ => TypeName::Derived(name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_when_elementary_then_elementary_symbol() {
        assert_eq!(resolve_type_name(&Id::from("UINT")), TypeName::Uint);
        assert_eq!(resolve_type_name(&Id::from("tod")), TypeName::TimeOfDay);
        assert!(is_elementary_type_name(&Id::from("LWORD")));
    }

    #[test]
    fn resolve_when_not_elementary_then_derived() {
        let name = Id::from("MyCounter");
        assert!(!is_elementary_type_name(&name));
        assert_eq!(resolve_type_name(&name), TypeName::Derived(name));
    }
}
