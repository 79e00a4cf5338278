/// Extracts the payload of an enum variant, and panics for any other variant.
///
/// The short form `cast!(value, Enum::Variant)` handles single-field tuple
/// variants. The long form `cast!(value, Enum::Variant { a, b } => (a, b))`
/// accepts any pattern and returns the given expression of its bindings.
#[macro_export]
macro_rules! cast {
    ($target: expr, $pat: pat => $result: expr) => {{
        match $target {
            $pat => $result,
            _ => panic!("mismatch variant when cast to {}", stringify!($pat)),
        }
    }};
    ($target: expr, $pat: path) => {{
        if let $pat(a) = $target {
            a
        } else {
            panic!("mismatch variant when cast to {}", stringify!($pat));
        }
    }};
}
