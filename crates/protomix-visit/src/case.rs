//! Name casing for generated identifiers.

/// `foo_bar` → `FooBar`. Segments already cased keep their inner capitals,
/// so `parsed_JSON` → `ParsedJSON`.
pub fn snake_to_camel(name: &str) -> String {
    name.split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn maybe_snake_to_camel(name: &str, enabled: bool) -> String {
    if enabled {
        snake_to_camel(name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_cases_snake_names() {
        assert_eq!(snake_to_camel("foo_bar"), "FooBar");
        assert_eq!(snake_to_camel("zaz_inner"), "ZazInner");
        assert_eq!(snake_to_camel("__edge__"), "Edge");
    }

    #[test]
    fn preserves_existing_capitals() {
        assert_eq!(snake_to_camel("FooBar"), "FooBar");
        assert_eq!(snake_to_camel("parsed_JSON"), "ParsedJSON");
    }

    #[test]
    fn toggle_passes_names_through_when_disabled() {
        assert_eq!(maybe_snake_to_camel("foo_bar", false), "foo_bar");
        assert_eq!(maybe_snake_to_camel("foo_bar", true), "FooBar");
    }
}
