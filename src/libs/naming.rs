//! camelCase ⇄ snake_case conversion used for every storage identifier.
//!
//! Round trips hold for ordinary identifiers (letters and digits, no leading
//! underscore, no acronyms). Anything else converts literally: every upper-case
//! letter after the first gets its own `_`, and a leading `_` upper-cases the
//! character that follows it.

/// `createdAt` → `created_at`, `BlankThing` → `blank_thing`.
pub fn camel_to_snake(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for (i, ch) in input.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `created_at` → `createdAt`.
pub fn snake_to_camel(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut capitalize_next = false;
    for ch in input.chars() {
        if ch == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// ASCII letters, digits and `_`, not starting with a digit.
pub fn is_identifier(input: &str) -> bool {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_ascii_words() {
        assert!(is_identifier("created_at"));
        assert!(is_identifier("_hidden"));
        assert!(!is_identifier("first name"));
        assert!(!is_identifier("2nd"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("prix_€"));
    }

    #[test]
    fn camel_to_snake_inserts_underscores() {
        assert_eq!(camel_to_snake("createdAt"), "created_at");
        assert_eq!(camel_to_snake("isDeleted"), "is_deleted");
        assert_eq!(camel_to_snake("id"), "id");
        assert_eq!(camel_to_snake("blank_thing_id"), "blank_thing_id");
    }

    #[test]
    fn leading_capital_is_not_prefixed() {
        assert_eq!(camel_to_snake("BlankThing"), "blank_thing");
        assert_eq!(camel_to_snake("TaskThing"), "task_thing");
    }

    #[test]
    fn snake_to_camel_drops_underscores() {
        assert_eq!(snake_to_camel("updated_at"), "updatedAt");
        assert_eq!(snake_to_camel("is_primary_key"), "isPrimaryKey");
        assert_eq!(snake_to_camel("name"), "name");
    }

    #[test]
    fn ordinary_identifiers_round_trip() {
        for name in ["id", "name", "createdAt", "lastSeenAt2", "ownerId"] {
            assert_eq!(snake_to_camel(&camel_to_snake(name)), name);
        }
    }

    #[test]
    fn acronyms_split_per_letter() {
        assert_eq!(camel_to_snake("userID"), "user_i_d");
    }
}
