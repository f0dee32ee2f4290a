//! Pre-flight input checks. Nothing in here touches the network.
//!
//! The query check is a conservative denylist, not a SQL parser: it blocks a
//! mutating keyword wherever it appears as a standalone word and nothing else.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

/// Keywords that mutate data or schema. Checked in this order.
pub const FORBIDDEN_OPERATIONS: [&str; 9] = [
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE", "GRANT", "REVOKE",
];

static FORBIDDEN_RE: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FORBIDDEN_OPERATIONS
        .iter()
        .filter_map(|op| {
            // `\b` treats `_` as a word character, so `updated_at` never matches UPDATE.
            Regex::new(&format!(r"\b{op}\b")).ok().map(|re| (*op, re))
        })
        .collect()
});

static ADDRESS_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").ok());

/// Reject queries containing a denylisted operation as a whole word.
pub fn validate_query(query: &str) -> Result<(), ValidationError> {
    let normalized = query.to_uppercase();
    for (op, re) in FORBIDDEN_RE.iter() {
        if re.is_match(&normalized) {
            return Err(ValidationError::ForbiddenOperation(op));
        }
    }
    Ok(())
}

/// Require exactly `0x` followed by 40 hex characters.
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    let valid = ADDRESS_RE
        .as_ref()
        .map(|re| re.is_match(address))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidAddress(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_allowed() {
        assert!(validate_query("SELECT * FROM documents LIMIT 5").is_ok());
        assert!(validate_query("select title, page_count from documents").is_ok());
    }

    #[test]
    fn test_every_forbidden_keyword_is_blocked() {
        for op in FORBIDDEN_OPERATIONS {
            let query = format!("{} something", op.to_lowercase());
            assert_eq!(
                validate_query(&query),
                Err(ValidationError::ForbiddenOperation(op)),
                "{op} should be rejected"
            );
        }
    }

    #[test]
    fn test_drop_names_the_operation() {
        let err = validate_query("DROP TABLE documents").unwrap_err();
        assert_eq!(err, ValidationError::ForbiddenOperation("DROP"));
        assert!(err.to_string().contains("DROP"));
    }

    #[test]
    fn test_keyword_anywhere_in_query_is_blocked() {
        assert!(validate_query("SELECT 1; DeLeTe FROM documents").is_err());
        assert!(validate_query("SELECT * FROM t WHERE x = 1\nUPDATE t SET x = 2").is_err());
        assert!(validate_query("SELECT * FROM (INSERT)").is_err());
    }

    #[test]
    fn test_substrings_of_identifiers_are_allowed() {
        assert!(validate_query("SELECT updated_at, update_count FROM documents").is_ok());
        assert!(validate_query("SELECT created_by FROM pages").is_ok());
        assert!(validate_query("SELECT * FROM dropbox_files").is_ok());
        assert!(validate_query("SELECT deleted FROM documents").is_ok());
        assert!(validate_query("SELECT insertion_order FROM pages").is_ok());
    }

    #[test]
    fn test_valid_address() {
        assert!(validate_address("0x1111111111111111111111111111111111111111").is_ok());
        assert!(validate_address("0xAbCdEf0123456789abcdef0123456789ABCDEF01").is_ok());
    }

    #[test]
    fn test_invalid_addresses() {
        for bad in [
            "",
            "0x",
            "1111111111111111111111111111111111111111",
            "0x111111111111111111111111111111111111111",
            "0x11111111111111111111111111111111111111111",
            "0xZZ11111111111111111111111111111111111111",
            " 0x1111111111111111111111111111111111111111",
        ] {
            assert!(
                matches!(validate_address(bad), Err(ValidationError::InvalidAddress(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
