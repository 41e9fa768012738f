//! Model naming.
//!
//! Discovered tables are exposed under a capitalized, singular model name:
//! `account` becomes `Account`, `user_accounts` becomes `UserAccount`.

use heck::ToUpperCamelCase;

/// Returns the model name for a table.
pub fn model_name(table: &str) -> String {
    let camel = table.to_upper_camel_case();
    // Only the last word is pluralized in snake_case table names.
    let split = camel
        .char_indices()
        .filter(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0);
    let (head, last) = camel.split_at(split);
    format!("{}{}", head, singularize(last))
}

fn singularize(word: &str) -> String {
    if !word.is_ascii() {
        return word.to_string();
    }
    let lower = word.to_ascii_lowercase();
    if lower.len() > 3 && lower.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zzes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.len() > 1
        && lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word_tables() {
        assert_eq!(model_name("account"), "Account");
        assert_eq!(model_name("ACCOUNT"), "Account");
        assert_eq!(model_name("accounts"), "Account");
    }

    #[test]
    fn test_compound_tables() {
        assert_eq!(model_name("user_accounts"), "UserAccount");
        assert_eq!(model_name("account-history"), "AccountHistory");
        assert_eq!(model_name("AccountEntries"), "AccountEntry");
    }

    #[test]
    fn test_plural_rules() {
        assert_eq!(model_name("categories"), "Category");
        assert_eq!(model_name("addresses"), "Address");
        assert_eq!(model_name("boxes"), "Box");
        assert_eq!(model_name("status"), "Status");
        assert_eq!(model_name("analysis"), "Analysis");
        assert_eq!(model_name("class"), "Class");
    }
}
