use crate::domain::model::DeclaredCategory;

/// Whether a declared category satisfies the receptacle's assigned one.
///
/// Lists come from multi-category codes and are compared exactly; a single
/// string is compared after trimming both sides.
pub fn matches(declared: &DeclaredCategory, assigned: &str) -> bool {
    match declared {
        DeclaredCategory::List(categories) => categories.iter().any(|c| c == assigned),
        DeclaredCategory::Single(category) => category.trim() == assigned.trim(),
        DeclaredCategory::Absent => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> DeclaredCategory {
        DeclaredCategory::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_list_requires_exact_member() {
        assert!(matches(&list(&["plastic", "burnable"]), "burnable"));
        assert!(!matches(&list(&["plastic", " burnable "]), "burnable"));
        assert!(!matches(&list(&["plastic"]), "burnable"));
        assert!(!matches(&list(&[]), "burnable"));
    }

    #[test]
    fn test_single_matches_after_trimming() {
        let declared = DeclaredCategory::Single("  burnable\n".to_string());
        assert!(matches(&declared, "burnable"));
        assert!(matches(&declared, " burnable "));
        assert!(!matches(&declared, "Burnable"));
    }

    #[test]
    fn test_absent_never_matches() {
        assert!(!matches(&DeclaredCategory::Absent, "burnable"));
        assert!(!matches(&DeclaredCategory::Absent, ""));
    }
}
