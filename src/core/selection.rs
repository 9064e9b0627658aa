use crate::utils::error::{PointsError, Result};

/// Picks a receptacle from a 1-based menu choice as typed by the operator.
pub fn select_receptacle(names: &[String], input: &str) -> Result<String> {
    if names.is_empty() {
        return Err(PointsError::NoReceptacles);
    }

    let invalid = |reason: String| PointsError::InvalidSelection {
        input: input.trim().to_string(),
        reason,
    };

    let choice: usize = input
        .trim()
        .parse()
        .map_err(|_| invalid("not a number".to_string()))?;

    if choice < 1 || choice > names.len() {
        return Err(invalid(format!("choose between 1 and {}", names.len())));
    }
    Ok(names[choice - 1].clone())
}

/// Accepts a receptacle named in configuration if the backend knows it.
pub fn resolve_preselected(names: &[String], name: &str) -> Result<String> {
    if names.is_empty() {
        return Err(PointsError::NoReceptacles);
    }

    names
        .iter()
        .find(|candidate| candidate.as_str() == name)
        .cloned()
        .ok_or_else(|| PointsError::ReceptacleNotFound {
            name: name.to_string(),
        })
}

/// The numbered menu shown before [`select_receptacle`].
pub fn render_menu(names: &[String]) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {}", i + 1, name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["north".to_string(), "south".to_string(), "east".to_string()]
    }

    #[test]
    fn test_select_by_number() {
        assert_eq!(select_receptacle(&names(), "1").unwrap(), "north");
        assert_eq!(select_receptacle(&names(), " 3\n").unwrap(), "east");
    }

    #[test]
    fn test_select_out_of_range_or_garbage() {
        for input in ["0", "4", "-1", "two", ""] {
            assert!(
                matches!(
                    select_receptacle(&names(), input),
                    Err(PointsError::InvalidSelection { .. })
                ),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_empty_list_has_nothing_to_select() {
        assert!(matches!(
            select_receptacle(&[], "1"),
            Err(PointsError::NoReceptacles)
        ));
        assert!(matches!(
            resolve_preselected(&[], "north"),
            Err(PointsError::NoReceptacles)
        ));
    }

    #[test]
    fn test_preselected_must_exist() {
        assert_eq!(resolve_preselected(&names(), "south").unwrap(), "south");
        assert!(matches!(
            resolve_preselected(&names(), "west"),
            Err(PointsError::ReceptacleNotFound { .. })
        ));
    }

    #[test]
    fn test_render_menu() {
        assert_eq!(render_menu(&names()), "1. north\n2. south\n3. east");
    }
}
