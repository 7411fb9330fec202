//! Name type definitions.

use std::str::FromStr;

use crate::define_name;
use crate::NameError;

define_name!(DatabaseName, "database");
define_name!(ServiceName, "service");
define_name!(InstanceName, "instance");

impl DatabaseName {
    /// Case-insensitive comparison against a user-supplied database filter.
    pub fn matches_filter(&self, filter: &str) -> bool {
        self.0.eq_ignore_ascii_case(filter.trim())
    }
}

/// Parses a comma-separated name list as printed by cluster tools.
///
/// Order is preserved. An empty (or all-whitespace) input is an empty list;
/// an empty entry between commas is an error.
pub fn parse_list<T>(s: &str) -> Result<Vec<T>, NameError>
where
    T: FromStr<Err = NameError>,
{
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }

    s.split(',').map(|entry| entry.parse::<T>()).collect()
}

/// Joins names back into the comma-separated form operators expect.
pub fn join_list<T: AsRef<str>>(names: &[T]) -> String {
    names
        .iter()
        .map(|name| name.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_name_roundtrip() {
        let name: InstanceName = "ORCL1".parse().unwrap();
        assert_eq!(name.as_str(), "ORCL1");
        assert_eq!(name.to_string(), "ORCL1");
    }

    #[test]
    fn test_name_is_trimmed() {
        let name: ServiceName = "  oltp \n".parse().unwrap();
        assert_eq!(name.as_str(), "oltp");
    }

    #[test]
    fn test_name_empty() {
        let result: Result<ServiceName, _> = "   ".parse();
        let err = result.unwrap_err();
        assert!(err.is_empty());
        assert_eq!(err.to_string(), "service name cannot be empty");
    }

    #[test]
    fn test_name_interior_whitespace() {
        let result: Result<InstanceName, _> = "ORCL 1".parse();
        assert!(matches!(
            result.unwrap_err(),
            NameError::Whitespace { kind: "instance", .. }
        ));
    }

    #[test]
    fn test_name_rejects_unsplit_list() {
        let result: Result<InstanceName, _> = "ORCL1,ORCL2".parse();
        assert!(result.unwrap_err().is_list());
    }

    #[test]
    fn test_database_filter_is_case_insensitive() {
        let db: DatabaseName = "ORCL".parse().unwrap();
        assert!(db.matches_filter("orcl"));
        assert!(db.matches_filter(" Orcl "));
        assert!(!db.matches_filter("orcl2"));
    }

    #[test]
    fn test_parse_list_preserves_order() {
        let list: Vec<InstanceName> = parse_list("ORCL3,ORCL1, ORCL2").unwrap();
        let raw: Vec<&str> = list.iter().map(InstanceName::as_str).collect();
        assert_eq!(raw, vec!["ORCL3", "ORCL1", "ORCL2"]);
    }

    #[test]
    fn test_parse_list_empty() {
        let list: Vec<InstanceName> = parse_list("").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_parse_list_empty_entry() {
        let result: Result<Vec<InstanceName>, _> = parse_list("ORCL1,,ORCL2");
        assert!(result.unwrap_err().is_empty());
    }

    #[test]
    fn test_name_json_roundtrip() {
        let name: DatabaseName = "ORCL".parse().unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"ORCL\"");
        let parsed: DatabaseName = serde_json::from_str(&json).unwrap();
        assert_eq!(name, parsed);
    }

    #[test]
    fn test_name_json_rejects_invalid() {
        let result: Result<InstanceName, _> = serde_json::from_str("\"a,b\"");
        assert!(result.is_err());
    }
}
