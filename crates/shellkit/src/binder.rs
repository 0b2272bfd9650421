//! Parameter binding: declared parameter names to positional values.

use crate::error::{Error, Result};
use crate::types::{Arguments, Operation};

/// Look up each parameter name in `arguments`, preserving declaration order.
///
/// Fails on the first name without an argument; nothing is partially bound.
/// `template` is only used to identify the command in the error.
pub fn bind(
    operation: Operation,
    template: &str,
    parameters: &[String],
    arguments: &Arguments,
) -> Result<Vec<String>> {
    parameters
        .iter()
        .map(|name| {
            arguments
                .get(name)
                .cloned()
                .ok_or_else(|| Error::MissingParameter {
                    operation,
                    template: template.to_string(),
                    name: name.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> Arguments {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_bind_in_declaration_order() {
        let arguments = args(&[("file", "t1"), ("output", "hi")]);
        let values = bind(
            Operation::Create,
            "echo %s > %s",
            &names(&["output", "file"]),
            &arguments,
        )
        .unwrap();
        assert_eq!(values, vec!["hi", "t1"]);
    }

    #[test]
    fn test_bind_repeated_name() {
        let arguments = args(&[("file", "t1")]);
        let values = bind(Operation::Read, "", &names(&["file", "file"]), &arguments).unwrap();
        assert_eq!(values, vec!["t1", "t1"]);
    }

    #[test]
    fn test_bind_empty_parameters() {
        let values = bind(Operation::Delete, "rm x", &[], &Arguments::new()).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_bind_empty_value_is_bound() {
        let arguments = args(&[("flag", "")]);
        let values = bind(Operation::Create, "", &names(&["flag"]), &arguments).unwrap();
        assert_eq!(values, vec![""]);
    }

    #[test]
    fn test_bind_reports_first_missing() {
        let arguments = args(&[("output", "hi")]);
        let err = bind(
            Operation::Create,
            "echo %s > %s %s",
            &names(&["output", "file", "mode"]),
            &arguments,
        )
        .unwrap_err();

        match err {
            Error::MissingParameter {
                operation,
                template,
                name,
            } => {
                assert_eq!(operation, Operation::Create);
                assert_eq!(template, "echo %s > %s %s");
                assert_eq!(name, "file");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
