//! Integration tests for error types

#[cfg(test)]
mod tests {
    use versolve_errors::*;

    fn sample_conflict() -> PackageConflict {
        PackageConflict {
            package: "indirect".into(),
            selected: Some("1.0.0".into()),
            violated: vec!["2.0.0".into()],
            constraints: vec![
                ConstraintOrigin {
                    constraint: "1.0.0".into(),
                    path: vec!["bad-1 1.0.0".into(), "mytoplevel 1.0.0".into()],
                },
                ConstraintOrigin {
                    constraint: "2.0.0".into(),
                    path: vec!["bad-2 1.0.0".into(), "mytoplevel 1.0.0".into()],
                },
            ],
            omitted: 0,
        }
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = CatalogError::DuplicateEntry {
            package: "foo".into(),
            version: "1.0.0".into(),
        }
        .into();
        assert!(matches!(err, Error::Catalog(_)));
        assert_eq!(err.to_string(), "Already have an entry for foo 1.0.0");
    }

    #[test]
    fn test_error_clone() {
        let err = VersionError::InvalidVersion {
            input: "1.2".into(),
            reason: "Version string must look like semver (eg '1.2.3'), not '1.2'.".into(),
        };
        let cloned = err.clone();
        assert_eq!(err, cloned);
        assert_eq!(cloned.input(), "1.2");
    }

    #[test]
    fn test_unknown_package_messages() {
        let root = SolverError::UnknownRootPackage {
            package: "foo".into(),
        };
        assert_eq!(
            root.to_string(),
            "unknown package in top-level dependencies: foo"
        );

        let nested = SolverError::UnknownPackage {
            package: "bar".into(),
            required_by: "foo 1.0.0".into(),
        };
        assert!(nested.to_string().starts_with("unknown package: bar"));
    }

    #[test]
    fn test_infeasible_classification() {
        let unsat: Error = SolverError::Unsatisfiable {
            report: ConflictReport::default(),
        }
        .into();
        assert!(unsat.is_infeasible());

        let missing: Error = SolverError::MissingPreviousVersion {
            package: "foo".into(),
            version: "1.0.0".into(),
        }
        .into();
        assert!(!missing.is_infeasible());
        assert!(!Error::internal("boom").is_infeasible());
    }

    #[test]
    fn test_conflict_rendering() {
        let report = ConflictReport {
            conflicts: vec![sample_conflict()],
        };
        let text = report.to_string();
        assert!(text.starts_with(
            "Conflict: Constraint indirect@2.0.0 is not satisfied by indirect 1.0.0."
        ));
        assert!(text.contains("Constraints on package \"indirect\":"));
        assert!(text
            .lines()
            .any(|l| l == "* indirect@1.0.0 <- bad-1 1.0.0 <- mytoplevel 1.0.0"));
        assert!(text
            .lines()
            .any(|l| l == "* indirect@2.0.0 <- bad-2 1.0.0 <- mytoplevel 1.0.0"));
        assert_eq!(report.packages().collect::<Vec<_>>(), vec!["indirect"]);
    }

    #[test]
    fn test_top_level_and_no_version_rendering() {
        let mut conflict = sample_conflict();
        conflict.constraints[0].path.clear();
        conflict.omitted = 2;
        let text = conflict.to_string();
        assert!(text.contains("* indirect@1.0.0 <- top level"));
        assert!(text.ends_with("...and 2 more"));

        let none = PackageConflict {
            package: "foo".into(),
            selected: None,
            violated: Vec::new(),
            constraints: vec![ConstraintOrigin {
                constraint: "1.0.0".into(),
                path: Vec::new(),
            }],
            omitted: 0,
        };
        assert_eq!(
            none.to_string(),
            "No version of foo satisfies all constraints: @1.0.0"
        );
    }

    #[test]
    fn test_user_codes() {
        let err: Error = ConfigError::NotFound {
            path: "/nope".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("config.not_found"));
        assert!(err.user_hint().is_some());

        let unavailable: Error = CatalogError::Unavailable {
            message: "offline".into(),
        }
        .into();
        assert!(unavailable.is_retryable());
    }
}
