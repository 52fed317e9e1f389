//! Integration tests for types

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::cmp::Ordering;
    use std::collections::BTreeSet;
    use versolve_types::*;

    fn version_strategy() -> impl Strategy<Value = String> {
        let part = prop_oneof![
            (0u64..20).prop_map(|n| n.to_string()),
            "[a-z][a-z0-9-]{0,4}",
        ];
        (
            0u64..4,
            0u64..4,
            0u64..4,
            proptest::collection::vec(part, 0..3),
            0u64..3,
            proptest::option::of("[a-z0-9]{1,4}"),
        )
            .prop_map(|(major, minor, patch, pre, wrap, build)| {
                let mut s = format!("{major}.{minor}.{patch}");
                if !pre.is_empty() {
                    s.push('-');
                    s.push_str(&pre.join("."));
                }
                if wrap > 0 {
                    s.push_str(&format!("_{wrap}"));
                }
                if let Some(build) = build {
                    s.push('+');
                    s.push_str(&build);
                }
                s
            })
    }

    proptest! {
        #[test]
        fn ordering_is_total(a in version_strategy(), b in version_strategy()) {
            let (va, vb) = (Version::parse(&a).unwrap(), Version::parse(&b).unwrap());
            let forward = va.cmp(&vb);
            prop_assert_eq!(forward, vb.cmp(&va).reverse());
            prop_assert_eq!(forward == Ordering::Equal, va.version() == vb.version());
        }

        #[test]
        fn ordering_is_transitive(
            a in version_strategy(),
            b in version_strategy(),
            c in version_strategy(),
        ) {
            let mut versions = [
                Version::parse(&a).unwrap(),
                Version::parse(&b).unwrap(),
                Version::parse(&c).unwrap(),
            ];
            versions.sort();
            prop_assert!(versions[0] <= versions[1]);
            prop_assert!(versions[1] <= versions[2]);
            prop_assert!(versions[0] <= versions[2]);
        }

        #[test]
        fn exact_constraint_matches_only_itself(a in version_strategy(), b in version_strategy()) {
            let va = Version::parse(&a).unwrap();
            let vb = Version::parse(&b).unwrap();
            let exact = VersionConstraint::parse(&format!("={a}")).unwrap();
            prop_assert!(exact.is_satisfied_by(&va, None));
            prop_assert_eq!(exact.is_satisfied_by(&vb, None), va.version() == vb.version());
        }

        #[test]
        fn compatible_constraint_never_accepts_older(a in version_strategy(), b in version_strategy()) {
            let va = Version::parse(&a).unwrap();
            let vb = Version::parse(&b).unwrap();
            let compatible = VersionConstraint::parse(&a).unwrap();
            if vb < va {
                prop_assert!(!compatible.is_satisfied_by(&vb, None));
            }
        }
    }

    #[test]
    fn test_sort_property() {
        let mut versions: Vec<Version> = ["1.0.0", "1.0.0-rc.0", "1.0.10", "1.0.2"]
            .into_iter()
            .map(|s| s.parse().unwrap())
            .collect();
        versions.sort();
        let raw: Vec<&str> = versions.iter().map(Version::raw).collect();
        assert_eq!(raw, vec!["1.0.0-rc.0", "1.0.0", "1.0.2", "1.0.10"]);
    }

    #[test]
    fn test_constraint_with_anticipated_prerelease() {
        let c = PackageConstraint::parse("foo").unwrap();
        let rc: Version = "1.0.0-rc.1".parse().unwrap();
        assert!(!c.is_satisfied_by(&rc, None));
        let allowed: BTreeSet<String> = ["1.0.0-rc.1".to_string()].into();
        assert!(c.is_satisfied_by(&rc, Some(&allowed)));

        let pinned = PackageConstraint::parse("foo@=1.0.0-rc.1").unwrap();
        assert!(pinned.is_satisfied_by(&rc, None));
        assert_eq!(
            pinned.constraint().exact_versions().next().map(Version::raw),
            Some("1.0.0-rc.1")
        );
    }

    #[test]
    fn test_dependency_round_trip_through_json() {
        let deps: Vec<Dependency> = ["bar@=2.0.0 || =2.0.1", "bzzz", "?weakly1@1.0.0", "?weakly2"]
            .into_iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let json = serde_json::to_string(&deps).unwrap();
        assert_eq!(
            json,
            r#"["bar@=2.0.0 || =2.0.1","bzzz","?weakly1@1.0.0","?weakly2"]"#
        );
        let back: Vec<Dependency> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, deps);
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            Version::parse("1.0"),
            Err(versolve_errors::VersionError::InvalidVersion { .. })
        ));
        assert!(matches!(
            VersionConstraint::parse("1.0.0 ||"),
            Err(versolve_errors::VersionError::InvalidConstraint { .. })
        ));
        assert!(matches!(
            PackageConstraint::parse("Bad@1.0.0"),
            Err(versolve_errors::VersionError::InvalidPackageName { .. })
        ));
    }
}
