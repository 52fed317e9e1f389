//! Integration tests for catalog crate

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;
    use versolve_catalog::*;
    use versolve_errors::{CatalogError, Error};
    use versolve_types::Dependency;

    fn deps(list: &[&str]) -> Vec<Dependency> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn create_test_cache() -> DependencyCache {
        let mut cache = DependencyCache::new();
        // Added out of order; version queries come back sorted
        cache
            .add_package_version(
                "foo",
                "1.0.1",
                deps(&["bar@=2.0.0 || =2.0.1", "bzzz", "?weakly1@1.0.0", "?weakly2"]),
            )
            .unwrap();
        cache
            .add_package_version("foo", "1.0.0", deps(&["bar@=2.0.0"]))
            .unwrap();
        cache
    }

    #[test]
    fn test_cache_behaviour() {
        let mut cache = create_test_cache();

        let err = cache
            .add_package_version("foo", "1.0.0", deps(&["blah@1.0.0"]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::DuplicateEntry { .. })
        ));

        let json = serde_json::to_value(&cache).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": {
                    "foo 1.0.1": ["bar@=2.0.0 || =2.0.1", "bzzz", "?weakly1@1.0.0", "?weakly2"],
                    "foo 1.0.0": ["bar@=2.0.0"]
                }
            })
        );
        let reparsed: DependencyCache = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(serde_json::to_value(&reparsed).unwrap(), json);

        let mut listed = Vec::new();
        let _ = cache.each_package_version(|package, version, deps| {
            let mut names: Vec<&str> = deps.iter().map(Dependency::package).collect();
            names.sort_unstable();
            listed.push((format!("{package} {version}"), names.join(",")));
            ControlFlow::Continue(())
        });
        assert_eq!(
            listed,
            vec![
                ("foo 1.0.0".to_string(), "bar".to_string()),
                ("foo 1.0.1".to_string(), "bar,bzzz,weakly1,weakly2".to_string()),
            ]
        );

        let mut visited = 0;
        let flow = cache.each_package_version(|_, _, _| {
            visited += 1;
            ControlFlow::Break(())
        });
        assert!(flow.is_break());
        assert_eq!(visited, 1);

        let foos: Vec<(String, Vec<String>)> = cache
            .get_package_versions("foo")
            .into_iter()
            .map(|v| {
                let mut rendered: Vec<String> = cache
                    .get_dependency_map("foo", v)
                    .unwrap()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                rendered.sort();
                (v.to_string(), rendered)
            })
            .collect();
        assert_eq!(
            foos,
            vec![
                ("1.0.0".to_string(), vec!["bar@=2.0.0".to_string()]),
                (
                    "1.0.1".to_string(),
                    vec![
                        "?weakly1@1.0.0".to_string(),
                        "?weakly2".to_string(),
                        "bar@=2.0.0 || =2.0.1".to_string(),
                        "bzzz".to_string(),
                    ]
                ),
            ]
        );

        assert!(cache.get_dependency_map("foo", "7.0.0").is_err());

        let mut versions = Vec::new();
        let _ = cache.each_package(|_, vv| {
            versions.extend(vv.iter().map(|v| v.raw().to_string()));
            ControlFlow::Continue(())
        });
        assert_eq!(versions, vec!["1.0.0", "1.0.1"]);

        cache.add_package_version("bar", "1.0.0", Vec::new()).unwrap();
        let mut one_package = Vec::new();
        let _ = cache.each_package(|p, _| {
            assert!(p == "foo" || p == "bar");
            one_package.push(p.to_string());
            ControlFlow::Break(())
        });
        assert_eq!(one_package.len(), 1);
    }

    #[test]
    fn test_loader_against_json_catalog() {
        let catalog = InMemoryCatalog::from_json(
            r#"[
                {"packageName": "app", "version": "1.0.0",
                 "dependencies": {"lib": {"constraint": "1.0.0", "references": [{"arch": "os"}]}}},
                {"packageName": "lib", "version": "1.2.0", "dependencies": {}},
                {"packageName": "lib", "version": "1.0.0", "dependencies": {}}
            ]"#,
        )
        .unwrap();
        let mut loader = CatalogLoader::new(&catalog);
        let mut cache = DependencyCache::new();
        loader
            .load_all_versions_recursive(&mut cache, ["app"])
            .unwrap();
        assert_eq!(cache.get_package_versions("lib"), vec!["1.0.0", "1.2.0"]);
        assert_eq!(
            cache
                .get_dependency_map("app", "1.0.0")
                .unwrap()
                .get("lib")
                .unwrap()
                .to_string(),
            "lib@1.0.0"
        );
    }
}
