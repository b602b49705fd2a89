//! Conditional flags derived from dependency `condition` paths
//!
//! A parent declaring `condition: db.enabled` for its `db` dependency expects
//! the values of `db` to accept an `enabled` boolean. The flag is patched into
//! the subchart's own schema so it also shows up wherever that schema is
//! embedded.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::debug;

use crate::chart::{ChartFile, DependencyFilter};
use crate::generate::ChartResult;
use crate::schema::Schema;

pub const CONDITION_DESCRIPTION: &str = "Conditional property used in parent chart";

/// Chart name -> property paths to guarantee in that chart's schema
pub type ConditionPatches = BTreeMap<String, Vec<Vec<String>>>;

/// Collect the condition paths every successful chart declares on its
/// dependencies.
///
/// The first path segment names the target chart. When it matches the
/// dependency's alias the patch goes to the aliased chart, even if another
/// chart is named like the alias.
pub fn collect_condition_patches(
    results: &[ChartResult],
    filter: &DependencyFilter,
) -> ConditionPatches {
    let mut patches = ConditionPatches::new();

    for chart in results.iter().filter(|r| r.is_ok()).filter_map(|r| r.chart.as_ref()) {
        collect_for_chart(chart, filter, &mut patches);
    }

    patches
}

fn collect_for_chart(chart: &ChartFile, filter: &DependencyFilter, patches: &mut ConditionPatches) {
    for dep in &chart.dependencies {
        if !filter.allows(&dep.name) {
            continue;
        }
        for condition in dep.conditions() {
            let mut segments = condition.split('.');
            let Some(head) = segments.next() else {
                continue;
            };
            let path: Vec<String> = segments.map(str::to_string).collect();
            if path.is_empty() || path.iter().any(String::is_empty) {
                continue;
            }

            let target = if !dep.name.is_empty() && head == dep.key() {
                dep.name.clone()
            } else {
                head.to_string()
            };
            let paths = patches.entry(target).or_default();
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
}

/// Apply collected patches to the matching charts' schemas
pub fn apply_condition_patches(results: &mut [ChartResult], patches: &ConditionPatches) {
    for result in results.iter_mut().filter(|r| r.is_ok()) {
        let Some(name) = result.chart.as_ref().map(|c| c.name.as_str()) else {
            continue;
        };
        let Some(paths) = patches.get(name) else {
            continue;
        };
        for path in paths {
            patch_path(&mut result.schema, path, name);
        }
    }
}

/// Make sure `path` exists below `schema`, creating objects on the way and a
/// boolean at the end. Existing properties are never replaced.
pub fn patch_path(schema: &mut Schema, path: &[String], chart: &str) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut node = schema;
    for key in parents {
        node = match node.properties.entry(key.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!(chart, key = %key, "Patching conditional parent object");
                entry.insert(Schema::object().with_title(key.as_str()))
            }
        };
    }

    if let Entry::Vacant(entry) = node.properties.entry(last.clone()) {
        debug!(chart, key = %last, "Patching conditional field");
        entry.insert(
            Schema::boolean()
                .with_title(last.as_str())
                .with_description(CONDITION_DESCRIPTION),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Dependency;

    fn parent(deps: Vec<Dependency>) -> ChartResult {
        let chart = ChartFile {
            name: "app".into(),
            dependencies: deps,
            ..ChartFile::default()
        };
        ChartResult::generated("app/Chart.yaml", chart, Schema::object())
    }

    fn dep(name: &str, alias: &str, condition: &str) -> Dependency {
        Dependency {
            name: name.into(),
            alias: alias.into(),
            condition: condition.into(),
            ..Dependency::default()
        }
    }

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    #[test]
    fn test_collects_by_chart_and_alias() {
        let results = vec![parent(vec![
            dep("db", "database", "database.enabled"),
            dep("cache", "", "cache.settings.enabled"),
            dep("queue", "", "queue"),
        ])];
        let patches = collect_condition_patches(&results, &DependencyFilter::default());

        assert_eq!(patches["db"], vec![path("enabled")]);
        assert_eq!(patches["cache"], vec![path("settings.enabled")]);
        assert!(!patches.contains_key("queue"));
        assert!(!patches.contains_key("database"));
    }

    #[test]
    fn test_filter_excludes_conditions() {
        let results = vec![parent(vec![dep("db", "", "db.enabled")])];
        let patches = collect_condition_patches(&results, &DependencyFilter::new(["other"]));
        assert!(patches.is_empty());
    }

    #[test]
    fn test_adds_boolean_at_root() {
        let mut schema = Schema::object();
        patch_path(&mut schema, &path("enabled"), "db");

        let enabled = &schema.properties["enabled"];
        assert_eq!(enabled.type_, vec!["boolean"]);
        assert_eq!(enabled.description, CONDITION_DESCRIPTION);
    }

    #[test]
    fn test_existing_property_wins() {
        let mut schema = Schema::object();
        schema
            .properties
            .insert("enabled".into(), Schema::typed("string").with_title("custom"));
        patch_path(&mut schema, &path("enabled"), "db");

        assert_eq!(schema.properties["enabled"].type_, vec!["string"]);
        assert_eq!(schema.properties["enabled"].title, "custom");
    }

    #[test]
    fn test_nested_path_reuses_existing_objects() {
        let mut schema = Schema::object();
        let mut settings = Schema::object();
        settings.properties.insert("ttl".into(), Schema::typed("integer"));
        schema.properties.insert("settings".into(), settings);

        patch_path(&mut schema, &path("settings.feature.enabled"), "cache");

        let settings = &schema.properties["settings"];
        assert!(settings.properties.contains_key("ttl"));
        let feature = &settings.properties["feature"];
        assert!(feature.has_type("object"));
        assert_eq!(feature.properties["enabled"].type_, vec!["boolean"]);
    }

    #[test]
    fn test_apply_targets_named_chart() {
        let db = ChartResult::generated(
            "db/Chart.yaml",
            ChartFile {
                name: "db".into(),
                ..ChartFile::default()
            },
            Schema::object(),
        );
        let mut results = vec![parent(vec![dep("db", "database", "database.enabled")]), db];
        let patches = collect_condition_patches(&results, &DependencyFilter::default());
        apply_condition_patches(&mut results, &patches);

        assert!(results[0].schema.properties.is_empty());
        assert!(results[1].schema.properties["enabled"].has_type("boolean"));
    }

    #[test]
    fn test_alias_takes_precedence_over_chart_of_same_name() {
        let named = |name: &str| {
            ChartResult::generated(
                format!("{}/Chart.yaml", name),
                ChartFile {
                    name: name.into(),
                    ..ChartFile::default()
                },
                Schema::object(),
            )
        };
        let mut results = vec![
            parent(vec![dep("db", "database", "database.enabled")]),
            named("db"),
            named("database"),
        ];
        let patches = collect_condition_patches(&results, &DependencyFilter::default());
        assert_eq!(patches.keys().collect::<Vec<_>>(), vec!["db"]);

        apply_condition_patches(&mut results, &patches);
        assert!(results[1].schema.properties["enabled"].has_type("boolean"));
        assert!(results[2].schema.properties.is_empty());
    }
}
