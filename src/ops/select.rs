//! Selective test runner.
//!
//! Prunes composer.json down to the requested components, deletes the
//! directories of the others, updates dependencies and runs the test suite.
//! With no package names it only runs the test suite.
//!
//! All validation happens in [`prune_manifest`]'s callers before anything is
//! written: the plan is computed in memory first and applied afterwards.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::core::errors::MonosplitError;
use crate::core::manifest::{Manifest, RepositoryRef};
use crate::core::registry::ComponentRegistry;
use crate::sources::PackageSource;
use crate::util::config::PrunePolicy;
use crate::util::fs::{normalize_rel, remove_dir_all_if_exists};
use crate::util::process::{run_checked, CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Options for the test runner.
#[derive(Debug, Clone)]
pub struct SelectOptions {
    /// Package names to keep (empty = everything, no pruning)
    pub packages: Vec<String>,

    pub policy: PrunePolicy,

    /// Dependency update command, as argv
    pub update_command: Vec<String>,

    /// Test suite command, as argv
    pub test_command: Vec<String>,
}

/// The pruned manifest and the directories to delete.
#[derive(Debug, Clone)]
pub struct PrunePlan {
    /// Rewritten manifest (not yet saved)
    pub manifest: Manifest,

    /// Component paths that stay on disk
    pub kept_paths: BTreeSet<String>,

    /// Component paths to delete, sorted
    pub removed_paths: Vec<String>,

    /// Number of `repositories` entries dropped
    pub dropped_repositories: usize,
}

/// Outcome of [`run_tests`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectReport {
    /// Selected package names (empty when nothing was pruned)
    pub selected: Vec<String>,

    /// Component paths that were deleted
    pub removed_paths: Vec<String>,
}

/// Build the component registry from `extra.git-split.repos`.
pub fn component_registry(
    manifest: &Manifest,
    source: &mut dyn PackageSource,
) -> Result<ComponentRegistry> {
    let repos = manifest.split_repos()?;
    ComponentRegistry::build(&repos, source)
}

/// Check that every selected component is a dev dependency of the root.
///
/// Pruning only keeps components that are already in `require-dev`, so a
/// selected package missing from it would silently drop out of the run.
pub fn ensure_in_require_dev(manifest: &Manifest, names: &[String]) -> Result<(), MonosplitError> {
    let require_dev = manifest.require_dev();
    match names.iter().find(|name| !require_dev.contains_key(name.as_str())) {
        Some(name) => Err(MonosplitError::NotInRequireDev { name: name.clone() }),
        None => Ok(()),
    }
}

/// Compute the pruned manifest for `selection`.
///
/// `selection` must already be validated against `registry` and
/// [`ensure_in_require_dev`].
///
/// Path repositories are kept when they point at a kept component. Those
/// pointing at no component at all (shared tooling, say) are kept unless
/// `policy.keep_unmatched_path_repositories` is off.
pub fn prune_manifest(
    manifest: &Manifest,
    registry: &ComponentRegistry,
    selection: &BTreeSet<String>,
    policy: PrunePolicy,
) -> PrunePlan {
    let mut pruned = manifest.clone();

    // Plain dev dependencies first, then the selected components.
    let require_dev = manifest.require_dev();
    let (components, plain): (Vec<_>, Vec<_>) = require_dev
        .into_iter()
        .partition(|(name, _)| registry.contains(name));

    let mut merged: Vec<(String, Value)> = plain;
    merged.extend(
        components
            .into_iter()
            .filter(|(name, _)| selection.contains(name)),
    );
    if manifest.sort_packages() {
        merged.sort_by(|a, b| a.0.cmp(&b.0));
    }
    pruned.set_require_dev(merged.into_iter().collect::<Map<String, Value>>());

    let kept_names = if policy.keep_required_siblings {
        let closure = registry.with_required_siblings(selection);
        for extra in closure.difference(selection) {
            tracing::info!("keeping {} (required by the selection)", extra);
        }
        closure
    } else {
        selection.clone()
    };

    let kept_paths: BTreeSet<String> = registry
        .paths_of(&kept_names)
        .into_iter()
        .map(str::to_string)
        .collect();
    let removed_paths: Vec<String> = registry
        .paths()
        .into_iter()
        .filter(|p| !kept_paths.contains(*p))
        .map(str::to_string)
        .collect();

    let component_paths = registry.paths();
    let dropped_repositories = pruned.retain_repositories(|repo| {
        let repo = RepositoryRef::from_value(repo);
        if !repo.is_path() {
            return policy.keep_non_path_repositories;
        }
        let Some(url) = repo.url else {
            return policy.keep_unmatched_path_repositories;
        };
        let url = normalize_rel(url);
        if component_paths.contains(url.as_str()) {
            kept_paths.contains(&url)
        } else {
            policy.keep_unmatched_path_repositories
        }
    });

    PrunePlan {
        manifest: pruned,
        kept_paths,
        removed_paths,
        dropped_repositories,
    }
}

/// Run the test suite against the selected components.
pub fn run_tests(
    manifest: Manifest,
    opts: &SelectOptions,
    source: &mut dyn PackageSource,
    runner: &mut dyn CommandRunner,
    shell: &Shell,
) -> Result<SelectReport> {
    let root = manifest.root().to_path_buf();

    if opts.packages.is_empty() {
        tracing::debug!("no packages selected, running the full suite");
        build_and_test(&root, opts, runner, shell)?;
        return Ok(SelectReport::default());
    }

    let registry = component_registry(&manifest, source)?;
    let selection = registry.validate_selection(&opts.packages)?;
    ensure_in_require_dev(&manifest, &opts.packages)?;
    let plan = prune_manifest(&manifest, &registry, &selection, opts.policy);

    for path in &plan.removed_paths {
        if remove_dir_all_if_exists(&root.join(path))? {
            shell.status(Status::Removed, path);
        } else {
            tracing::debug!("{} already absent", path);
        }
    }
    if plan.dropped_repositories > 0 {
        tracing::debug!("dropped {} repositories entries", plan.dropped_repositories);
    }

    plan.manifest.save()?;
    shell.status(Status::Updated, plan.manifest.path().display());

    let update = ProcessBuilder::from_argv(&opts.update_command)
        .context("the update command is empty")?
        .cwd(&root);
    shell.status(Status::Updating, "dependencies");
    shell.command(update.display_relative(&root));
    run_checked(runner, &update)?;

    build_and_test(&root, opts, runner, shell)?;

    Ok(SelectReport {
        selected: selection.into_iter().collect(),
        removed_paths: plan.removed_paths,
    })
}

fn build_and_test(
    root: &std::path::Path,
    opts: &SelectOptions,
    runner: &mut dyn CommandRunner,
    shell: &Shell,
) -> Result<()> {
    let test = ProcessBuilder::from_argv(&opts.test_command)
        .context("the test command is empty")?
        .cwd(root);
    shell.status(Status::Testing, root.display());
    shell.command(test.display_relative(root));
    run_checked(runner, &test)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::PathSource;
    use crate::test_support::{write_component, MockProcessOutput, MockRunner, MonorepoFixture};
    use std::path::Path;

    fn options(packages: &[&str]) -> SelectOptions {
        SelectOptions {
            packages: packages.iter().map(|s| s.to_string()).collect(),
            policy: PrunePolicy::default(),
            update_command: vec!["composer".into(), "update".into(), "--no-interaction".into()],
            test_command: vec!["vendor/bin/phpunit".into()],
        }
    }

    fn ok_runner() -> MockRunner {
        let mut runner = MockRunner::new();
        runner.set_default(MockProcessOutput::success(""));
        runner
    }

    fn dev_keys(manifest: &Manifest) -> Vec<String> {
        manifest.require_dev().keys().cloned().collect()
    }

    #[test]
    fn test_empty_selection_runs_tests_only() {
        let fixture = MonorepoFixture::standard();
        let before = std::fs::read_to_string(fixture.manifest_path()).unwrap();
        let mut runner = ok_runner();

        let report = run_tests(
            fixture.manifest(),
            &options(&[]),
            &mut PathSource::new(fixture.root()),
            &mut runner,
            &Shell::quiet(),
        )
        .unwrap();

        assert_eq!(report, SelectReport::default());
        assert_eq!(runner.calls(), ["vendor/bin/phpunit"]);
        assert_eq!(std::fs::read_to_string(fixture.manifest_path()).unwrap(), before);
        for dir in ["lib/repo1", "lib/repo2", "lib/repo3"] {
            assert!(fixture.root().join(dir).exists());
        }
    }

    #[test]
    fn test_selection_prunes_and_runs() {
        let fixture = MonorepoFixture::standard();
        let mut runner = ok_runner();

        let report = run_tests(
            fixture.manifest(),
            &options(&["acme/repo2"]),
            &mut PathSource::new(fixture.root()),
            &mut runner,
            &Shell::quiet(),
        )
        .unwrap();

        assert_eq!(report.selected, ["acme/repo2"]);
        assert_eq!(report.removed_paths, ["lib/repo1", "lib/repo3"]);
        assert_eq!(
            runner.calls(),
            ["composer update --no-interaction", "vendor/bin/phpunit"]
        );

        assert!(!fixture.root().join("lib/repo1").exists());
        assert!(fixture.root().join("lib/repo2/composer.json").exists());
        assert!(!fixture.root().join("lib/repo3").exists());
        // Non-component directories are never touched.
        assert!(fixture.root().join("tools/helper").exists());

        let rewritten = fixture.manifest();
        assert_eq!(dev_keys(&rewritten), ["phpunit/phpunit", "symfony/var-dumper", "acme/repo2"]);
        let repo_urls: Vec<_> = rewritten
            .repositories()
            .iter()
            .filter_map(|r| RepositoryRef::from_value(r).url.map(str::to_string))
            .collect();
        assert_eq!(repo_urls, ["./lib/repo2", "tools/helper", "https://github.com/acme/fork"]);
    }

    #[test]
    fn test_invalid_package_mutates_nothing() {
        let fixture = MonorepoFixture::standard();
        let before = std::fs::read_to_string(fixture.manifest_path()).unwrap();
        let mut runner = ok_runner();

        let err = run_tests(
            fixture.manifest(),
            &options(&["acme/repo1", "acme/unknown"]),
            &mut PathSource::new(fixture.root()),
            &mut runner,
            &Shell::quiet(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MonosplitError>(),
            Some(MonosplitError::InvalidPackage { name }) if name == "acme/unknown"
        ));
        assert!(runner.calls().is_empty());
        assert_eq!(std::fs::read_to_string(fixture.manifest_path()).unwrap(), before);
        for dir in ["lib/repo1", "lib/repo2", "lib/repo3"] {
            assert!(fixture.root().join(dir).exists());
        }
    }

    #[test]
    fn test_missing_split_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("composer.json");
        std::fs::write(&path, r#"{"require-dev": {"phpunit/phpunit": "^9"}}"#).unwrap();
        let mut runner = ok_runner();

        let err = run_tests(
            Manifest::load(&path).unwrap(),
            &options(&["acme/repo1"]),
            &mut PathSource::new(tmp.path()),
            &mut runner,
            &Shell::quiet(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MonosplitError>(),
            Some(MonosplitError::MissingSplitConfig)
        ));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_update_failure_propagates_code_and_skips_tests() {
        let fixture = MonorepoFixture::standard();
        let mut runner = MockRunner::new();
        runner.expect_prefix("composer update", MockProcessOutput::failure(2, "conflict"));
        runner.set_default(MockProcessOutput::success(""));

        let err = run_tests(
            fixture.manifest(),
            &options(&["acme/repo1"]),
            &mut PathSource::new(fixture.root()),
            &mut runner,
            &Shell::quiet(),
        )
        .unwrap_err();

        assert_eq!(crate::core::errors::exit_code_for(&err), 2);
        assert_eq!(runner.calls(), ["composer update --no-interaction"]);
    }

    #[test]
    fn test_test_failure_propagates_code() {
        let fixture = MonorepoFixture::standard();
        let mut runner = MockRunner::new();
        runner.expect("vendor/bin/phpunit", MockProcessOutput::failure(1, ""));

        let err = run_tests(
            fixture.manifest(),
            &options(&[]),
            &mut PathSource::new(fixture.root()),
            &mut runner,
            &Shell::quiet(),
        )
        .unwrap_err();
        assert_eq!(crate::core::errors::exit_code_for(&err), 1);
    }

    #[test]
    fn test_prune_sorts_when_enabled() {
        let fixture = MonorepoFixture::standard();
        let mut manifest = fixture.manifest();
        manifest = Manifest::parse(
            manifest.path(),
            &manifest
                .to_json_string()
                .unwrap()
                .replacen("\"config\": {", "\"config\": {\n        \"sort-packages\": true,", 1),
        )
        .unwrap();
        assert!(manifest.sort_packages());

        let registry = component_registry(&manifest, &mut PathSource::new(fixture.root())).unwrap();
        let selection = registry
            .validate_selection(&["acme/repo1".to_string()])
            .unwrap();
        let plan = prune_manifest(&manifest, &registry, &selection, PrunePolicy::default());

        assert_eq!(
            dev_keys(&plan.manifest),
            ["acme/repo1", "phpunit/phpunit", "symfony/var-dumper"]
        );
    }

    #[test]
    fn test_prune_drops_non_path_repositories_by_policy() {
        let fixture = MonorepoFixture::standard();
        let manifest = fixture.manifest();
        let registry = component_registry(&manifest, &mut PathSource::new(fixture.root())).unwrap();
        let selection = registry
            .validate_selection(&["acme/repo1".to_string()])
            .unwrap();
        let policy = PrunePolicy {
            keep_non_path_repositories: false,
            ..PrunePolicy::default()
        };

        let plan = prune_manifest(&manifest, &registry, &selection, policy);
        let kinds: Vec<_> = plan
            .manifest
            .repositories()
            .iter()
            .map(|r| RepositoryRef::from_value(r).kind.unwrap_or("").to_string())
            .collect();
        assert_eq!(kinds, ["path", "path"]);
        assert_eq!(plan.dropped_repositories, 3);
    }

    #[test]
    fn test_prune_keeps_required_siblings_by_policy() {
        let fixture = MonorepoFixture::standard();
        // repo1 requires repo3.
        write_component(fixture.root(), "lib/repo1", "acme/repo1", &["php", "acme/repo3"]);

        let manifest = fixture.manifest();
        let registry = component_registry(&manifest, &mut PathSource::new(fixture.root())).unwrap();
        let selection = registry
            .validate_selection(&["acme/repo1".to_string()])
            .unwrap();
        let policy = PrunePolicy {
            keep_required_siblings: true,
            ..PrunePolicy::default()
        };

        let plan = prune_manifest(&manifest, &registry, &selection, policy);
        assert_eq!(plan.removed_paths, ["lib/repo2"]);
        assert!(plan.kept_paths.contains("lib/repo3"));
        // require-dev still only lists the explicit selection.
        assert_eq!(
            dev_keys(&plan.manifest),
            ["phpunit/phpunit", "symfony/var-dumper", "acme/repo1"]
        );
    }

    #[test]
    fn test_prune_drops_unmatched_path_repositories_by_policy() {
        let fixture = MonorepoFixture::standard();
        let manifest = fixture.manifest();
        let registry = component_registry(&manifest, &mut PathSource::new(fixture.root())).unwrap();
        let selection = registry
            .validate_selection(&["acme/repo3".to_string()])
            .unwrap();
        let policy = PrunePolicy {
            keep_unmatched_path_repositories: false,
            ..PrunePolicy::default()
        };

        let plan = prune_manifest(&manifest, &registry, &selection, policy);
        let urls: Vec<_> = plan
            .manifest
            .repositories()
            .iter()
            .filter_map(|r| RepositoryRef::from_value(r).url.map(str::to_string))
            .collect();
        assert_eq!(urls, ["lib/repo3/", "https://github.com/acme/fork"]);
        assert_eq!(plan.dropped_repositories, 3);
        // The directory itself is not a component and stays.
        assert!(!plan.removed_paths.contains(&"tools/helper".to_string()));
    }

    #[test]
    fn test_selected_component_missing_from_require_dev() {
        let fixture = MonorepoFixture::with_manifest(
            r#"{
    "require-dev": {
        "phpunit/phpunit": "^9.5"
    },
    "repositories": [
        {"type": "path", "url": "lib/a"},
        {"type": "path", "url": "lib/b"}
    ],
    "extra": {
        "git-split": {
            "repos": {
                "lib/a": "git@github.com:acme/a.git",
                "lib/b": "git@github.com:acme/b.git"
            }
        }
    }
}
"#,
        );
        write_component(fixture.root(), "lib/a", "acme/a", &[]);
        write_component(fixture.root(), "lib/b", "acme/b", &[]);
        let before = std::fs::read_to_string(fixture.manifest_path()).unwrap();
        let mut runner = ok_runner();

        let err = run_tests(
            fixture.manifest(),
            &options(&["acme/a"]),
            &mut PathSource::new(fixture.root()),
            &mut runner,
            &Shell::quiet(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MonosplitError>(),
            Some(MonosplitError::NotInRequireDev { name }) if name == "acme/a"
        ));
        assert!(runner.calls().is_empty());
        assert_eq!(std::fs::read_to_string(fixture.manifest_path()).unwrap(), before);
        assert!(fixture.root().join("lib/b").exists());
    }

    #[test]
    fn test_prune_every_subset() {
        let all = ["acme/repo1", "acme/repo2", "acme/repo3"];
        let fixture = MonorepoFixture::standard();
        let manifest = fixture.manifest();
        let registry = component_registry(&manifest, &mut PathSource::new(fixture.root())).unwrap();

        for mask in 1u8..8 {
            let names: Vec<String> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, n)| n.to_string())
                .collect();
            let selection = registry.validate_selection(&names).unwrap();
            let plan = prune_manifest(&manifest, &registry, &selection, PrunePolicy::default());

            let dev = plan.manifest.require_dev();
            let component_keys: BTreeSet<String> = dev
                .keys()
                .filter(|k| registry.contains(k))
                .cloned()
                .collect();
            assert_eq!(component_keys, selection);
            assert_eq!(dev.get("phpunit/phpunit"), Some(&Value::from("^9.5")));
            assert_eq!(dev.get("symfony/var-dumper"), Some(&Value::from("^6.0")));
            assert_eq!(plan.kept_paths.len() + plan.removed_paths.len(), 3);
            for removed in &plan.removed_paths {
                let owner = registry.components().find(|c| &c.path == removed).unwrap();
                assert!(!selection.contains(&owner.name));
            }
        }
    }

    #[test]
    fn test_report_paths_are_relative() {
        let fixture = MonorepoFixture::standard();
        let report = run_tests(
            fixture.manifest(),
            &options(&["acme/repo3"]),
            &mut PathSource::new(fixture.root()),
            &mut ok_runner(),
            &Shell::quiet(),
        )
        .unwrap();
        for path in report.removed_paths {
            assert!(Path::new(&path).is_relative());
        }
    }
}
