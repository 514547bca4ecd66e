//! End-to-end resolution scenarios over parsed and synthetic universes.

use smuggler_core::{Architecture, ChecksumType, DepOperator, PackageFamily};
use smuggler_index::{yum, PackageUniverse};
use smuggler_resolver::{MissingReason, Resolver, ResolverOptions};
use smuggler_test_utils::{fixtures, PackageBuilder};

fn yum_universe() -> PackageUniverse {
    let packages = yum::parse_primary(
        fixtures::PRIMARY_XML.as_bytes(),
        "baseos",
        Architecture::X86_64,
    )
    .unwrap();
    PackageUniverse::from_packages(PackageFamily::Yum, packages)
}

#[test]
fn simple_rpm_resolve_orders_dependencies_first() {
    let universe = yum_universe();
    let resolver = Resolver::new(&universe, Architecture::X86_64, ResolverOptions::default());

    let result = resolver.resolve_names(&["curl"]);

    assert!(result.is_complete(), "unresolved: {:?}", result.unresolved);
    let names: Vec<&str> = result.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names.len(), 4);
    for dep in ["libcurl", "openssl-libs", "zlib"] {
        assert!(
            result.position(dep).unwrap() < result.position("curl").unwrap(),
            "{dep} must install before curl"
        );
    }
}

#[test]
fn resolve_is_deterministic() {
    let universe = yum_universe();
    let resolver = Resolver::new(&universe, Architecture::X86_64, ResolverOptions::default());

    let first = resolver.resolve_names(&["curl"]);
    let second = resolver.resolve_names(&["curl"]);
    assert_eq!(first.identities(), second.identities());
}

#[test]
fn transitive_conflict_retains_both_versions() {
    // two repositories exposing curl at different versions
    let mut universe = yum_universe();
    universe.add(
        PackageBuilder::rpm("curl", "8.0.1", "1.el9")
            .repo("extras")
            .checksum(ChecksumType::Sha256, &"9".repeat(64))
            .dep("zlib")
            .build(),
    );
    universe.add(
        PackageBuilder::rpm("git", "2.43.0", "1.el9")
            .repo("extras")
            .checksum(ChecksumType::Sha256, &"8".repeat(64))
            .dep("curl")
            .build(),
    );

    let resolver = Resolver::new(&universe, Architecture::X86_64, ResolverOptions::default());
    let result = resolver.resolve_names(&["git"]);

    let conflict = result
        .conflicts
        .iter()
        .find(|c| c.capability == "curl")
        .expect("curl conflict recorded");
    assert_eq!(conflict.versions.len(), 2);
    // highest first
    assert_eq!(conflict.versions[0], "8.0.1-1.el9");

    // both variants flow into the download set
    let curl_versions: Vec<&str> = result
        .packages
        .iter()
        .filter(|p| p.name == "curl")
        .map(|p| p.version.as_str())
        .collect();
    assert!(curl_versions.contains(&"8.0.1"));
    assert!(curl_versions.contains(&"7.76.1"));

    // the graph edge picked the higher version
    let git_pos = result.position("git").unwrap();
    let best_curl_pos = result
        .packages
        .iter()
        .position(|p| p.name == "curl" && p.version == "8.0.1")
        .unwrap();
    assert!(best_curl_pos < git_pos);
}

#[test]
fn apt_virtual_package_selects_first_provider() {
    let packages = smuggler_index::apt::parse_packages(
        fixtures::PACKAGES,
        "main",
        Architecture::Amd64,
    )
    .unwrap();
    let universe = PackageUniverse::from_packages(PackageFamily::Apt, packages);
    let resolver = Resolver::new(&universe, Architecture::Amd64, ResolverOptions::default());

    let result = resolver.resolve_names(&["mail-transport-agent"]);

    assert!(result.is_complete(), "unresolved: {:?}", result.unresolved);
    // postfix is indexed before exim4
    let provider = result.get("postfix").expect("postfix selected");
    assert_eq!(provider.version, "3.6.4-1ubuntu1.3");
    assert!(result.get("exim4").is_none());

    // its libc/ssl deps install first
    for dep in ["libc6", "libssl3"] {
        assert!(result.position(dep).unwrap() < result.position("postfix").unwrap());
    }
}

#[test]
fn apk_shared_library_capability_resolves() {
    let packages = smuggler_index::apk::parse_apkindex(
        fixtures::APKINDEX,
        "main",
        Architecture::X86_64,
    )
    .unwrap();
    let universe = PackageUniverse::from_packages(PackageFamily::Apk, packages);
    let resolver = Resolver::new(&universe, Architecture::X86_64, ResolverOptions::default());

    let result = resolver.resolve_names(&["curl"]);

    assert!(result.is_complete(), "unresolved: {:?}", result.unresolved);
    // so:libssl.so.3 resolved through the provides index
    assert!(result.get("libssl3").is_some());
    // closure includes musl via so:libc.musl-x86_64.so.1
    assert!(result.get("musl").is_some());
    assert!(result.position("musl").unwrap() < result.position("curl").unwrap());
}

#[test]
fn missing_dependency_is_collected_not_fatal() {
    let universe = PackageUniverse::from_packages(
        PackageFamily::Apk,
        vec![PackageBuilder::apk("broken", "1.0-r0")
            .dep("no-such-package")
            .build()],
    );
    let resolver = Resolver::new(&universe, Architecture::X86_64, ResolverOptions::default());
    let result = resolver.resolve_names(&["broken"]);

    assert_eq!(result.packages.len(), 1);
    assert_eq!(result.unresolved.len(), 1);
    assert_eq!(result.unresolved[0].reason, MissingReason::NotFound);
    assert_eq!(result.unresolved[0].requester, "broken");
}

#[test]
fn version_mismatch_reason_is_distinguished() {
    let universe = PackageUniverse::from_packages(
        PackageFamily::Apk,
        vec![
            PackageBuilder::apk("app", "1.0-r0")
                .dep_versioned("lib", DepOperator::Ge, "2.0-r0")
                .build(),
            PackageBuilder::apk("lib", "1.5-r0").build(),
        ],
    );
    let resolver = Resolver::new(&universe, Architecture::X86_64, ResolverOptions::default());
    let result = resolver.resolve_names(&["app"]);

    assert_eq!(result.unresolved.len(), 1);
    assert_eq!(result.unresolved[0].reason, MissingReason::VersionMismatch);
}

#[test]
fn optional_edges_gated_by_options() {
    let universe = PackageUniverse::from_packages(
        PackageFamily::Apt,
        vec![
            PackageBuilder::deb("app", "1.0-1")
                .suggests("docs")
                .recommends("certs")
                .build(),
            PackageBuilder::deb("docs", "1.0-1").build(),
            PackageBuilder::deb("certs", "1.0-1").build(),
        ],
    );

    let closed = Resolver::new(&universe, Architecture::Amd64, ResolverOptions::default())
        .resolve_names(&["app"]);
    assert_eq!(closed.packages.len(), 1);

    let open = Resolver::new(
        &universe,
        Architecture::Amd64,
        ResolverOptions {
            include_optional: true,
            include_recommends: true,
        },
    )
    .resolve_names(&["app"]);
    let names: Vec<&str> = open.packages.iter().map(|p| p.name.as_str()).collect();
    assert!(names.contains(&"docs"));
    assert!(names.contains(&"certs"));
}

#[test]
fn cyclic_dependencies_do_not_deadlock() {
    let universe = PackageUniverse::from_packages(
        PackageFamily::Yum,
        vec![
            PackageBuilder::rpm("a", "1.0", "1").dep("b").build(),
            PackageBuilder::rpm("b", "1.0", "1").dep("a").build(),
        ],
    );
    let resolver = Resolver::new(&universe, Architecture::X86_64, ResolverOptions::default());
    let result = resolver.resolve_names(&["a"]);

    assert_eq!(result.packages.len(), 2);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("cycle")));
}

#[test]
fn repository_priority_breaks_version_ties() {
    let mut official = smuggler_catalog::lookup("rocky-9").unwrap().default_repos[0].clone();
    official.id = "high".to_string();
    official.priority = Some(1);
    let mut low = official.clone();
    low.id = "low".to_string();
    low.priority = Some(99);

    let universe = PackageUniverse::from_packages(
        PackageFamily::Yum,
        vec![
            PackageBuilder::rpm("tool", "1.0", "1").repo("low").build(),
            PackageBuilder::rpm("tool", "1.0", "1").repo("high").build(),
        ],
    );
    let resolver = Resolver::new(&universe, Architecture::X86_64, ResolverOptions::default())
        .with_repositories(&[&official, &low]);

    let result = resolver.resolve_names(&["tool"]);
    assert_eq!(result.packages.len(), 1);
    assert_eq!(result.packages[0].repo_id, "high");
}

#[test]
fn no_duplicates_under_identity() {
    let universe = yum_universe();
    let resolver = Resolver::new(&universe, Architecture::X86_64, ResolverOptions::default());
    // zlib is reachable through three paths
    let result = resolver.resolve_names(&["curl", "libcurl", "zlib"]);

    let ids = result.identities();
    let mut dedup = ids.clone();
    dedup.sort_by(|a, b| format!("{a}").cmp(&format!("{b}")));
    dedup.dedup();
    assert_eq!(ids.len(), dedup.len());
}
