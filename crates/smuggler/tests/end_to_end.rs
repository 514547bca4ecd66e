//! Full pipeline over a mocked mirror: request, resolve, download, and
//! repository synthesis, then the emitted tree fed back through the
//! parser.

use smuggler::{
    smuggle_distribution, Architecture, CacheConfig, Fetcher, MetadataCache, OutputKind,
    PackageFamily, SmugglerConfig,
};
use smuggler_catalog::Distribution;
use smuggler_core::Package;
use smuggler_test_utils::fixtures;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_distribution(base_url: &str) -> Distribution {
    let mut repo = smuggler_catalog::lookup("rocky-9").unwrap().default_repos[0].clone();
    repo.id = "baseos".to_string();
    repo.base_url = base_url.to_string();
    Distribution {
        id: "mock-9".to_string(),
        name: "Mock Linux".to_string(),
        version: "9".to_string(),
        codename: None,
        family: PackageFamily::Yum,
        architectures: vec![Architecture::X86_64],
        default_repos: vec![repo],
        extended_repos: vec![],
    }
}

async fn mount_yum_fixtures(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/repodata/repomd\.xml$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fixtures::REPOMD_XML.as_bytes()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/repodata/primary\.xml\.gz$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(fixtures::gzip(fixtures::PRIMARY_XML.as_bytes())),
        )
        .mount(server)
        .await;
    // every package body; the fixture digests are synthetic, so the
    // pipeline below runs with checksum verification off
    Mock::given(method("GET"))
        .and(path_regex(r"^/Packages/.*\.rpm$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"rpm-body".to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn repository_mode_round_trip() {
    let server = MockServer::start().await;
    mount_yum_fixtures(&server).await;

    let dist = mock_distribution(&server.uri());
    let out = tempfile::tempdir().unwrap();

    let config = SmugglerConfig {
        verify_checksum: false,
        output: OutputKind::Both,
        ..SmugglerConfig::default()
    };
    let fetcher = Fetcher::with_defaults().unwrap();
    let cache = MetadataCache::new(CacheConfig::default()).unwrap();

    let request = smuggler::SmuggleRequest::new(
        vec!["curl".to_string()],
        "mock-9",
        Architecture::X86_64,
        out.path(),
    );
    let report = smuggle_distribution(&dist, request, &config, &fetcher, &cache)
        .await
        .unwrap();

    // the closure resolved completely and installed deps first
    assert!(report.resolution.is_complete());
    assert_eq!(report.resolution.packages.len(), 4);
    assert!(
        report.resolution.position("zlib").unwrap()
            < report.resolution.position("curl").unwrap()
    );

    // every item downloaded
    assert_eq!(report.download.completed(), 4);

    // the emitted repository parses back to exactly the downloaded subset
    let repo_dir = report.repository_dir.as_ref().unwrap();
    let primary_gz = std::fs::read(repo_dir.join("repodata/primary.xml.gz")).unwrap();
    let mut primary = Vec::new();
    use std::io::Read;
    flate2::read::GzDecoder::new(&primary_gz[..])
        .read_to_end(&mut primary)
        .unwrap();
    let reparsed =
        smuggler_index::yum::parse_primary(&primary, "baseos", Architecture::X86_64).unwrap();

    let mut expected: Vec<String> = report
        .resolution
        .packages
        .iter()
        .map(|p: &Package| p.identity().to_string())
        .collect();
    let mut actual: Vec<String> = reparsed.iter().map(|p| p.identity().to_string()).collect();
    expected.sort();
    actual.sort();
    assert_eq!(expected, actual);

    // archive-side manifest exists in Both mode, install-ordered
    let manifest = smuggler_mirror::read_manifest(&out.path().join("metadata.json")).unwrap();
    assert_eq!(manifest.len(), 4);
    let curl_idx = manifest.iter().position(|e| e.name == "curl").unwrap();
    let zlib_idx = manifest.iter().position(|e| e.name == "zlib").unwrap();
    assert!(zlib_idx < curl_idx);
}

#[tokio::test]
async fn unknown_architecture_fails_before_io() {
    let dist = mock_distribution("http://unreachable.invalid");
    let out = tempfile::tempdir().unwrap();

    let request = smuggler::SmuggleRequest::new(
        vec!["curl".to_string()],
        "mock-9",
        Architecture::Aarch64,
        out.path(),
    );
    let err = smuggle_distribution(
        &dist,
        request,
        &SmugglerConfig::default(),
        &Fetcher::with_defaults().unwrap(),
        &MetadataCache::session(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, smuggler::Error::Config(_)));
}

#[tokio::test]
async fn unresolved_template_variable_fails_before_io() {
    let mut dist = mock_distribution("http://mirror.invalid/$unknownvar");
    dist.default_repos[0].base_url = "http://mirror.invalid/$unknownvar".to_string();
    let out = tempfile::tempdir().unwrap();

    let request = smuggler::SmuggleRequest::new(
        vec!["curl".to_string()],
        "mock-9",
        Architecture::X86_64,
        out.path(),
    );
    let err = smuggle_distribution(
        &dist,
        request,
        &SmugglerConfig::default(),
        &Fetcher::with_defaults().unwrap(),
        &MetadataCache::session(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, smuggler::Error::Config(_)));
}

#[tokio::test]
async fn unknown_distribution_id_is_fatal() {
    let out = tempfile::tempdir().unwrap();
    let request = smuggler::SmuggleRequest::new(
        vec!["curl".to_string()],
        "not-a-distro",
        Architecture::X86_64,
        out.path(),
    );
    let err = smuggler::smuggle(
        request,
        &SmugglerConfig::default(),
        &Fetcher::with_defaults().unwrap(),
        &MetadataCache::session(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, smuggler::Error::Config(_)));
}
