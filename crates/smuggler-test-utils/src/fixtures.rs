//! Miniature but grammatically faithful repository metadata samples.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

/// A `repodata/repomd.xml` listing three artefacts.
pub const REPOMD_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo" xmlns:rpm="http://linux.duke.edu/metadata/rpm">
  <revision>1719400000</revision>
  <data type="primary">
    <checksum type="sha256">8d2c3e71f5a4bfa3c45e8a4d1f0b9ce25c31e8a9d4f6b2c8e0a7d5f3b1c9e8a7</checksum>
    <location href="repodata/primary.xml.gz"/>
    <size>2048</size>
  </data>
  <data type="filelists">
    <checksum type="sha256">1a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f809</checksum>
    <location href="repodata/filelists.xml.gz"/>
    <size>1024</size>
  </data>
  <data type="other">
    <checksum type="sha256">9f8e7d6c5b4a392817f6e5d4c3b2a19087f6e5d4c3b2a19087f6e5d4c3b2a190</checksum>
    <location href="repodata/other.xml.gz"/>
    <size>512</size>
  </data>
</repomd>
"#;

/// A decompressed `primary.xml` with the curl closure:
/// curl, libcurl, openssl-libs, zlib, all x86_64.
pub const PRIMARY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" xmlns:rpm="http://linux.duke.edu/metadata/rpm" packages="4">
<package type="rpm">
  <name>curl</name>
  <arch>x86_64</arch>
  <version epoch="0" ver="7.76.1" rel="29.el9"/>
  <checksum type="sha256" pkgid="YES">c1a7f3b9d2e8450fa6b3c9d8e7f2a1b0c9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f4</checksum>
  <summary>A utility for getting files from remote servers</summary>
  <size package="782560" installed="1605632"/>
  <location href="Packages/curl-7.76.1-29.el9.x86_64.rpm"/>
  <format>
    <rpm:license>MIT</rpm:license>
    <rpm:provides>
      <rpm:entry name="curl"/>
      <rpm:entry name="webclient"/>
    </rpm:provides>
    <rpm:requires>
      <rpm:entry name="libcurl" flags="GE" epoch="0" ver="7.76.1" rel="29.el9"/>
      <rpm:entry name="openssl-libs"/>
      <rpm:entry name="zlib"/>
      <rpm:entry name="rpmlib(CompressedFileNames)" flags="LE" epoch="0" ver="3.0.4" rel="1"/>
      <rpm:entry name="/bin/sh"/>
      <rpm:entry name="libc.so.6(GLIBC_2.34)(64bit)"/>
    </rpm:requires>
  </format>
</package>
<package type="rpm">
  <name>libcurl</name>
  <arch>x86_64</arch>
  <version epoch="0" ver="7.76.1" rel="29.el9"/>
  <checksum type="sha256" pkgid="YES">d2b8e4c0a3f9561eb7c4d0e9f8a3b2c1d0e9f8a7b6c5d4e3f2a1b0c9d8e7f6a5</checksum>
  <summary>A library for getting files from web servers</summary>
  <size package="305672" installed="700416"/>
  <location href="Packages/libcurl-7.76.1-29.el9.x86_64.rpm"/>
  <format>
    <rpm:license>MIT</rpm:license>
    <rpm:provides>
      <rpm:entry name="libcurl"/>
      <rpm:entry name="libcurl.so.4()(64bit)"/>
    </rpm:provides>
    <rpm:requires>
      <rpm:entry name="openssl-libs" flags="GE" epoch="1" ver="3.0.1"/>
      <rpm:entry name="zlib"/>
    </rpm:requires>
  </format>
</package>
<package type="rpm">
  <name>openssl-libs</name>
  <arch>x86_64</arch>
  <version epoch="1" ver="3.0.7" rel="27.el9"/>
  <checksum type="sha256" pkgid="YES">e3c9f5d1b4a0672fc8d5e1f0a9b4c3d2e1f0a9b8c7d6e5f4a3b2c1d0e9f8a7b6</checksum>
  <summary>A general purpose cryptography library with TLS implementation</summary>
  <size package="2197456" installed="6641664"/>
  <location href="Packages/openssl-libs-3.0.7-27.el9.x86_64.rpm"/>
  <format>
    <rpm:license>ASL 2.0</rpm:license>
    <rpm:provides>
      <rpm:entry name="openssl-libs"/>
      <rpm:entry name="libssl.so.3()(64bit)"/>
      <rpm:entry name="libcrypto.so.3()(64bit)"/>
    </rpm:provides>
    <rpm:requires>
      <rpm:entry name="zlib"/>
    </rpm:requires>
  </format>
</package>
<package type="rpm">
  <name>zlib</name>
  <arch>x86_64</arch>
  <version epoch="0" ver="1.2.11" rel="40.el9"/>
  <checksum type="sha256" pkgid="YES">f4d0a6e2c5b1783fd9e6f2a1b0c5d4e3f2a1b0c9d8e7f6a5b4c3d2e1f0a9b8c7</checksum>
  <summary>Compression and decompression library</summary>
  <size package="91784" installed="198656"/>
  <location href="Packages/zlib-1.2.11-40.el9.x86_64.rpm"/>
  <format>
    <rpm:license>zlib and Boost</rpm:license>
    <rpm:provides>
      <rpm:entry name="zlib"/>
      <rpm:entry name="libz.so.1()(64bit)"/>
    </rpm:provides>
    <rpm:requires>
    </rpm:requires>
  </format>
</package>
</metadata>
"#;

/// An APT `Release` file.
pub const RELEASE: &str = r#"Origin: Ubuntu
Label: Ubuntu
Suite: jammy
Codename: jammy
Date: Thu, 21 Apr 2022 17:16:08 UTC
Architectures: amd64 arm64
Components: main restricted
Description: Ubuntu Jammy 22.04
SHA256:
 a5c1b0d9e8f7263541c0b9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f4a3b2c1d0e9f8 1234567 main/binary-amd64/Packages
 b6d2c1e0f9a8374652d1c0e9f8a7b6c5d4e3f2a1b0c9d8e7f6a5b4c3d2e1f0a9  654321 main/binary-amd64/Packages.gz
"#;

/// An APT `Packages` file with the curl closure, a virtual-package
/// provider pair, and one arm64-only stanza.
pub const PACKAGES: &str = r#"Package: curl
Architecture: amd64
Version: 7.81.0-1ubuntu1.15
Depends: libcurl4 (= 7.81.0-1ubuntu1.15), libc6 (>= 2.34)
Recommends: ca-certificates
Suggests: curl-doc
Filename: pool/main/c/curl/curl_7.81.0-1ubuntu1.15_amd64.deb
Size: 194583
Installed-Size: 454
MD5sum: 0123456789abcdef0123456789abcdef
SHA256: c7e4a9b2d1f0583641a2b9c8d7e6f5a4b3c2d1e0f9a8b7c6d5e4f3a2b1c0d9e8
Description: command line tool for transferring data with URL syntax
 curl is a command line tool for transferring data with URL syntax.

Package: libcurl4
Architecture: amd64
Version: 7.81.0-1ubuntu1.15
Depends: libc6 (>= 2.34), libssl3 (>= 3.0.0~~alpha1)
Filename: pool/main/c/curl/libcurl4_7.81.0-1ubuntu1.15_amd64.deb
Size: 290167
Installed-Size: 790
SHA256: d8f5b0c3e2a1694752b3c0d9e8f7a6b5c4d3e2f1a0b9c8d7e6f5a4b3c2d1e0f9
Description: easy-to-use client-side URL transfer library

Package: libssl3
Architecture: amd64
Version: 3.0.2-0ubuntu1.12
Depends: libc6 (>= 2.34)
Filename: pool/main/o/openssl/libssl3_3.0.2-0ubuntu1.12_amd64.deb
Size: 1905632
Installed-Size: 5742
SHA256: e9a6c1d4f3b2705863c4d1e0f9a8b7c6d5e4f3a2b1c0d9e8f7a6b5c4d3e2f1a0
Description: Secure Sockets Layer toolkit - shared libraries

Package: libc6
Architecture: amd64
Version: 2.35-0ubuntu3.6
Filename: pool/main/g/glibc/libc6_2.35-0ubuntu3.6_amd64.deb
Size: 3235810
Installed-Size: 13597
SHA256: f0b7d2e5a4c3816974d5e2f1a0b9c8d7e6f5a4b3c2d1e0f9a8b7c6d5e4f3a2b1
Description: GNU C Library: Shared libraries

Package: postfix
Architecture: amd64
Version: 3.6.4-1ubuntu1.3
Depends: libc6 (>= 2.34), libssl3 (>= 3.0.0~~alpha1)
Provides: mail-transport-agent, default-mta
Conflicts: sendmail, exim4-daemon-light
Filename: pool/main/p/postfix/postfix_3.6.4-1ubuntu1.3_amd64.deb
Size: 1245880
Installed-Size: 4170
SHA256: a1c8e3f6b5d4927085e6f3a2b1c0d9e8f7a6b5c4d3e2f1a0b9c8d7e6f5a4b3c2
Description: High-performance mail transport agent

Package: exim4
Architecture: amd64
Version: 4.95-4ubuntu2.5
Depends: libc6 (>= 2.34)
Provides: mail-transport-agent
Filename: pool/main/e/exim4/exim4_4.95-4ubuntu2.5_amd64.deb
Size: 8820
Installed-Size: 76
SHA256: b2d9f4a7c6e5038196f7a4b3c2d1e0f9a8b7c6d5e4f3a2b1c0d9e8f7a6b5c4d3
Description: metapackage providing the Exim MTA

Package: arm-only-tool
Architecture: arm64
Version: 1.0-1
Filename: pool/main/a/arm-only-tool/arm-only-tool_1.0-1_arm64.deb
Size: 1000
Installed-Size: 10
SHA256: c3e0a5b8d7f6149207a8b5c4d3e2f1a0b9c8d7e6f5a4b3c2d1e0f9a8b7c6d5e4
Description: only published for arm64
"#;

/// An extracted `APKINDEX` with the curl closure for Alpine.
pub const APKINDEX: &str = r#"C:Q1MDEyMzQ1Njc4OTAxMjM0NTY3ODk=
P:curl
V:8.5.0-r0
A:x86_64
S:253456
I:548864
T:URL retrieval utility and library
L:curl
D:so:libc.musl-x86_64.so.1 so:libssl.so.3 so:libz.so.1
p:cmd:curl=8.5.0-r0

C:Q1OTg3NjU0MzIxMDk4NzY1NDMyMTA=
P:libssl3
V:3.1.4-r5
A:x86_64
S:562176
I:1339392
T:SSL shared libraries
L:Apache-2.0
D:so:libc.musl-x86_64.so.1
p:so:libssl.so.3=3

C:Q1YWJjZGVmZ2hpamtsbW5vcHFyc3Q=
P:musl
V:1.2.4_git20230717-r4
A:x86_64
S:407296
I:622592
T:the musl c library (libc) implementation
L:MIT
D:!libc6-compat
p:so:libc.musl-x86_64.so.1=1

C:Q1MDAwMDAwMDAwMDAwMDAwMDAwMDA=
P:zlib
V:1.3.1-r0
A:x86_64
S:107808
I:139264
T:A compression/decompression Library
L:Zlib
D:so:libc.musl-x86_64.so.1
p:so:libz.so.1=1
"#;

/// Gzip a byte slice.
#[must_use]
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("writing to Vec cannot fail");
    encoder.finish().expect("writing to Vec cannot fail")
}

/// Build a tar archive holding one regular file.
#[must_use]
pub fn tar_with(member: &str, data: &[u8]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, member, data)
        .expect("writing to Vec cannot fail");
    builder.into_inner().expect("writing to Vec cannot fail")
}

/// Build an `APKINDEX.tar.gz` the way Alpine mirrors publish it: a
/// signature gzip stream concatenated with the index gzip stream.
#[must_use]
pub fn apkindex_tar_gz() -> Vec<u8> {
    let mut container = gzip(&tar_with(".SIGN.RSA.alpine-devel@lists.alpinelinux.org-6165ee59.rsa.pub", b"signature"));
    container.extend(gzip(&tar_with("APKINDEX", APKINDEX.as_bytes())));
    container
}

/// Hex-encoded SHA-256 of a byte slice.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(data))
}
