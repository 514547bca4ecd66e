//! Family-specific version total orders.
//!
//! None of the three families uses semver. Each defines its own grammar and
//! comparison rules:
//!
//! - RPM: `[epoch:]version[-release]` (EVR), parts split on `.` and `-`,
//!   numeric when both sides parse as integers
//! - Debian: `[epoch:]upstream[-revision]`, alternating digit / non-digit
//!   runs, with `~` sorting before everything including the empty string
//! - APK: `main[-rN]`, parts split on `.` and `_`, revision breaks ties
//!
//! Comparators are total: any two strings compare, however malformed.

use crate::package::DepOperator;
use std::cmp::Ordering;

/// Compare two RPM EVR strings (`[epoch:]version[-release]`).
#[must_use]
pub fn rpm_cmp(a: &str, b: &str) -> Ordering {
    let a = Evr::parse(a);
    let b = Evr::parse(b);

    a.epoch
        .cmp(&b.epoch)
        .then_with(|| rpm_part_cmp(a.version, b.version))
        .then_with(|| match (a.release, b.release) {
            (Some(ra), Some(rb)) => rpm_part_cmp(ra, rb),
            // A constraint without a release matches any release of the
            // same version, so absence compares equal here.
            _ => Ordering::Equal,
        })
}

/// Compare two Debian version strings (`[epoch:]upstream[-revision]`).
#[must_use]
pub fn deb_cmp(a: &str, b: &str) -> Ordering {
    let a = DebVersion::parse(a);
    let b = DebVersion::parse(b);

    a.epoch
        .cmp(&b.epoch)
        .then_with(|| deb_part_cmp(a.upstream, b.upstream))
        .then_with(|| deb_part_cmp(a.revision.unwrap_or(""), b.revision.unwrap_or("")))
}

/// Compare two APK version strings (`main[-rN]`).
#[must_use]
pub fn apk_cmp(a: &str, b: &str) -> Ordering {
    let (a_main, a_rev) = split_apk_revision(a);
    let (b_main, b_rev) = split_apk_revision(b);

    apk_main_cmp(a_main, b_main).then_with(|| a_rev.cmp(&b_rev))
}

/// Apply a dependency operator on the given family order.
///
/// `<<`/`>>` are the strict Debian forms; after the comparator has run they
/// behave exactly like `<`/`>`.
#[must_use]
pub fn matches(cmp: fn(&str, &str) -> Ordering, candidate: &str, op: DepOperator, required: &str) -> bool {
    let ordering = cmp(candidate, required);
    match op {
        DepOperator::Eq => ordering == Ordering::Equal,
        DepOperator::Lt | DepOperator::StrictLt => ordering == Ordering::Less,
        DepOperator::Gt | DepOperator::StrictGt => ordering == Ordering::Greater,
        DepOperator::Le => ordering != Ordering::Greater,
        DepOperator::Ge => ordering != Ordering::Less,
    }
}

/// Parsed RPM EVR.
#[derive(Debug, Clone, Copy)]
struct Evr<'a> {
    epoch: u64,
    version: &'a str,
    release: Option<&'a str>,
}

impl<'a> Evr<'a> {
    fn parse(s: &'a str) -> Self {
        let (epoch, rest) = split_epoch(s);
        // release is everything after the last '-'
        let (version, release) = match rest.rsplit_once('-') {
            Some((v, r)) if !v.is_empty() => (v, Some(r)),
            _ => (rest, None),
        };
        Self {
            epoch,
            version,
            release,
        }
    }
}

/// Parsed Debian version.
#[derive(Debug, Clone, Copy)]
struct DebVersion<'a> {
    epoch: u64,
    upstream: &'a str,
    revision: Option<&'a str>,
}

impl<'a> DebVersion<'a> {
    fn parse(s: &'a str) -> Self {
        let (epoch, rest) = split_epoch(s);
        let (upstream, revision) = match rest.rsplit_once('-') {
            Some((u, r)) if !u.is_empty() => (u, Some(r)),
            _ => (rest, None),
        };
        Self {
            epoch,
            upstream,
            revision,
        }
    }
}

fn split_epoch(s: &str) -> (u64, &str) {
    match s.split_once(':') {
        Some((e, rest)) => match e.parse::<u64>() {
            Ok(epoch) => (epoch, rest),
            Err(_) => (0, s),
        },
        None => (0, s),
    }
}

/// RPM part comparison: split on `.` and `-`, compare pairwise, numeric
/// when both sides are integers, lexicographic otherwise. A longer version
/// with an equal prefix sorts higher.
fn rpm_part_cmp(a: &str, b: &str) -> Ordering {
    let a_parts: Vec<&str> = a.split(['.', '-']).collect();
    let b_parts: Vec<&str> = b.split(['.', '-']).collect();

    for (pa, pb) in a_parts.iter().zip(&b_parts) {
        let ord = match (pa.parse::<u64>(), pb.parse::<u64>()) {
            (Ok(na), Ok(nb)) => na.cmp(&nb),
            _ => pa.cmp(pb),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a_parts.len().cmp(&b_parts.len())
}

/// Debian part comparison: alternating non-digit / digit runs. Digit runs
/// compare numerically; non-digit runs compare bytewise with `~` ranked
/// below everything, including running out of string.
fn deb_part_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.as_bytes();
    let mut b = b.as_bytes();

    loop {
        // non-digit run
        let a_nd = take_while(&mut a, |c| !c.is_ascii_digit());
        let b_nd = take_while(&mut b, |c| !c.is_ascii_digit());
        let ord = deb_nondigit_cmp(a_nd, b_nd);
        if ord != Ordering::Equal {
            return ord;
        }

        // digit run
        let a_d = take_while(&mut a, u8::is_ascii_digit);
        let b_d = take_while(&mut b, u8::is_ascii_digit);
        let ord = deb_digit_cmp(a_d, b_d);
        if ord != Ordering::Equal {
            return ord;
        }

        if a.is_empty() && b.is_empty() {
            return Ordering::Equal;
        }
    }
}

fn take_while<'a>(s: &mut &'a [u8], pred: impl Fn(&u8) -> bool) -> &'a [u8] {
    let end = s.iter().position(|c| !pred(c)).unwrap_or(s.len());
    let (run, rest) = s.split_at(end);
    *s = rest;
    run
}

fn deb_nondigit_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let max = a.len().max(b.len());
    for i in 0..max {
        let ra = deb_char_rank(a.get(i).copied());
        let rb = deb_char_rank(b.get(i).copied());
        let ord = ra.cmp(&rb);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// `~` sorts before end-of-string, which sorts before any other byte.
fn deb_char_rank(c: Option<u8>) -> i32 {
    match c {
        Some(b'~') => -1,
        None => 0,
        Some(c) => i32::from(c) + 1,
    }
}

fn deb_digit_cmp(a: &[u8], b: &[u8]) -> Ordering {
    // strip leading zeros, then longer run wins, then bytewise
    let a = strip_leading_zeros(a);
    let b = strip_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn strip_leading_zeros(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&c| c != b'0').unwrap_or(s.len());
    &s[start..]
}

/// Split an APK version into main part and `-rN` revision.
fn split_apk_revision(s: &str) -> (&str, u64) {
    if let Some((main, rev)) = s.rsplit_once("-r") {
        if let Ok(n) = rev.parse::<u64>() {
            return (main, n);
        }
    }
    (s, 0)
}

/// APK main-part comparison: split on `.` and `_`, numeric when possible.
fn apk_main_cmp(a: &str, b: &str) -> Ordering {
    let a_parts: Vec<&str> = a.split(['.', '_']).collect();
    let b_parts: Vec<&str> = b.split(['.', '_']).collect();

    for (pa, pb) in a_parts.iter().zip(&b_parts) {
        let ord = match (pa.parse::<u64>(), pb.parse::<u64>()) {
            (Ok(na), Ok(nb)) => na.cmp(&nb),
            _ => pa.cmp(pb),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a_parts.len().cmp(&b_parts.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpm_epoch_dominates() {
        assert_eq!(rpm_cmp("1:2.0.0-1.el7", "2.4.6-45.el7"), Ordering::Greater);
    }

    #[test]
    fn rpm_equal_evr() {
        assert_eq!(rpm_cmp("2.4.6-45.el7", "2.4.6-45.el7"), Ordering::Equal);
    }

    #[test]
    fn rpm_version_before_release() {
        assert_eq!(rpm_cmp("2.4.7-1.el7", "2.4.6-45.el7"), Ordering::Greater);
        assert_eq!(rpm_cmp("2.4.6-46.el7", "2.4.6-45.el7"), Ordering::Greater);
    }

    #[test]
    fn rpm_missing_release_matches_any() {
        assert_eq!(rpm_cmp("2.4.6", "2.4.6-45.el7"), Ordering::Equal);
    }

    #[test]
    fn rpm_numeric_beats_lexicographic() {
        assert_eq!(rpm_cmp("1.10", "1.9"), Ordering::Greater);
    }

    #[test]
    fn deb_revision_orders() {
        assert_eq!(deb_cmp("1.2.3-2", "1.2.3-1"), Ordering::Greater);
    }

    #[test]
    fn deb_epoch_dominates() {
        assert_eq!(deb_cmp("1:1.0.0-1", "2.0.0-1"), Ordering::Greater);
    }

    #[test]
    fn deb_tilde_sorts_before_absence() {
        assert_eq!(deb_cmp("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(deb_cmp("1.0~rc1", "1.0~rc2"), Ordering::Less);
        assert_eq!(deb_cmp("1.0", "1.0a"), Ordering::Less);
    }

    #[test]
    fn deb_digit_runs_numeric() {
        assert_eq!(deb_cmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(deb_cmp("1.01", "1.1"), Ordering::Equal);
    }

    #[test]
    fn apk_revision_breaks_ties() {
        assert_eq!(apk_cmp("1.2.3-r1", "1.2.3-r0"), Ordering::Greater);
    }

    #[test]
    fn apk_main_dominates_revision() {
        assert_eq!(apk_cmp("1.3.0-r0", "1.2.3-r5"), Ordering::Greater);
    }

    #[test]
    fn apk_underscore_parts() {
        assert_eq!(apk_cmp("1.2_p1-r0", "1.2-r0"), Ordering::Greater);
    }

    #[test]
    fn operator_application() {
        assert!(matches(rpm_cmp, "1:2.0.0-1.el7", DepOperator::Gt, "2.4.6-45.el7"));
        assert!(matches(rpm_cmp, "2.4.6-45.el7", DepOperator::Eq, "2.4.6-45.el7"));
        assert!(matches(deb_cmp, "1.2.3-2", DepOperator::StrictGt, "1.2.3-1"));
        assert!(matches(deb_cmp, "1.0~rc1", DepOperator::StrictLt, "1.0"));
        assert!(matches(apk_cmp, "1.2.3-r1", DepOperator::Ge, "1.2.3-r1"));
        assert!(!matches(apk_cmp, "1.2.3-r0", DepOperator::Gt, "1.2.3-r0"));
    }
}
