//! Kubernetes API version names recognized in generated file names.

/// Returns true if `segment` is a Kubernetes-style API version.
///
/// Recognized versions are `v1` through `v10` plus `v{1,2,3}alpha{1..5}` and
/// `v{1,2,3}beta{1..5}`.
pub fn is_known_api_version(segment: &str) -> bool {
    let Some(rest) = segment.strip_prefix('v') else {
        return false;
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (major, qualifier) = rest.split_at(digits_end);
    let Ok(major) = major.parse::<u32>() else {
        return false;
    };
    if major.to_string().len() != digits_end {
        return false;
    }
    if qualifier.is_empty() {
        return (1..=10).contains(&major);
    }
    if !(1..=3).contains(&major) {
        return false;
    }
    let minor = qualifier
        .strip_prefix("alpha")
        .or_else(|| qualifier.strip_prefix("beta"));
    matches!(minor, Some("1" | "2" | "3" | "4" | "5"))
}

/// Lists every known API version in canonical order.
pub fn known_api_versions() -> Vec<String> {
    let mut versions: Vec<String> = (1..=10).map(|major| format!("v{}", major)).collect();
    for stage in ["alpha", "beta"] {
        for major in 1..=3 {
            for minor in 1..=5 {
                versions.push(format!("v{}{}{}", major, stage, minor));
            }
        }
    }
    versions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_versions() {
        for v in ["v1", "v10", "v1alpha1", "v2beta5", "v3alpha3"] {
            assert!(is_known_api_version(v), "{}", v);
        }
        for v in ["v0", "v11", "v4alpha1", "v1alpha6", "v1gamma1", "1", "v01", "xv1", "v"] {
            assert!(!is_known_api_version(v), "{}", v);
        }
    }

    #[test]
    fn test_listing_agrees_with_predicate() {
        let all = known_api_versions();
        assert_eq!(all.len(), 40);
        assert!(all.iter().all(|v| is_known_api_version(v)));
    }
}
