//! Go identifier and path naming.

/// Converts an arbitrary name into an exported Go identifier.
///
/// The name is split on every non-alphanumeric character and each part is
/// capitalized. A leading digit gets an `N` prefix.
pub fn type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for part in name.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'N');
    }
    out
}

/// Returns the short Go name of a dotted component name.
///
/// `io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta` becomes `ObjectMeta`
/// and `platform.acme.co.v1alpha1.XBucket` becomes `XBucket`. Names without
/// a dot are only converted.
pub fn fix_name(name: &str) -> String {
    let full = type_name(name);
    let Some(dot) = name.rfind('.') else {
        return full;
    };
    let prefix = type_name(&name[..dot]);
    match full.strip_prefix(prefix.as_str()) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => full,
    }
}

/// Returns `base` if `taken` rejects it, else `base` with the first free
/// numeric suffix starting at 2.
pub fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Path of the Go file for a kind: `models/<reversed group>/<version>/<kind>.go`.
pub fn schema_path(group: &str, kind: &str, version: &str) -> String {
    let mut parts: Vec<&str> = group.split('.').filter(|p| !p.is_empty()).collect();
    parts.reverse();
    format!(
        "models/{}/{}/{}.go",
        parts.join("/"),
        version,
        kind.to_lowercase()
    )
}
