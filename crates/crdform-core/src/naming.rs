//! Field and resource type naming conventions
//!
//! Configuration keys are snake_case, manifest keys are lowerCamelCase and
//! resource type names are built from the CRD group, kind and version.

/// Convert an identifier to snake_case
///
/// Word boundaries are lowercase-to-uppercase transitions, the end of an
/// uppercase run followed by a lowercase letter, and any of `-`, `.`, `_`
/// or whitespace.
///
/// ```
/// use crdform_core::naming::snake_case;
///
/// assert_eq!(snake_case("PodNetworkChaos"), "pod_network_chaos");
/// assert_eq!(snake_case("CIDRBlock"), "cidr_block");
/// assert_eq!(snake_case("coreLimit"), "core_limit");
/// ```
pub fn snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '-' | '.' | '_') || c.is_whitespace() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }

        out.extend(c.to_lowercase());
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Convert an identifier to lowerCamelCase
///
/// ```
/// use crdform_core::naming::lower_camel;
///
/// assert_eq!(lower_camel("core_limit"), "coreLimit");
/// assert_eq!(lower_camel("CoreLimit"), "coreLimit");
/// assert_eq!(lower_camel("name"), "name");
/// ```
pub fn lower_camel(s: &str) -> String {
    let snake = snake_case(s);
    let mut out = String::with_capacity(snake.len());

    for (i, word) in snake.split('_').filter(|w| !w.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Build the resource type name for a CRD version
///
/// ```
/// use crdform_core::naming::resource_type_name;
///
/// assert_eq!(
///     resource_type_name("chaos-mesh.org", "PodNetworkChaos", "v1alpha1"),
///     "chaos_mesh_org_pod_network_chaos_v1alpha1"
/// );
/// ```
pub fn resource_type_name(group: &str, kind: &str, version: &str) -> String {
    let group = group.replace(['.', '-'], "_");
    let kind = snake_case(kind);
    if group.is_empty() {
        format!("{}_{}", kind, version)
    } else {
        format!("{}_{}_{}", group, kind, version)
    }
}

/// Whether a resource type name can be used as a registry key and state path
///
/// ```
/// use crdform_core::naming::is_valid_type_name;
///
/// assert!(is_valid_type_name("chaos_mesh_org_pod_network_chaos_v1alpha1"));
/// assert!(!is_valid_type_name("example.com/widget_v1"));
/// ```
pub fn is_valid_type_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Format `apiVersion` from a group and version (core group has no prefix)
pub fn api_version(group: &str, version: &str) -> String {
    if group.is_empty() {
        version.to_string()
    } else {
        format!("{}/{}", group, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("name"), "name");
        assert_eq!(snake_case("coreLimit"), "core_limit");
        assert_eq!(snake_case("CoreLimit"), "core_limit");
        assert_eq!(snake_case("core_limit"), "core_limit");
        assert_eq!(snake_case("podIPs"), "pod_i_ps");
        assert_eq!(snake_case("x-kubernetes-field"), "x_kubernetes_field");
        assert_eq!(snake_case("ipv6Enabled"), "ipv6_enabled");
        assert_eq!(snake_case("_leading"), "leading");
    }

    #[test]
    fn test_lower_camel() {
        assert_eq!(lower_camel("core_limit"), "coreLimit");
        assert_eq!(lower_camel("CoreLimit"), "coreLimit");
        assert_eq!(lower_camel("coreLimit"), "coreLimit");
        assert_eq!(lower_camel("api_version"), "apiVersion");
        assert_eq!(lower_camel("pod_i_ps"), "podIPs");
    }

    #[test]
    fn test_resource_type_name() {
        assert_eq!(
            resource_type_name("cert-manager.io", "ClusterIssuer", "v1"),
            "cert_manager_io_cluster_issuer_v1"
        );
        assert_eq!(resource_type_name("", "ConfigMap", "v1"), "config_map_v1");
    }

    #[test]
    fn test_is_valid_type_name() {
        assert!(is_valid_type_name("config_map_v1"));
        assert!(!is_valid_type_name(""));
        assert!(!is_valid_type_name(".."));
        assert!(!is_valid_type_name("a/b_v1"));
        assert!(!is_valid_type_name("Widget_v1"));
    }

    #[test]
    fn test_api_version() {
        assert_eq!(api_version("chaos-mesh.org", "v1alpha1"), "chaos-mesh.org/v1alpha1");
        assert_eq!(api_version("", "v1"), "v1");
    }
}
