use reqwest::Method;

/// Sensitive sub-trees audited regardless of HTTP method.
pub(crate) const DEFAULT_SENSITIVE_PREFIXES: &[&str] = &["/api/incidents", "/api/identity-checks"];

/// Whether an action must produce an audit entry: any non-read method, or
/// any path under a sensitive prefix regardless of method.
pub(crate) fn is_critical(method: &Method, path: &str, sensitive_prefixes: &[String]) -> bool {
    let read_only = matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS);
    !read_only || sensitive_prefixes.iter().any(|p| path.starts_with(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Vec<String> {
        DEFAULT_SENSITIVE_PREFIXES
            .iter()
            .map(|p| (*p).to_owned())
            .collect()
    }

    #[test]
    fn mutating_methods_are_critical() {
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(is_critical(&method, "/api/bookings", &prefixes()), "{method}");
        }
    }

    #[test]
    fn plain_reads_are_not_critical() {
        assert!(!is_critical(&Method::GET, "/api/bookings", &prefixes()));
        assert!(!is_critical(&Method::HEAD, "/api/bookings", &prefixes()));
        assert!(!is_critical(&Method::OPTIONS, "/api/bookings", &prefixes()));
    }

    #[test]
    fn sensitive_subtrees_are_critical_even_for_reads() {
        assert!(is_critical(&Method::GET, "/api/incidents/42", &prefixes()));
        assert!(is_critical(&Method::GET, "/api/identity-checks/9", &prefixes()));
    }
}
