//! Canonical forms for the `htm` and `htu` claims.

use url::Url;

use super::error::DpopError;

/// Normalize a target URL for `htu`.
///
/// - http/https only; scheme and host lowercase
/// - default ports (80/443) elided
/// - dot segments resolved, empty segments collapsed (so no trailing slash)
/// - empty path becomes "/"
/// - query and fragment dropped
pub fn normalize_htu(input: &str) -> Result<String, DpopError> {
    let url = Url::parse(input.trim()).map_err(|_| DpopError::MalformedUrl)?;

    let scheme = url.scheme().to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(DpopError::MalformedUrl);
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
        _ => return Err(DpopError::MalformedUrl),
    };

    let port = url
        .port()
        .filter(|p| !((scheme == "http" && *p == 80) || (scheme == "https" && *p == 443)));

    // The parser already resolved "." and ".." segments.
    let segments: Vec<&str> = url
        .path_segments()
        .ok_or(DpopError::MalformedUrl)?
        .filter(|s| !s.is_empty())
        .collect();

    let mut out = format!("{scheme}://{host}");
    if let Some(port) = port {
        out.push(':');
        out.push_str(&port.to_string());
    }
    out.push('/');
    out.push_str(&segments.join("/"));
    Ok(out)
}

/// Normalize an HTTP method for `htm`: trimmed, uppercase, an RFC 9110 token.
pub fn normalize_method(method: &str) -> Result<String, DpopError> {
    let method = method.trim();
    if method.is_empty() {
        return Err(DpopError::MissingField("method"));
    }
    if !method.bytes().all(is_tchar) {
        return Err(DpopError::MalformedMethod);
    }
    Ok(method.to_ascii_uppercase())
}

fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_scheme_and_host_and_strips_query_fragment_default_port() {
        let got = normalize_htu("HTTPS://EXAMPLE.com:443/Api/v1?q=1#frag").unwrap();
        assert_eq!(got, "https://example.com/Api/v1");
    }

    #[test]
    fn keeps_non_default_port() {
        let got = normalize_htu("http://localhost:3000/api/v1/secure-endpoint").unwrap();
        assert_eq!(got, "http://localhost:3000/api/v1/secure-endpoint");
    }

    #[test]
    fn empty_path_becomes_root() {
        assert_eq!(normalize_htu("https://example.com").unwrap(), "https://example.com/");
        assert_eq!(normalize_htu("https://example.com/").unwrap(), "https://example.com/");
    }

    #[test]
    fn resolves_dot_segments_and_collapses_slashes() {
        assert_eq!(normalize_htu("https://ex.com/a/./b/../c").unwrap(), "https://ex.com/a/c");
        assert_eq!(normalize_htu("https://ex.com//a///b/").unwrap(), "https://ex.com/a/b");
    }

    #[test]
    fn ipv6_hosts() {
        assert_eq!(
            normalize_htu("https://[2001:db8::1]:443/a").unwrap(),
            "https://[2001:db8::1]/a"
        );
        assert_eq!(
            normalize_htu("http://[2001:db8::1]:8080/a").unwrap(),
            "http://[2001:db8::1]:8080/a"
        );
    }

    #[test]
    fn rejects_non_http_and_relative() {
        assert_eq!(normalize_htu("ftp://example.com/a"), Err(DpopError::MalformedUrl));
        assert_eq!(normalize_htu("/api/v1/users"), Err(DpopError::MalformedUrl));
        assert_eq!(normalize_htu("https://"), Err(DpopError::MalformedUrl));
    }

    #[test]
    fn idempotent() {
        let once = normalize_htu("HTTP://Ex.COM:80/a/b/?x=1").unwrap();
        assert_eq!(normalize_htu(&once).unwrap(), once);
        assert_eq!(once, "http://ex.com/a/b");
    }

    #[test]
    fn preserves_path_case() {
        assert_eq!(
            normalize_htu("https://EX.com/Api/V1/Users").unwrap(),
            "https://ex.com/Api/V1/Users"
        );
    }

    #[test]
    fn methods_are_uppercased() {
        assert_eq!(normalize_method(" get ").unwrap(), "GET");
        assert_eq!(normalize_method("Post").unwrap(), "POST");
        assert_eq!(normalize_method("m-search").unwrap(), "M-SEARCH");
    }

    #[test]
    fn bad_methods() {
        assert_eq!(normalize_method("  "), Err(DpopError::MissingField("method")));
        assert_eq!(normalize_method("GE T"), Err(DpopError::MalformedMethod));
        assert_eq!(normalize_method("GE\rT"), Err(DpopError::MalformedMethod));
        assert_eq!(normalize_method("G(E)T"), Err(DpopError::MalformedMethod));
    }
}
