// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::net::IpAddr;
use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 去掉主机名开头的 `www.`
fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// 判断两个URL是否属于同一站点
///
/// 只比较主机名（忽略开头的 `www.`），协议和端口的变化不算跨站
pub fn is_same_site(current: &Url, target: &Url) -> bool {
    match (current.host_str(), target.host_str()) {
        (Some(a), Some(b)) => bare_host(&a.to_lowercase()) == bare_host(&b.to_lowercase()),
        _ => false,
    }
}

/// 返回 `scheme://host[:port]` 形式的源
pub fn origin_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

/// 域名对应的404基线键
///
/// 能解析为URL时取其源，否则原样返回
pub fn baseline_key(domain: &str) -> String {
    match Url::parse(domain) {
        Ok(url) if url.has_host() => origin_of(&url),
        _ => domain.trim_end_matches('/').to_string(),
    }
}

/// 为缺少协议的域名补上协议
pub fn ensure_scheme(domain: &str, scheme: &str) -> String {
    if domain.contains("://") {
        domain.to_string()
    } else {
        format!("{}://{}", scheme, domain)
    }
}

/// 拼接域名与端点路径
pub fn compose_url(domain: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        domain.trim_end_matches('/'),
        endpoint.trim_matches('/')
    )
}

/// 用IP替换URL中的主机名，端口和路径保持不变
pub fn with_ip(url: &Url, ip: IpAddr) -> Result<Url, ParseError> {
    let mut pinned = url.clone();
    pinned
        .set_ip_host(ip)
        .map_err(|_| ParseError::SetHostOnCannotBeABaseUrl)?;
    Ok(pinned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute_url() {
        let base = Url::parse("http://example.com/a/b").unwrap();
        assert_eq!(
            resolve_url(&base, "http://t.co/c").unwrap().as_str(),
            "http://t.co/c"
        );
    }

    #[test]
    fn test_resolve_root_relative_url() {
        let base = Url::parse("http://example.com/a/b").unwrap();
        assert_eq!(
            resolve_url(&base, "/c").unwrap().as_str(),
            "http://example.com/c"
        );
    }

    #[test]
    fn test_resolve_relative_url() {
        let base = Url::parse("http://example.com/a/b").unwrap();
        assert_eq!(
            resolve_url(&base, "c").unwrap().as_str(),
            "http://example.com/a/c"
        );
    }

    #[test]
    fn test_same_site_ignores_www_and_scheme() {
        let a = Url::parse("https://a.com/x").unwrap();
        assert!(is_same_site(&a, &Url::parse("https://www.a.com/y").unwrap()));
        assert!(is_same_site(&a, &Url::parse("http://a.com:8080/").unwrap()));
        assert!(!is_same_site(&a, &Url::parse("https://evil.com/y").unwrap()));
        assert!(!is_same_site(&a, &Url::parse("https://a.com.evil.com/").unwrap()));
    }

    #[test]
    fn test_origin_keeps_port() {
        let url = Url::parse("http://a.com:8080/x/y").unwrap();
        assert_eq!(origin_of(&url), "http://a.com:8080");
        let url = Url::parse("https://a.com/x").unwrap();
        assert_eq!(origin_of(&url), "https://a.com");
    }

    #[test]
    fn test_baseline_key() {
        assert_eq!(baseline_key("https://a.com/"), "https://a.com");
        assert_eq!(baseline_key("http://a.com:8080"), "http://a.com:8080");
        assert_eq!(baseline_key("a.com/"), "a.com");
    }

    #[test]
    fn test_compose_url_trims_slashes() {
        assert_eq!(compose_url("https://a.com/", "/.git/config/"), "https://a.com/.git/config");
        assert_eq!(compose_url("https://a.com", "phpinfo.php"), "https://a.com/phpinfo.php");
    }

    #[test]
    fn test_ensure_scheme() {
        assert_eq!(ensure_scheme("a.com", "https"), "https://a.com");
        assert_eq!(ensure_scheme("http://a.com", "https"), "http://a.com");
    }

    #[test]
    fn test_with_ip_preserves_port_and_path() {
        let url = Url::parse("http://a.com:8080/x?q=1").unwrap();
        let pinned = with_ip(&url, "127.0.0.1".parse().unwrap()).unwrap();
        assert_eq!(pinned.as_str(), "http://127.0.0.1:8080/x?q=1");
    }
}
