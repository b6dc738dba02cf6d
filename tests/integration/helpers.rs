// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use leakrs::domain::models::fetch_result::DnsCacheEntry;
use leakrs::engines::traits::{DnsError, NameserverClient};
use std::net::IpAddr;
use tokio::net::TcpListener;

/// 任何查询都失败的DNS客户端，测试只依赖预置缓存
pub struct OfflineClient;

#[async_trait]
impl NameserverClient for OfflineClient {
    async fn query(&self, domain: &str, _nameserver: IpAddr) -> Result<IpAddr, DnsError> {
        Err(DnsError::NoRecords(domain.to_string()))
    }
}

pub const PHPINFO_PAGE: &str =
    "<html><head><title>phpinfo()</title></head><body>PHP Version 8.2.1</body></html>";

/// 主机名末尾数字为偶数的站点暴露 phpinfo
fn exposes_phpinfo(headers: &HeaderMap) -> bool {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .and_then(|host| host.split('.').next())
        .and_then(|label| label.chars().last())
        .and_then(|digit| digit.to_digit(10))
        .is_some_and(|digit| digit % 2 == 0)
}

/// 启动一个按 `Host` 头区分站点的本地服务器
pub async fn start_site() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let app = Router::new()
        .route(
            "/phpinfo.php",
            get(|headers: HeaderMap| async move {
                if exposes_phpinfo(&headers) {
                    PHPINFO_PAGE
                } else {
                    "ok"
                }
            }),
        )
        .route(
            "/old-info",
            get(|| async {
                (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/phpinfo.php")]).into_response()
            }),
        )
        .route(
            "/leave",
            get(|| async {
                (StatusCode::FOUND, [(header::LOCATION, "http://evil.test/phpinfo.php")]).into_response()
            }),
        )
        .route(
            "/not_found_page.html",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    "<html><body><h1>Page not found</h1></body></html>",
                )
            }),
        );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

/// 把主机名都解析到本机
pub fn loopback_cache(hosts: &[&str]) -> Vec<DnsCacheEntry> {
    hosts
        .iter()
        .map(|host| DnsCacheEntry {
            domain: host.to_string(),
            ip_address: "127.0.0.1".parse().unwrap(),
        })
        .collect()
}
