//! Command implementations.

use courier_proxy::{HttpMethod, ProxyConfig, ProxyEngine, ProxyRequest};
use courier_sync_server::TokenValidator;
use uuid::Uuid;

/// Executes one proxied request. Exit codes: 0 success, 1 the request
/// reached the network and failed, 2 the request was malformed.
pub async fn send(
    url: String,
    method: String,
    headers: Vec<String>,
    data: Option<String>,
    timeout_ms: u64,
    json: bool,
) -> i32 {
    let method: HttpMethod = match method.parse() {
        Ok(method) => method,
        Err(error) => {
            eprintln!("error: {error}");
            return 2;
        }
    };

    let mut request = ProxyRequest::new(method, url).with_timeout_ms(timeout_ms);
    for header in &headers {
        let Some((name, value)) = header.split_once(':') else {
            eprintln!("error: malformed header {header:?}, expected `Name: value`");
            return 2;
        };
        request = request.with_header(name.trim(), value.trim());
    }
    if let Some(body) = data {
        request = request.with_body(body);
    }

    let engine = match ProxyEngine::new(ProxyConfig::default()) {
        Ok(engine) => engine,
        Err(error) => {
            eprintln!("error: {error}");
            return 2;
        }
    };

    let result = match engine.handle(request).await {
        Ok(result) => result,
        Err(error) => {
            eprintln!("error: {error}");
            return 2;
        }
    };

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{text}"),
            Err(error) => {
                eprintln!("error: {error}");
                return 2;
            }
        }
        return if result.is_error() { 1 } else { 0 };
    }

    match &result.error {
        Some(failure) => {
            eprintln!(
                "{}: {} ({} ms)",
                failure.kind, failure.message, result.timing.total_ms
            );
            1
        }
        None => {
            let first_byte = result
                .timing
                .first_byte_ms
                .map(|ms| format!(", {ms} ms first byte"))
                .unwrap_or_default();
            println!(
                "HTTP {} {} ({} ms total{first_byte})",
                result.status, result.status_text, result.timing.total_ms
            );
            for (name, value) in &result.headers {
                println!("{name}: {value}");
            }
            if result.body_truncated {
                println!(
                    "(body truncated: showing {} of {} bytes)",
                    result.body.len(),
                    result.size
                );
            }
            if !result.body.is_empty() {
                println!();
                println!("{}", result.body);
            }
            0
        }
    }
}

/// Issues the opaque sync credential for a project.
pub fn token(project_id: String, secret: String) -> i32 {
    let project_id = match Uuid::parse_str(&project_id) {
        Ok(id) => id,
        Err(error) => {
            eprintln!("error: invalid project id: {error}");
            return 2;
        }
    };

    let validator = TokenValidator::new(secret.into_bytes());
    println!("{}", validator.issue(project_id));
    0
}
