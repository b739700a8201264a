//! HTTP digest access authentication (RFC 2617, MD5 / qop=auth) as spoken by
//! the access-control device. The device answers the first request with a 401
//! challenge; we reply with the computed Authorization header.

use std::collections::HashMap;

#[derive(Clone)]
pub struct DigestCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, PartialEq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub opaque: Option<String>,
    pub algorithm: Option<String>,
}

/// Split a challenge parameter list on commas, honouring quoted strings
/// (`qop="auth,auth-int"` must stay one parameter).
fn split_params(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

pub fn parse_challenge(header: &str) -> Option<DigestChallenge> {
    let rest = header.trim().strip_prefix("Digest ")?;

    let mut fields: HashMap<String, String> = HashMap::new();
    for param in split_params(rest) {
        let (key, value) = param.split_once('=')?;
        let value = value.trim().trim_matches('"').to_string();
        fields.insert(key.trim().to_ascii_lowercase(), value);
    }

    Some(DigestChallenge {
        realm: fields.get("realm")?.clone(),
        nonce: fields.get("nonce")?.clone(),
        qop: fields.get("qop").cloned(),
        opaque: fields.get("opaque").cloned(),
        algorithm: fields.get("algorithm").cloned(),
    })
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Compute the Authorization header value for one request.
///
/// `uri` is the request path + query exactly as sent on the request line.
pub fn authorization(
    creds: &DigestCredentials,
    challenge: &DigestChallenge,
    method: &str,
    uri: &str,
    cnonce: &str,
) -> String {
    let nc = "00000001";
    let ha1 = md5_hex(&format!(
        "{}:{}:{}",
        creds.username, challenge.realm, creds.password
    ));
    let ha2 = md5_hex(&format!("{}:{}", method, uri));

    // The device advertises qop="auth"; fall back to the legacy construction
    // when the challenge carries no qop at all.
    let (response, qop_used) = match challenge.qop.as_deref() {
        Some(qop) if qop.split(',').any(|q| q.trim() == "auth") => (
            md5_hex(&format!(
                "{}:{}:{}:{}:auth:{}",
                ha1, challenge.nonce, nc, cnonce, ha2
            )),
            true,
        ),
        _ => (md5_hex(&format!("{}:{}:{}", ha1, challenge.nonce, ha2)), false),
    };

    let mut header = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\"",
        creds.username, challenge.realm, challenge.nonce, uri, response
    );

    if qop_used {
        header.push_str(&format!(", qop=auth, nc={}, cnonce=\"{}\"", nc, cnonce));
    }
    if let Some(opaque) = &challenge.opaque {
        header.push_str(&format!(", opaque=\"{}\"", opaque));
    }
    if let Some(algorithm) = &challenge.algorithm {
        header.push_str(&format!(", algorithm={}", algorithm));
    }

    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_challenge_with_quoted_qop_list() {
        let challenge = parse_challenge(
            r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#,
        )
        .expect("should parse");

        assert_eq!(challenge.realm, "testrealm@host.com");
        assert_eq!(challenge.nonce, "dcd98b7102dd2f0e8b11d0f600bfb0c093");
        assert_eq!(challenge.qop.as_deref(), Some("auth,auth-int"));
        assert_eq!(
            challenge.opaque.as_deref(),
            Some("5ccc069c403ebaf9f0171e9517f40e41")
        );
    }

    #[test]
    fn non_digest_scheme_is_rejected() {
        assert!(parse_challenge("Basic realm=\"device\"").is_none());
    }

    #[test]
    fn computes_rfc2617_reference_response() {
        // Known-answer vector from RFC 2617 §3.5
        let creds = DigestCredentials {
            username: "Mufasa".into(),
            password: "Circle Of Life".into(),
        };
        let challenge = DigestChallenge {
            realm: "testrealm@host.com".into(),
            nonce: "dcd98b7102dd2f0e8b11d0f600bfb0c093".into(),
            qop: Some("auth,auth-int".into()),
            opaque: Some("5ccc069c403ebaf9f0171e9517f40e41".into()),
            algorithm: None,
        };

        let header = authorization(&creds, &challenge, "GET", "/dir/index.html", "0a4f113b");

        assert!(header.contains("response=\"6629fae49393a05397450978507c4ef1\""));
        assert!(header.contains("qop=auth"));
        assert!(header.contains("nc=00000001"));
    }

    #[test]
    fn legacy_challenge_without_qop_omits_nc() {
        let creds = DigestCredentials {
            username: "admin".into(),
            password: "secret".into(),
        };
        let challenge = DigestChallenge {
            realm: "device".into(),
            nonce: "abc".into(),
            qop: None,
            opaque: None,
            algorithm: None,
        };

        let header = authorization(&creds, &challenge, "POST", "/ISAPI/x", "zzz");
        assert!(!header.contains("nc="));
        assert!(!header.contains("qop"));
    }
}
