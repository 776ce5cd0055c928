//! Frontend bypass: lets first-party browser traffic through without an
//! Access-Key.
//!
//! This is a header heuristic, not a credential. Origin, Referer and
//! User-Agent are all caller controlled, so anything that can craft raw HTTP
//! requests can satisfy these rules. Enable it only on services whose
//! browser-facing routes would be exposed to the same callers anyway; the
//! Access-Key remains the only real service-to-service check.

use axum::http::HeaderMap;

/// User-Agent fragments treated as "a browser".
pub const BROWSER_AGENT_TOKENS: &[&str] = &[
    "Mozilla/", "Chrome/", "Safari/", "Firefox/", "Edg/", "OPR/",
];

#[derive(Debug, Clone, Default)]
pub struct FrontendPolicy {
    pub enabled: bool,
    /// Exact `Origin` values.
    pub allowed_origins: Vec<String>,
    /// Substrings searched for in `Referer`.
    pub allowed_referers: Vec<String>,
    /// When origins are configured and none match, deny without trying the
    /// referer and user-agent rules.
    pub require_origin: bool,
    pub trust_browser_agent: bool,
    pub header_name: Option<String>,
    pub header_value: Option<String>,
}

/// The rule that exempted a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassRule {
    Header,
    Origin,
    Referer,
    BrowserAgent,
}

impl FrontendPolicy {
    pub fn is_exempt(&self, headers: &HeaderMap) -> bool {
        self.evaluate(headers).is_some()
    }

    /// Returns the rule that exempts this request, if any. Always `None`
    /// when the policy is disabled.
    pub fn evaluate(&self, headers: &HeaderMap) -> Option<BypassRule> {
        if !self.enabled {
            return None;
        }

        // An override header is authoritative when configured.
        if let Some(name) = self.header_name.as_deref() {
            let value = headers.get(name)?.to_str().ok()?;
            return match self.header_value.as_deref() {
                Some(expected) if value != expected => None,
                _ => Some(BypassRule::Header),
            };
        }

        if !self.allowed_origins.is_empty() {
            if let Some(origin) = header_str(headers, "origin") {
                if self.allowed_origins.iter().any(|o| o == origin) {
                    return Some(BypassRule::Origin);
                }
            }
            if self.require_origin {
                return None;
            }
        }

        if !self.allowed_referers.is_empty() {
            if let Some(referer) = header_str(headers, "referer") {
                if self
                    .allowed_referers
                    .iter()
                    .any(|r| referer.contains(r.as_str()))
                {
                    return Some(BypassRule::Referer);
                }
            }
        }

        if self.trust_browser_agent {
            if let Some(agent) = header_str(headers, "user-agent") {
                if BROWSER_AGENT_TOKENS.iter().any(|t| agent.contains(t)) {
                    return Some(BypassRule::BrowserAgent);
                }
            }
        }

        None
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
