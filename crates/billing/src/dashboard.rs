//! Stripe dashboard and documentation shortcuts.

use crate::config::Mode;

/// A named page the `www` command can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub name: &'static str,
    pub description: &'static str,
}

/// Every known target, in display order.
pub const TARGETS: &[Target] = &[
    Target { name: "doc-api", description: "API documentation." },
    Target { name: "doc-testing", description: "Fake testing user account doc." },
    Target { name: "dashboard", description: "Show graphs." },
    Target { name: "customers", description: "Show customers." },
    Target { name: "api-keys", description: "Open API key configuration place." },
    Target { name: "api-keys-test", description: "Open API key configuration place (Testing)." },
    Target { name: "webhooks", description: "Open STRIPE webhooks page." },
    Target { name: "cfg-invoice", description: "Set the company NIF." },
    Target { name: "cfg-branding", description: "Set the company colors etc." },
    Target { name: "cfg-profile", description: "Set the language, ..." },
    Target { name: "cfg-team", description: "Team members, etc." },
];

const DASHBOARD: &str = "https://dashboard.stripe.com";

/// URL of `target`, or `None` for unknown names.
///
/// `customers` and `api-keys` point at the test-mode pages unless `mode` is
/// live.
#[must_use]
pub fn target_url(target: &str, mode: Mode) -> Option<String> {
    let test = if mode.is_live() { "" } else { "/test" };
    let url = match target {
        "doc-api" => "https://stripe.com/docs/api".to_owned(),
        "doc-testing" => "https://stripe.com/docs/testing".to_owned(),
        "dashboard" => format!("{DASHBOARD}/login"),
        "customers" => format!("{DASHBOARD}{test}/customers"),
        "api-keys" => format!("{DASHBOARD}{test}/apikeys"),
        "api-keys-test" => format!("{DASHBOARD}/test/apikeys"),
        "webhooks" => format!("{DASHBOARD}/webhooks"),
        "cfg-invoice" => format!("{DASHBOARD}/settings/billing/invoice"),
        "cfg-branding" => format!("{DASHBOARD}/settings/branding"),
        "cfg-profile" => format!("{DASHBOARD}/settings/user"),
        "cfg-team" => format!("{DASHBOARD}/settings/team"),
        _ => return None,
    };
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_dependent_targets() {
        assert_eq!(
            target_url("customers", Mode::Live).as_deref(),
            Some("https://dashboard.stripe.com/customers")
        );
        assert_eq!(
            target_url("customers", Mode::Test).as_deref(),
            Some("https://dashboard.stripe.com/test/customers")
        );
        assert_eq!(
            target_url("api-keys", Mode::Test).as_deref(),
            Some("https://dashboard.stripe.com/test/apikeys")
        );
        assert_eq!(
            target_url("api-keys-test", Mode::Live).as_deref(),
            Some("https://dashboard.stripe.com/test/apikeys")
        );
    }

    #[test]
    fn test_every_listed_target_resolves() {
        for target in TARGETS {
            assert!(target_url(target.name, Mode::Live).is_some(), "{}", target.name);
        }
        assert_eq!(target_url("nope", Mode::Live), None);
    }
}
