//! `www`: Stripe dashboard and documentation shortcuts.

use std::io::Write;

use subkit_billing::dashboard::{TARGETS, target_url};
use subkit_billing::{Billing, PaymentApi};

use crate::error::CommandError;
use crate::render;

/// `www [TARGET]`: list the targets, or open the page of `target`.
pub fn www<A: PaymentApi>(
    billing: &Billing<A>,
    target: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let Some(target) = target else {
        render::targets(out, TARGETS)?;
        return Ok(());
    };
    let url = target_url(target, billing.config().mode)
        .ok_or_else(|| CommandError::InvalidTarget(target.to_owned()))?;
    billing.open_link(&url)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use subkit_billing::Mode;
    use subkit_billing::testing::{self, MemoryApi, RecordingOpener};

    use super::*;

    #[test]
    fn test_lists_targets() {
        let billing = testing::billing(MemoryApi::new());
        let mut out = Vec::new();
        www(&billing, None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), TARGETS.len());
        assert!(text.starts_with("doc-api       : API documentation.\n"));
    }

    #[test]
    fn test_opens_mode_specific_page() {
        let opener = RecordingOpener::default();
        let billing = testing::billing(MemoryApi::new()).with_opener(opener.clone());
        www(&billing, Some("customers"), &mut Vec::new()).unwrap();

        let mut config = testing::config();
        config.mode = Mode::Live;
        let live = testing::billing_with_config(MemoryApi::new(), config).with_opener(opener.clone());
        www(&live, Some("customers"), &mut Vec::new()).unwrap();

        assert_eq!(
            opener.urls(),
            [
                "https://dashboard.stripe.com/test/customers",
                "https://dashboard.stripe.com/customers",
            ]
        );
    }

    #[test]
    fn test_unknown_target() {
        let billing = testing::billing(MemoryApi::new());
        let err = www(&billing, Some("nope"), &mut Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: nope");
    }
}
