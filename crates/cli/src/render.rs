//! Terminal output formats.

use std::io::{self, Write};

use subkit_billing::dashboard::Target;
use subkit_billing::stripe::{CheckoutSession, Customer, Product, TaxRate};

/// `{id:<20} {email:<25} {status:<10} lang={lang:<4}`.
pub fn user_line(out: &mut impl Write, user: &Customer) -> io::Result<()> {
    writeln!(
        out,
        "{:<20} {:<25} {:<10} lang={:<4}",
        user.id,
        user.email_str(),
        user.status().as_str(),
        user.language()
    )
}

/// One `Label: value` line per field, empty fields omitted, then a blank
/// line.
pub fn user_record(out: &mut impl Write, user: &Customer) -> io::Result<()> {
    fn field(out: &mut impl Write, label: &str, value: Option<&str>) -> io::Result<()> {
        match value {
            Some(value) if !value.is_empty() => writeln!(out, "{label}: {value}"),
            _ => Ok(()),
        }
    }

    writeln!(out, "ID: {}", user.id)?;
    writeln!(out, "Verified: {}", user.status())?;
    field(out, "Hash1", user.hash1())?;
    for tax_id in user.tax_id_list() {
        writeln!(out, "TaxType: {}", tax_id.kind)?;
        writeln!(out, "TaxID: {}", tax_id.value)?;
    }
    field(out, "Name", user.name.as_deref())?;
    field(out, "Email", user.email.as_deref())?;
    field(out, "Ecode", user.ecode())?;
    field(out, "Phone", user.phone.as_deref())?;
    field(out, "Description", user.description.as_deref())?;
    if let Some(address) = &user.address {
        field(out, "City", address.city.as_deref())?;
        field(out, "Country", address.country.as_deref())?;
        field(out, "Addr1", address.line1.as_deref())?;
        field(out, "Addr2", address.line2.as_deref())?;
        field(out, "Zipcode", address.postal_code.as_deref())?;
        field(out, "State", address.state.as_deref())?;
    }
    writeln!(out)
}

/// The customer resource as the API returned it.
pub fn user_json(out: &mut impl Write, user: &Customer) -> io::Result<()> {
    serde_json::to_writer(&mut *out, user)?;
    writeln!(out)
}

/// `{id:<20}[ p={price:<30}][ i={amount}{currency}[,{n},{interval}]] n={name}`.
pub fn product_line(out: &mut impl Write, product: &Product) -> io::Result<()> {
    write!(out, "{:<20}", product.id)?;
    if let Some(price) = &product.default_price {
        write!(out, " p={:<30}", price.id())?;
        if let Some(money) = price.as_object().and_then(|price| price.money()) {
            write!(out, " i={money}")?;
            if let Some(recurring) = price.as_object().and_then(|price| price.recurring.as_ref()) {
                write!(out, ",{},{}", recurring.interval_count, recurring.interval)?;
            }
        }
    }
    writeln!(out, " n={}", product.name)
}

/// `{id} {jurisdiction} {display_name} {percentage:.6} active={bool}`.
pub fn tax_line(out: &mut impl Write, rate: &TaxRate) -> io::Result<()> {
    writeln!(
        out,
        "{} {} {} {:.6} active={}",
        rate.id,
        rate.jurisdiction.as_deref().unwrap_or_default(),
        rate.display_name,
        rate.percentage,
        rate.active
    )
}

/// `ID: ...` and `URL: ...`.
pub fn session_record(out: &mut impl Write, session: &CheckoutSession) -> io::Result<()> {
    writeln!(out, "ID: {}", session.id)?;
    writeln!(out, "URL: {}", session.url.as_deref().unwrap_or_default())
}

/// The `www` target table.
pub fn targets(out: &mut impl Write, targets: &[Target]) -> io::Result<()> {
    for target in targets {
        writeln!(out, "{:<13} : {}", target.name, target.description)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use subkit_billing::testing;

    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn sample_user() -> Customer {
        serde_json::from_value(json!({
            "id": "cus_1",
            "email": "ana@example.com",
            "name": "Ana",
            "phone": "",
            "metadata": {"status": "verified", "hash1": "$1$pstripe$h", "ecode": "c0de"},
            "preferred_locales": ["es"],
            "address": {"city": "Bilbao", "country": "ES", "line1": null, "postal_code": "48001"},
            "tax_ids": {"object": "list", "data": [{"id": "txi_1", "type": "es_cif", "value": "B1"}]}
        }))
        .unwrap()
    }

    #[test]
    fn test_user_line() {
        let line = render(|out| user_line(out, &sample_user()));
        assert_eq!(
            line,
            "cus_1                ana@example.com           verified   lang=es  \n"
        );
    }

    #[test]
    fn test_user_record() {
        let record = render(|out| user_record(out, &sample_user()));
        assert_eq!(
            record,
            "ID: cus_1\n\
             Verified: verified\n\
             Hash1: $1$pstripe$h\n\
             TaxType: es_cif\n\
             TaxID: B1\n\
             Name: Ana\n\
             Email: ana@example.com\n\
             Ecode: c0de\n\
             City: Bilbao\n\
             Country: ES\n\
             Zipcode: 48001\n\
             \n"
        );
    }

    #[test]
    fn test_user_json_keeps_fields() {
        let text = render(|out| user_json(out, &sample_user()));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["id"], "cus_1");
        assert_eq!(value["metadata"]["hash1"], "$1$pstripe$h");
    }

    #[test]
    fn test_product_line() {
        let product = testing::product("prod_a", "Pro", Some(("price_a", 1500)));
        let line = render(|out| product_line(out, &product));
        assert_eq!(
            line,
            format!("{:<20} p={:<30} i=15.00eur,1,month n=Pro\n", "prod_a", "price_a")
        );

        let bare = testing::product("prod_b", "Free", None);
        let line = render(|out| product_line(out, &bare));
        assert_eq!(line, format!("{:<20} n=Free\n", "prod_b"));
    }

    #[test]
    fn test_tax_line() {
        let rate = testing::tax_rate("txr_1", "IVA", 21.0);
        let line = render(|out| tax_line(out, &rate));
        assert_eq!(line, "txr_1 ES IVA 21.000000 active=true\n");
    }

    #[test]
    fn test_session_record() {
        let session: CheckoutSession =
            serde_json::from_value(json!({"id": "cs_1", "url": "https://pay"})).unwrap();
        let text = render(|out| session_record(out, &session));
        assert_eq!(text, "ID: cs_1\nURL: https://pay\n");
    }
}
