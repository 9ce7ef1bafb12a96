//! Password commands: `hash1`, `login` and `chpass`.

use std::io::Write;

use subkit_billing::{Billing, PaymentApi};

use crate::args::Args;
use crate::error::CommandError;

/// `hash1 p=PASSWORD`: print the stored form of a password.
pub fn hash1<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &["password"])?;
    writeln!(out, "{}", billing.hash_password(args.value("password"))?)?;
    Ok(())
}

/// `login e=EMAIL p=PASSWORD`: print the customer id if the password matches.
pub async fn login<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &["email", "password"])?;
    let user = billing
        .login(args.value("email"), args.value("password"))
        .await?;
    writeln!(out, "{}", user.id)?;
    Ok(())
}

/// `chpass e=EMAIL p=PASSWORD`: replace the stored password.
pub async fn chpass<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &["email", "password"])?;
    billing
        .change_password(args.value("email"), args.value("password"))
        .await?;
    Ok(())
}
