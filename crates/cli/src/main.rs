//! subkit - Stripe customers and subscriptions from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Register a user and send the validation mail
//! subkit user-add e=ana@example.com p='s3cret pass' l=es
//! subkit user-mail-v e=ana@example.com
//!
//! # Check a password
//! subkit login e=ana@example.com p='s3cret pass'
//!
//! # Open a checkout session for two seats of a product
//! subkit subscribe us=https://example.com/ok uc=https://example.com/ko \
//!     e=ana@example.com @prod_123=2,txr_456
//! ```
//!
//! Every subcommand takes `key=value` tokens and bare positional tokens.
//! Short keys are aliases: `e` email, `p`/`pass` password, `l`/`lang`
//! language, `us` url_success, `uc` url_cancel, `c` customer, `t` tax_rate,
//! `r` reference, `v` verified.
//!
//! # Environment Variables
//!
//! See [`subkit_billing::config`] for the Stripe and mail settings.
//!
//! - `RUST_LOG` - Log filter (default: `subkit=warn,subkit_billing=warn`)
//! - `SUBKIT_LOG_JSON` - Any value switches logs to JSON lines
//!
//! Logs go to stderr; stdout only carries command results.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, Write};

use clap::{Parser, Subcommand};
use subkit_billing::{Billing, BillingConfig, StripeClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod commands;
mod error;
mod render;

use error::CommandError;

#[derive(Parser)]
#[command(name = "subkit")]
#[command(author, version, about = "Stripe customers and subscriptions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Free-form `key=value` and positional tokens.
#[derive(clap::Args)]
struct Tokens {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored hash of a password (p=PASSWORD)
    Hash1(Tokens),
    /// Check a password and print the customer id (e=EMAIL p=PASSWORD)
    Login(Tokens),
    /// Change a password (e=EMAIL p=PASSWORD)
    Chpass(Tokens),
    /// List Stripe dashboard shortcuts, or open one ([TARGET])
    Www(Tokens),
    /// List tax rates
    TaxList,
    /// List products with their default prices
    ProdList,
    /// Print the default price of each product (PRODUCT...)
    ProdPrice(Tokens),
    /// List users
    UserList,
    /// Print a user as JSON (e=EMAIL)
    UserGetJson(Tokens),
    /// Print the products a user is subscribed to (e=EMAIL [PRODUCT...])
    UserGetSubs(Tokens),
    /// Print a user record (e=EMAIL)
    UserInfo(Tokens),
    /// Register a user (e=EMAIL p=PASSWORD [l=LANG] [v=yes] [@KEY=VALUE...])
    UserAdd(Tokens),
    /// Delete users (EMAIL...)
    UserDel(Tokens),
    /// Edit a user (e=EMAIL [name= phone= description= city= country= addr1=
    /// addr2= zipcode= state= cif= l= v= @KEY=VALUE...])
    UserEdit(Tokens),
    /// Send a validation mail (e=EMAIL)
    UserMailV(Tokens),
    /// Confirm an email address (e=EMAIL ecode=CODE)
    UserValidate(Tokens),
    /// Open a checkout session (us=URL uc=URL c=CUSTOMER|e=EMAIL [r=REF]
    /// [t=TAX] [browse=y] @PRODUCT=QTY[,TAX]...)
    Subscribe(Tokens),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        report(&mut io::stderr().lock(), &e);
        std::process::exit(1);
    }
}

/// Print a failed command's error, whatever the log filter lets through.
fn report(err_out: &mut impl Write, e: &CommandError) {
    // Nothing left to tell if stderr itself is gone.
    let _ = writeln!(err_out, "subkit: {e}");
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "subkit=warn,subkit_billing=warn".into());

    let json = std::env::var_os("SUBKIT_LOG_JSON").is_some();
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let config = BillingConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");
    let billing: Billing<StripeClient> = Billing::connect(config)?;

    let mut out = io::stdout().lock();
    dispatch(&billing, cli.command, &mut out).await?;
    out.flush()?;
    Ok(())
}

async fn dispatch(
    billing: &Billing<StripeClient>,
    command: Commands,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    use commands::{account, catalog, checkout, users, www};

    match command {
        Commands::Hash1(t) => account::hash1(billing, &t.tokens, out),
        Commands::Login(t) => account::login(billing, &t.tokens, out).await,
        Commands::Chpass(t) => account::chpass(billing, &t.tokens).await,
        Commands::Www(t) => www::www(billing, t.tokens.first().map(String::as_str), out),
        Commands::TaxList => catalog::tax_list(billing, out).await,
        Commands::ProdList => catalog::prod_list(billing, out).await,
        Commands::ProdPrice(t) => catalog::prod_price(billing, &t.tokens, out).await,
        Commands::UserList => users::user_list(billing, out).await,
        Commands::UserGetJson(t) => users::user_get_json(billing, &t.tokens, out).await,
        Commands::UserGetSubs(t) => users::user_get_subs(billing, &t.tokens, out).await,
        Commands::UserInfo(t) => users::user_info(billing, &t.tokens, out).await,
        Commands::UserAdd(t) => users::user_add(billing, &t.tokens, out).await,
        Commands::UserDel(t) => users::user_del(billing, &t.tokens).await,
        Commands::UserEdit(t) => users::user_edit(billing, &t.tokens, out).await,
        Commands::UserMailV(t) => users::user_mail_v(billing, &t.tokens).await,
        Commands::UserValidate(t) => users::user_validate(billing, &t.tokens, out).await,
        Commands::Subscribe(t) => checkout::subscribe(billing, &t.tokens, out).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_kebab_case_subcommands_keep_tokens() {
        let cli = Cli::try_parse_from(["subkit", "user-get-subs", "e=a@example.com", "prod_a"]);
        let Ok(Cli { command: Commands::UserGetSubs(t) }) = cli else {
            panic!("user-get-subs did not parse");
        };
        assert_eq!(t.tokens, ["e=a@example.com", "prod_a"]);

        let cli = Cli::try_parse_from(["subkit", "user-mail-v", "e=a@example.com"]);
        assert!(matches!(cli, Ok(Cli { command: Commands::UserMailV(_) })));

        let cli = Cli::try_parse_from(["subkit", "hash1", "p=-x"]);
        assert!(matches!(cli, Ok(Cli { command: Commands::Hash1(_) })));
    }

    #[test]
    fn test_report_writes_error_line() {
        let mut err_out = Vec::new();
        let e = CommandError::InvalidTarget("nope".to_owned());
        report(&mut err_out, &e);
        assert_eq!(String::from_utf8_lossy(&err_out), "subkit: Invalid argument: nope\n");
    }
}
