//! Account commands: login, logout, signup, profile.
//!
//! Passwords can be passed with `--password`; when omitted they are read
//! from the first line of stdin.

use chrono::NaiveDate;
use clap::Args;
use shopaholic_core::Email;
use shopaholic_storefront::api::SignupForm;

use super::{CommandError, Context, secret_or_stdin};
use crate::output;

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(short, long)]
    email: Email,

    /// Password (read from stdin when omitted)
    #[arg(short, long)]
    password: Option<String>,
}

#[derive(Args)]
pub struct SignupArgs {
    /// Full name
    #[arg(short, long)]
    name: String,

    /// Account email
    #[arg(short, long)]
    email: Email,

    /// Phone number
    #[arg(long)]
    phone: String,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    dob: NaiveDate,

    /// Password (read from stdin when omitted)
    #[arg(short, long)]
    password: Option<String>,
}

/// Log in and switch to the account's cart.
///
/// # Errors
///
/// Returns an error if the credentials are rejected or the identity cannot
/// be saved.
pub async fn login(ctx: &mut Context, args: LoginArgs) -> Result<(), CommandError> {
    let password = secret_or_stdin(args.password, "password")?;
    ctx.session.login(&ctx.api, &args.email, &password).await?;

    if let Some(user) = ctx.session.user() {
        output::message(&format!("Welcome back, {}!", user.name));
    }
    output::message(&format!("{} item(s) in your cart", ctx.session.cart().item_count()));
    Ok(())
}

/// Log out. Carts stay saved for the next login.
///
/// # Errors
///
/// Returns an error if the identity cannot be removed.
pub fn logout(ctx: &mut Context) -> Result<(), CommandError> {
    if ctx.session.user().is_none() {
        output::message("Not logged in.");
        return Ok(());
    }
    ctx.session.logout()?;
    output::message("Logged out.");
    Ok(())
}

/// Create an account.
///
/// # Errors
///
/// Returns an error if the backend rejects the signup (for example, a
/// duplicate email) or cannot be reached.
pub async fn signup(ctx: &Context, args: SignupArgs) -> Result<(), CommandError> {
    if args.name.trim().is_empty() {
        return Err(CommandError::Invalid("name must not be empty".to_string()));
    }
    let form = SignupForm {
        name: args.name,
        date_of_birth: args.dob,
        phone: args.phone,
        email: args.email,
        password: secret_or_stdin(args.password, "password")?,
    };
    ctx.api.signup(&form).await?;
    output::message(&format!(
        "Account created for {}. Log in with `shop login -e {}`.",
        form.name.trim(),
        form.email
    ));
    Ok(())
}

/// Show the logged-in profile.
pub fn profile(ctx: &Context) {
    match ctx.session.profile() {
        Some(user) => output::user(user),
        None => output::message("Not logged in."),
    }
}
