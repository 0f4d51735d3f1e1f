use anyhow::Result;
use colored::Colorize;
use medportal_client::{Credentials, RegisterRequest, SessionStore, UserIdentity};

use crate::cli::{LoginArgs, OutputFormat, RegisterArgs};
use crate::output::{print_success, print_value};

fn describe(user: &UserIdentity) -> String {
    let name = user.name().unwrap_or("unknown user");
    match user.role() {
        Some(role) => format!("{} ({})", name.cyan(), role),
        None => name.cyan().to_string(),
    }
}

pub async fn login(store: &SessionStore, args: &LoginArgs) -> Result<()> {
    store
        .login(&Credentials::new(&args.email, &args.password))
        .await?;
    if let Some(user) = store.current_user() {
        print_success(&format!("Logged in as {}", describe(&user)));
    }
    Ok(())
}

pub async fn register(store: &SessionStore, args: &RegisterArgs) -> Result<()> {
    let request = RegisterRequest {
        name: args.name.clone(),
        email: args.email.clone(),
        password: args.password.clone(),
        password_confirmation: args.password.clone(),
        role: args.role.clone(),
    };
    let body = store.register(&request).await?;

    match store.current_user() {
        Some(user) => print_success(&format!("Registered and logged in as {}", describe(&user))),
        None => {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Registration received");
            print_success(message);
        }
    }
    Ok(())
}

pub async fn logout(store: &SessionStore) -> Result<()> {
    store.logout().await?;
    Ok(())
}

pub async fn whoami(store: &SessionStore, profile: &str, format: OutputFormat) -> Result<()> {
    let session = store.check_session().await;
    match session.user() {
        Some(user) => {
            println!("{}: {}", "Profile".cyan(), profile);
            println!(
                "{}: {}",
                "Server".cyan(),
                store.gateway().config().base_url.as_str().cyan()
            );
            println!("{}: {}", "Auth".cyan(), store.gateway().auth_mode());
            print_value(user.as_value(), format);
        }
        None => anyhow::bail!("Not logged in (profile: \"{profile}\")"),
    }
    Ok(())
}
