use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use clap::Args;
use client::App;
use rpassword::prompt_password;
use shared::models::{LoginRequest, RegisterRequest, User};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account name; prompted for when omitted
    #[arg(long, short)]
    pub username: Option<String>,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Account name; prompted for when omitted
    #[arg(long, short)]
    pub username: Option<String>,
}

pub async fn login(app: &App, args: LoginArgs) -> Result<()> {
    let username = match args.username {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = prompt_password("Password: ")?;
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    let user = app
        .store()
        .login(&LoginRequest { username, password })
        .await
        .context("login failed")?;

    print_user(&user);
    Ok(())
}

pub async fn register(app: &App, args: RegisterArgs) -> Result<()> {
    let username = match args.username {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = prompt_password("Password: ")?;
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }
    let confirmation = prompt_password("Confirm password: ")?;
    if confirmation != password {
        bail!("passwords do not match");
    }

    app.store()
        .register(&RegisterRequest {
            username: username.clone(),
            password,
        })
        .await
        .context("registration failed")?;

    println!("Account '{username}' created. Run `docpress login` to sign in.");
    Ok(())
}

pub fn logout(app: &App) {
    let had_session = app.store().snapshot().token().is_some();
    app.store().logout();
    if had_session {
        println!("Logged out.");
    } else {
        println!("No active session.");
    }
}

pub async fn whoami(app: &App) -> Result<()> {
    let started = app.start();
    if let Some(hydration) = started.hydration {
        hydration.await.context("session check was interrupted")?;
    }
    started.listener.abort();

    let session = app.store().snapshot();
    match session.user() {
        Some(user) if session.is_authenticated() => {
            print_user(user);
            Ok(())
        }
        _ => bail!("not logged in; run `docpress login` first"),
    }
}

fn print_user(user: &User) {
    println!("Logged in as {}", user.username);
    println!("role: {}", user.role);
    println!("active: {}", user.is_active);
    println!("member since: {}", user.created_at.format("%Y-%m-%d"));
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        bail!("input must not be empty");
    }
    Ok(trimmed)
}
