use anyhow::{Context, Result};
use clap::Args;
use client::{App, Navigation};

#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// Application path, e.g. `/projects/42`
    pub path: String,
}

/// Resolves `path` against the persisted session and prints each redirect.
pub async fn navigate(app: &App, args: &NavigateArgs) -> Result<()> {
    let started = app.start();
    if let Some(hydration) = started.hydration {
        hydration.await.context("session check was interrupted")?;
    }
    started.listener.abort();

    let session = app.store().snapshot();
    let navigation = app
        .navigator()
        .navigate(&args.path, &session)
        .with_context(|| format!("cannot navigate to {}", args.path))?;

    let who = session.user().map_or_else(
        || "anonymous".to_string(),
        |user| format!("{} ({})", user.username, user.role),
    );
    println!("session: {who}");
    print_navigation(&navigation);
    Ok(())
}

fn print_navigation(navigation: &Navigation) {
    for hop in &navigation.redirects {
        println!("redirect: {} -> {} ({})", hop.from, hop.to, hop.reason);
    }
    let destination = &navigation.destination;
    println!("final: {} [{}]", destination.full_path, destination.name);
    for (name, value) in &destination.params {
        println!("  {name} = {value}");
    }
}
