use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use client::{AuthError, AuthPhase, Route, guards};
use rpassword::prompt_password;
use shared::models::{Profile, RegisterRequest};

use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Create an account and sign in with it
    Register(RegisterArgs),
    /// Sign in and store the credential
    Login(LoginArgs),
    /// Fetch the profile behind the stored credential
    Me,
    /// Show whether a session is stored and whether it still resolves
    Status,
    /// Forget the stored credential
    Logout,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long, short, help = "Account email. Prompted for when omitted.")]
    pub email: Option<String>,

    #[arg(long, help = "Given name")]
    pub first_name: Option<String>,

    #[arg(long, help = "Family name")]
    pub last_name: Option<String>,

    #[arg(long, help = "Read the password from the first line of stdin instead of prompting")]
    pub password_stdin: bool,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long, short, help = "Account email. Prompted for when omitted.")]
    pub email: Option<String>,

    #[arg(long, help = "Read the password from the first line of stdin instead of prompting")]
    pub password_stdin: bool,

    #[arg(long, help = "Location that required signing in, e.g. /assignments/3")]
    pub from: Option<String>,
}

pub async fn run(app: &App, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Register(args) => register(app, args).await,
        SessionCommand::Login(args) => login(app, args).await,
        SessionCommand::Me => me(app).await,
        SessionCommand::Status => status(app).await,
        SessionCommand::Logout => logout(app),
    }
}

async fn register(app: &App, args: RegisterArgs) -> Result<()> {
    let email = value_or_prompt(args.email, "Email: ")?;
    let first_name = value_or_prompt(args.first_name, "First name: ")?;
    let last_name = value_or_prompt(args.last_name, "Last name: ")?;
    let password = read_password(args.password_stdin)?;

    let payload = RegisterRequest {
        email,
        first_name,
        last_name,
        password,
    };
    match app
        .session
        .register(&payload)
        .await
        .context("registration failed")?
    {
        Some(profile) => {
            println!("Account created.");
            print_profile(&profile);
            println!("Credential saved to {}", app.store.path().display());
        }
        None => println!("Account created. Sign in with `trainer session login`."),
    }
    Ok(())
}

async fn login(app: &App, args: LoginArgs) -> Result<()> {
    let email = value_or_prompt(args.email, "Email: ")?;
    let password = read_password(args.password_stdin)?;

    let profile = app
        .session
        .login(&email, &password)
        .await
        .context("login failed")?;

    print_profile(&profile);
    println!("Credential saved to {}", app.store.path().display());
    println!(
        "Continue at {}",
        guards::post_login_destination(args.from.as_deref())
    );
    Ok(())
}

async fn me(app: &App) -> Result<()> {
    match app.session.refresh().await {
        Ok(Some(profile)) => {
            print_profile(&profile);
            Ok(())
        }
        Ok(None) => bail!("not signed in. run `trainer session login` first"),
        Err(AuthError::SessionRejected { .. }) => {
            bail!("session expired. run `trainer session login` to sign in again")
        }
        Err(err) => Err(err).context("could not load profile; the stored credential was kept"),
    }
}

async fn status(app: &App) -> Result<()> {
    let phase = app.session.bootstrap().await;
    let session = app.session.snapshot();

    println!("Status: {phase}");
    match phase {
        AuthPhase::Authenticated => {
            if let Some(profile) = &session.user {
                print_profile(profile);
            }
            if session.is_admin() {
                let views: Vec<String> = Route::admin_routes().map(|route| route.path()).collect();
                println!("Admin views: {}", views.join(", "));
            }
        }
        AuthPhase::Unverified => println!(
            "A credential is stored at {} but could not be verified; \
             run `trainer session me` to retry.",
            app.store.path().display()
        ),
        AuthPhase::Anonymous | AuthPhase::Restoring => println!("Not signed in."),
    }
    Ok(())
}

fn logout(app: &App) -> Result<()> {
    app.session.logout()?;
    println!("Signed out. Removed credential at {}", app.store.path().display());
    Ok(())
}

fn print_profile(profile: &Profile) {
    println!("Signed in as {} <{}>", profile.display_name(), profile.email);
    println!("User id: {}", profile.id);
    println!("Role: {}", if profile.is_admin { "admin" } else { "student" });
    if let Some(created_at) = profile.created_at {
        println!("Member since: {}", created_at.format("%Y-%m-%d"));
    }
}

fn value_or_prompt(value: Option<String>, message: &str) -> Result<String> {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => prompt(message),
    }
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

fn read_password(from_stdin: bool) -> Result<String> {
    let password = if from_stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read password from stdin")?;
        line.trim_end_matches(['\r', '\n']).to_string()
    } else {
        prompt_password("Password: ")?
    };
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }
    Ok(password)
}
