//! CLI tool to create an admin account or promote an existing user.
//!
//! Usage: `cargo run --bin create-admin`
//!
//! Reads the same config.yml as the server, so it works against the
//! deployment database without the server running.

use anyhow::{bail, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;

use cardioguard::config::Config;
use cardioguard::db::{self, repositories::SqlxUserRepository};
use cardioguard::models::{User, UserRole};
use cardioguard::services::password::hash_password;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(Path::new("config.yml"))?;
    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;

    let users = SqlxUserRepository::boxed(pool);

    println!("CardioGuard admin account setup");
    println!("Database: {}", config.database.url);
    println!();

    let username = prompt("Username: ")?;
    if username.is_empty() {
        bail!("Username cannot be empty");
    }

    if let Some(mut existing) = users.get_by_username(&username).await? {
        if existing.role == UserRole::Admin {
            println!("User '{}' is already an admin.", username);
            return Ok(());
        }
        let answer = prompt(&format!("User '{}' exists. Promote to admin? (y/n): ", username))?;
        if answer.eq_ignore_ascii_case("y") {
            existing.role = UserRole::Admin;
            users.update(&existing).await?;
            println!("User '{}' is now an admin.", username);
        }
        return Ok(());
    }

    let email = prompt("Email: ")?;
    if !email.contains('@') {
        bail!("Invalid email address");
    }
    if users.get_by_email(&email).await?.is_some() {
        bail!("Email '{}' is already registered", email);
    }

    let first_name = prompt("First name: ")?;
    let last_name = prompt("Last name: ")?;
    let phone = prompt("Phone (optional): ")?;

    let password = prompt("Password: ")?;
    if password.len() < 6 {
        bail!("Password must be at least 6 characters");
    }
    let confirm = prompt("Confirm password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let user = User::new(
        username.clone(),
        email,
        hash_password(&password)?,
        first_name,
        last_name,
        if phone.is_empty() { None } else { Some(phone) },
        UserRole::Admin,
    );
    let created = users.create(&user).await?;

    println!();
    println!("Admin user '{}' created (id {}).", username, created.id);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
