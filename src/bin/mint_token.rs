//! CLI tool to mint session tokens for testing and back-office use.
//!
//! Usage:
//!   cargo run --bin mint-token -- --email ops@example.com --ttl 12h
//!   cargo run --bin mint-token -- --user 0190a5e2-... --role admin

use std::env;

use uuid::Uuid;

use feridesk_lib::auth::SessionService;
use feridesk_lib::config::Config;
use feridesk_lib::db::{DbPool, users};
use feridesk_lib::models::ActorRole;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let mut user: Option<String> = None;
    let mut email: Option<String> = None;
    let mut role = "client".to_string();
    let mut ttl = "24h".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--user" | "-u" => {
                i += 1;
                if i < args.len() {
                    user = Some(args[i].clone());
                }
            }
            "--email" | "-m" => {
                i += 1;
                if i < args.len() {
                    email = Some(args[i].clone());
                }
            }
            "--role" | "-r" => {
                i += 1;
                if i < args.len() {
                    role = args[i].clone();
                }
            }
            "--ttl" | "-t" => {
                i += 1;
                if i < args.len() {
                    ttl = args[i].clone();
                }
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let ttl_secs = match parse_ttl(&ttl) {
        Some(secs) => secs,
        None => {
            eprintln!("Error: Invalid ttl '{}'. Use forms like 900s, 30m, 12h, 7d", ttl);
            std::process::exit(1);
        }
    };

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    // Resolve the subject: an explicit UUID wins, otherwise look the email
    // up in the database (which also yields the stored role).
    let (user_id, role_enum) = if let Some(raw) = user {
        let id = match Uuid::parse_str(&raw) {
            Ok(id) => id,
            Err(_) => {
                eprintln!("Error: --user must be a UUID");
                std::process::exit(1);
            }
        };
        let role_enum = match ActorRole::parse(&role.to_uppercase()) {
            Some(r) if r != ActorRole::System => r,
            _ => {
                eprintln!("Error: Invalid role '{}'. Must be: client, admin", role);
                std::process::exit(1);
            }
        };
        (id, role_enum)
    } else if let Some(address) = email {
        let pool = match DbPool::connect(&config).await {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error connecting to database: {}", e);
                std::process::exit(1);
            }
        };
        match users::find_by_email(pool.connection(), &address).await {
            Ok(Some(account)) => (account.id, account.role),
            Ok(None) => {
                eprintln!("Error: No user with email '{}'", address);
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Error looking up user: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("Error: --user or --email is required");
        print_usage();
        std::process::exit(1);
    };

    let sessions = SessionService::new(config.session_secret.clone());
    let token = match sessions.issue(user_id, role_enum, ttl_secs) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error minting token: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("  Session Token Minted");
    println!("════════════════════════════════════════════════════════════════");
    println!();
    println!("  User:  {}", user_id);
    println!("  Role:  {}", role_enum);
    println!("  TTL:   {} seconds", ttl_secs);
    println!();
    println!("  Token: {}", token);
    println!();
    println!("  Use it as: Authorization: Bearer <token>");
    println!("════════════════════════════════════════════════════════════════");
    println!();
}

/// Parse a ttl like `900s`, `30m`, `12h` or `7d` into seconds. A bare
/// number counts as seconds.
fn parse_ttl(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (value, unit) = match raw.chars().last() {
        Some(c) if c.is_ascii_digit() => (raw, 's'),
        Some(c) => (&raw[..raw.len() - 1], c),
        None => return None,
    };
    let value: u64 = value.parse().ok()?;
    match unit {
        's' => Some(value),
        'm' => Some(value * 60),
        'h' => Some(value * 3600),
        'd' => Some(value * 86_400),
        _ => None,
    }
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: mint-token (--user <uuid> [--role <role>] | --email <address>) [--ttl <duration>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --user, -u   Subject user id (UUID)");
    eprintln!("  --email, -m  Look the user up by email; uses the stored role");
    eprintln!("  --role, -r   Role with --user: client, admin (default: client)");
    eprintln!("  --ttl, -t    Token lifetime: 900s, 30m, 12h, 7d (default: 24h)");
    eprintln!("  --help, -h   Show this help");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  mint-token --email ops@example.com --ttl 12h");
    eprintln!("  mint-token --user 0190a5e2-7f13-7cd6-a294-7e9f3e4c2ab1 --role admin");
    eprintln!();
}
