use std::{env, env::VarError};

/// The worker has no real CLI. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // GL_DATABASE_URL is left out because it may carry credentials.
    const DISPLAY_ENVS: [&str; 7] = [
        "RUST_LOG",
        "GL_DB_MAX_CONNECTIONS",
        "GL_RUN_MIGRATIONS",
        "GL_SLA_MINUTES",
        "GL_SLA_SWEEP_INTERVAL_SECS",
        "GL_EVENT_BUFFER_SIZE",
        "GL_NOTIFICATIONS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
