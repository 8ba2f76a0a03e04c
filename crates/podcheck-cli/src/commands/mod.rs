//! Subcommand implementations and the status view they share.

pub mod login;
pub mod logout;
pub mod status;
pub mod verify;

use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3001";

#[derive(Deserialize)]
pub struct StatusResponse {
    pub issuer: String,
    pub state: String,
    pub subject: Option<String>,
    pub login_status: String,
    pub logout_status: String,
    pub date_of_birth: PipelineView,
    pub credit_score: PipelineView,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct PipelineView {
    pub resource: String,
    pub status: String,
}

#[derive(Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl StatusResponse {
    pub fn print(&self) {
        println!("Session:");
        println!("  State:      {}", self.state);
        println!("  Issuer:     {}", self.issuer);
        println!(
            "  WebID:      {}",
            self.subject.as_deref().unwrap_or("(not logged in)")
        );
        println!("  Login:      {}", self.login_status);
        if !self.logout_status.is_empty() {
            println!("  Logout:     {}", self.logout_status);
        }
        println!("  Updated:    {}", self.updated_at);
        println!();
        print_pipeline("Date of birth", &self.date_of_birth);
        println!();
        print_pipeline("Credit score", &self.credit_score);
    }
}

fn print_pipeline(title: &str, view: &PipelineView) {
    println!("{}:", title);
    println!("  Resource:   {}", view.resource);
    for line in view.status.lines() {
        println!("  {}", line);
    }
}

/// Print where the server could not be reached.
pub fn unreachable(endpoint: &str, err: &reqwest::Error) {
    println!("Could not reach server at {}", endpoint);
    println!("  Error: {}", err);
    println!();
    println!("Is the server running? Start it with: podcheck-server");
}
