//! Interactive terminal prompts.
//!
//! The login flow never reads credentials itself; it goes through the
//! [`Prompter`] trait so tests can script the answers.

use crate::error::{Error, Result};
use dialoguer::{Input, Password};

/// Source of interactively entered credentials and MFA codes.
pub trait Prompter {
    /// Ask for the account username (echoed).
    fn username(&self) -> Result<String>;

    /// Ask for the account password (never echoed).
    fn password(&self, username: &str) -> Result<String>;

    /// Ask for an MFA code (echoed); `label` names the factor, e.g.
    /// "authenticator code" or "SMS code".
    fn mfa_code(&self, label: &str) -> Result<String>;
}

/// [`Prompter`] backed by the controlling terminal.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn username(&self) -> Result<String> {
        Input::<String>::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(|e| Error::Prompt(format!("failed to read username: {e}")))
    }

    fn password(&self, username: &str) -> Result<String> {
        Password::new()
            .with_prompt(format!("Password for {username}"))
            .interact()
            .map_err(|e| Error::Prompt(format!("failed to read password: {e}")))
    }

    fn mfa_code(&self, label: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(format!("Enter {label}"))
            .interact_text()
            .map_err(|e| Error::Prompt(format!("failed to read {label}: {e}")))
    }
}
