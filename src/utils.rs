//! Fixture identifier generation and timing helpers

use rand::distributions::{Alphanumeric, Uniform};
use rand::Rng;
use std::time::Duration;

use crate::constants::{GENERATED_ITEM_LENGTH, WEBHOOK_IDENTIFIER_LENGTH};

/// Random alphanumeric string of `len` characters
fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Random lowercase suffix used to keep fixture names unique
pub fn short_suffix(len: usize) -> String {
    random_string(len).to_lowercase()
}

/// `<random>@<domain>`, lowercased
pub fn generate_email(domain: &str) -> String {
    format!("{}@{}", random_string(GENERATED_ITEM_LENGTH), domain).to_lowercase()
}

/// `<random>.<domain>`, lowercased. Organization domains must be unique across Dock Health.
pub fn generate_domain(domain: &str) -> String {
    format!("{}.{}", random_string(GENERATED_ITEM_LENGTH), domain).to_lowercase()
}

/// `<random>-<domain>`, lowercased
pub fn generate_mrn(domain: &str) -> String {
    format!("{}-{}", random_string(GENERATED_ITEM_LENGTH), domain).to_lowercase()
}

pub fn generate_webhook_identifier() -> String {
    random_string(WEBHOOK_IDENTIFIER_LENGTH).to_lowercase()
}

/// Webhook secret drawn from `a-z` only
pub fn generate_webhook_secret() -> String {
    let letters = Uniform::new_inclusive(b'a', b'z');
    rand::thread_rng()
        .sample_iter(letters)
        .take(WEBHOOK_IDENTIFIER_LENGTH)
        .map(char::from)
        .collect()
}

/// Fixed wait, used while the API verifies or delivers webhooks asynchronously
pub async fn sleep(milliseconds: u64) {
    tokio::time::sleep(Duration::from_millis(milliseconds)).await;
}
