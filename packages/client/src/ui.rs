//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(name: &str) {
    print!("{}> ", name);
    std::io::stdout().flush().ok();
}

/// Print a block of output and redisplay the prompt
pub fn show(output: &str, name: &str) {
    print!("{}", output);
    redisplay_prompt(name);
}
