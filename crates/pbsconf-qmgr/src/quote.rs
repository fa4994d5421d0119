//! Quote selection for values embedded in `qmgr -c '...'` directives.
//!
//! The whole directive is wrapped in single quotes by the shell command, so a
//! value is wrapped in one quote character that qmgr itself strips:
//!
//! ```text
//! qmgr -c 'set queue workq comment="long running jobs"'
//! qmgr -c 'set queue workq comment='say "hi"''
//! ```
//!
//! Interior quote characters are never escaped. A value holding both `"` and
//! `'` therefore cannot be embedded safely; [`check_embeddable`] reports it so
//! callers can reject such input when hardening is enabled.

use crate::error::{QmgrError, QmgrResult};

/// Wrap a value in the quote character qmgr should see.
///
/// Double quotes are the default. Single quotes are used as soon as the value
/// contains a double quote, even if it also contains single quotes.
pub fn escape_for_command(value: &str) -> String {
    let quote = if value.contains('"') { '\'' } else { '"' };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    out.push_str(value);
    out.push(quote);
    out
}

/// Whether a value contains both quote characters.
pub fn has_quote_collision(value: &str) -> bool {
    value.contains('"') && value.contains('\'')
}

/// Reject values that [`escape_for_command`] cannot wrap safely.
pub fn check_embeddable(attribute: &str, value: &str) -> QmgrResult<()> {
    if has_quote_collision(value) {
        return Err(QmgrError::QuoteCollision {
            attribute: attribute.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
