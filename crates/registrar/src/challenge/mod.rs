//! Verification challenge issuing and checking.
//!
//! Two independent one-time-code mechanisms with disjoint key spaces:
//! emailed numeric codes (keyed by email) guard identity-linked actions,
//! picture challenges (keyed by username) guard the anti-automation
//! gate. They must not be conflated.

mod captcha;
mod email;

pub use captcha::PictureChallenger;
pub use email::{CodeIssueError, EmailCodeIssuer};
