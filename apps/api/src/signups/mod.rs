// Public pre-launch sign-ups: the waitlist and beta invites. No session.

pub mod handlers;
