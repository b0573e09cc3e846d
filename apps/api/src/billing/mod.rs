// Subscription tiers, the capability table, and the payment-provider glue
// that moves users between tiers.

pub mod handlers;
pub mod tier;
pub mod webhook;
