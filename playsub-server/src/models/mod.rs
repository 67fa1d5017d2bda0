//! Domain records for users, plans, and user-plan links
//!
//! Rows map one-to-one onto the `users`, `subscriptions`, and
//! `user_subscriptions` tables. `New*` types carry the caller-supplied
//! columns for inserts; ids and default timestamps come from storage.

pub mod validation;
pub mod status;
pub mod user;
pub mod plan;
pub mod link;

pub use validation::ValidationError;
pub use status::SubscriptionStatus;
pub use user::{NewUser, User};
pub use plan::{NewPlan, Plan};
pub use link::{NewUserSubscription, UserSubscription};
